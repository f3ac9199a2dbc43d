use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::views::{
    PromptMessage, ResourceContents, ResourceDescriptor, SummaryPrompt,
};
use crate::domain::error::{Result, TodoError};
use crate::domain::repository::TodoRepository;
use crate::domain::todo::{NewTodo, Todo, TodoCollection, TodoId};

pub const SUMMARY_PROMPT_NAME: &str = "summarize_todos";
pub const SUMMARY_PROMPT_DESCRIPTION: &str = "Summarize all current todos";

#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn list_resources(&self) -> Vec<ResourceDescriptor>;
    async fn read_resource(&self, uri: &str) -> Result<ResourceContents>;
    async fn create(&self, input: NewTodo) -> Result<String>;
    async fn mark_done(&self, id: TodoId, done: bool) -> Result<String>;
    async fn get_all(&self) -> String;
    /// Removes a todo and renumbers the rest, so surviving ids may change.
    async fn delete(&self, id: TodoId) -> Result<String>;
    async fn summary_prompt(&self) -> SummaryPrompt;
}

/// In-memory todo collection that writes itself back through `R` after every
/// mutation. The lock is held across the write, so mutations are serialized.
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: R,
    todos: Mutex<TodoCollection>,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    /// Loads whatever the repository holds. When it holds nothing usable the
    /// store starts empty and the empty collection is written back right away.
    pub async fn initialize(repo: R) -> anyhow::Result<Self> {
        let todos = match repo.load().await? {
            Some(todos) => {
                tracing::info!(count = todos.len(), "todos loaded");
                todos
            }
            None => {
                tracing::info!("starting with an empty todo list");
                let todos = TodoCollection::new();
                repo.save(&todos).await?;
                todos
            }
        };
        Ok(Self { repo, todos: Mutex::new(todos) })
    }

    pub async fn snapshot(&self) -> TodoCollection { self.todos.lock().await.clone() }

    async fn commit(&self, current: &mut TodoCollection, next: TodoCollection) -> Result<()> {
        self.repo.save(&next).await?;
        *current = next;
        Ok(())
    }
}

fn id_from_uri(uri: &str) -> Result<TodoId> {
    let parsed = url::Url::parse(uri)
        .map_err(|e| TodoError::InvalidArgument(format!("Invalid resource URI {uri}: {e}")))?;
    let path = parsed.path();
    Ok(TodoId::from(path.strip_prefix('/').unwrap_or(path)))
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn list_resources(&self) -> Vec<ResourceDescriptor> {
        let todos = self.todos.lock().await;
        todos.iter().map(|(id, todo)| ResourceDescriptor::new(id, todo)).collect()
    }

    async fn read_resource(&self, uri: &str) -> Result<ResourceContents> {
        let id = id_from_uri(uri)?;
        let todos = self.todos.lock().await;
        let todo = todos.get(&id).ok_or_else(|| TodoError::NotFound(id.0.clone()))?;
        Ok(ResourceContents::new(&id, todo))
    }

    async fn create(&self, input: NewTodo) -> Result<String> {
        if input.title.is_empty() || input.content.is_empty() {
            return Err(TodoError::InvalidArgument("Title and content are required".into()));
        }
        let mut todos = self.todos.lock().await;
        let id = todos
            .next_id()
            .ok_or_else(|| TodoError::InvalidArgument("Todo ids are exhausted".into()))?;
        let message = format!("Created todo {id}: {}", input.title);
        let mut next = todos.clone();
        next.insert(id.clone(), Todo { title: input.title, content: input.content, done: false });
        self.commit(&mut todos, next).await?;
        tracing::info!(%id, "todo created");
        Ok(message)
    }

    async fn mark_done(&self, id: TodoId, done: bool) -> Result<String> {
        let mut todos = self.todos.lock().await;
        if !todos.contains(&id) {
            return Err(TodoError::NotFound(id.0));
        }
        let mut next = todos.clone();
        if let Some(todo) = next.get_mut(&id) { todo.done = done; }
        self.commit(&mut todos, next).await?;
        tracing::info!(%id, done, "todo updated");
        let state = if done { "done" } else { "not done" };
        Ok(format!("Marked todo {id} as {state}"))
    }

    async fn get_all(&self) -> String {
        let todos = self.todos.lock().await;
        if todos.is_empty() {
            return "No todos available".to_string();
        }
        todos
            .iter()
            .map(|(id, t)| {
                let state = if t.done { "Done" } else { "Not Done" };
                format!("{id}: {} - {state}", t.title)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn delete(&self, id: TodoId) -> Result<String> {
        let mut todos = self.todos.lock().await;
        let mut next = todos.clone();
        if next.remove(&id).is_none() {
            return Err(TodoError::NotFound(id.0));
        }
        self.commit(&mut todos, next.reindexed()).await?;
        tracing::info!(%id, remaining = todos.len(), "todo deleted");
        Ok(format!("Deleted todo {id} and reindexed remaining todos"))
    }

    async fn summary_prompt(&self) -> SummaryPrompt {
        let todos = self.todos.lock().await;
        let mut messages = Vec::with_capacity(todos.len() + 2);
        messages.push(PromptMessage::user_text("Please summarize the following todos:"));
        messages.extend(
            todos
                .iter()
                .map(|(id, todo)| PromptMessage::user_resource(ResourceContents::new(id, todo))),
        );
        messages.push(PromptMessage::user_text(
            "Provide a concise summary of all the todos above.",
        ));
        SummaryPrompt { description: SUMMARY_PROMPT_DESCRIPTION.to_string(), messages }
    }
}
