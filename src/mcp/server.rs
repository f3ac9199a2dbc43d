//! MCP server handler exposing the todo store as resources, tools and a
//! summary prompt.

use std::sync::Arc;

use rmcp::model::{
    AnnotateAble, CallToolRequestParam, CallToolResult, Content, GetPromptRequestParam,
    GetPromptResult, Implementation, JsonObject, ListPromptsResult, ListResourcesResult,
    ListToolsResult, Meta, PaginatedRequestParam, Prompt, PromptMessage, PromptMessageContent,
    PromptMessageRole, RawResource, ReadResourceRequestParam, ReadResourceResult, Resource,
    ResourceContents, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use serde_json::{json, Value};

use crate::application::todo_service::{
    TodoService, SUMMARY_PROMPT_DESCRIPTION, SUMMARY_PROMPT_NAME,
};
use crate::application::views::{self, MessageContent};
use crate::domain::error::TodoError;
use crate::mcp::tools;

const INSTRUCTIONS: &str = "Todos are resources at todo:///{id}. Use the tools to create, \
    complete, list and delete them, and the summarize_todos prompt to summarize them.";

pub struct TodoServer<S> {
    service: Arc<S>,
}

impl<S: TodoService> TodoServer<S> {
    pub fn new(service: Arc<S>) -> Self { Self { service } }

    pub async fn resources(&self) -> Vec<Resource> {
        self.service.list_resources().await.into_iter().map(resource).collect()
    }

    pub async fn read(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        let contents = self.service.read_resource(uri).await.map_err(protocol_error)?;
        Ok(ReadResourceResult { contents: vec![resource_contents(contents)] })
    }

    /// Tool failures are results flagged `isError`, not protocol errors.
    pub async fn call(&self, name: &str, args: JsonObject) -> CallToolResult {
        match self.run_tool(name, &args).await {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(e) => {
                tracing::debug!(tool = name, error = %e, "tool call failed");
                CallToolResult::error(vec![Content::text(e.to_string())])
            }
        }
    }

    async fn run_tool(&self, name: &str, args: &JsonObject) -> Result<String, TodoError> {
        match name {
            tools::CREATE_TODO => self.service.create(tools::new_todo(args)).await,
            tools::MARK_TODO_DONE => {
                let id = tools::id_arg(args)?;
                let done = tools::done_arg(args)?;
                self.service.mark_done(id, done).await
            }
            tools::GET_ALL_TODOS => Ok(self.service.get_all().await),
            tools::DELETE_TODO => self.service.delete(tools::id_arg(args)?).await,
            other => Err(TodoError::UnknownOperation(format!("tool {other}"))),
        }
    }

    pub async fn prompt(&self, name: &str) -> Result<GetPromptResult, McpError> {
        if name != SUMMARY_PROMPT_NAME {
            let err = TodoError::UnknownOperation(format!("prompt {name}"));
            return Err(protocol_error(err));
        }
        let prompt = self.service.summary_prompt().await;
        let messages = prompt.messages.into_iter().map(prompt_message).collect();
        Ok(GetPromptResult { description: Some(prompt.description), messages })
    }
}

fn done_meta(done: bool) -> Meta {
    let mut meta = Meta::new();
    meta.insert("done".to_string(), Value::Bool(done));
    meta
}

fn resource(descriptor: views::ResourceDescriptor) -> Resource {
    let mut raw = RawResource::new(descriptor.uri, descriptor.name);
    raw.description = Some(descriptor.description);
    raw.mime_type = Some(descriptor.mime_type);
    raw.meta = Some(done_meta(descriptor.done));
    raw.no_annotation()
}

fn resource_contents(contents: views::ResourceContents) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: contents.uri,
        mime_type: Some(contents.mime_type),
        text: contents.text,
        meta: Some(done_meta(contents.done)),
    }
}

fn prompt_message(message: views::PromptMessage) -> PromptMessage {
    match message.content {
        MessageContent::Text { text } => PromptMessage::new_text(PromptMessageRole::User, text),
        MessageContent::Resource { resource } => {
            let mut msg = PromptMessage::new_resource(
                PromptMessageRole::User,
                resource.uri.clone(),
                Some(resource.mime_type.clone()),
                Some(resource.text.clone()),
                None,
                None,
                None,
            );
            // Swap in contents that also carry the done flag.
            if let PromptMessageContent::Resource { resource: embedded } = &mut msg.content {
                embedded.raw.resource = resource_contents(resource);
            }
            msg
        }
    }
}

fn protocol_error(err: TodoError) -> McpError {
    match err {
        TodoError::NotFound(ref id) => {
            McpError::resource_not_found(err.to_string(), Some(json!({ "id": id })))
        }
        TodoError::InvalidArgument(_) | TodoError::UnknownOperation(_) => {
            McpError::invalid_params(err.to_string(), None)
        }
        TodoError::Storage(_) => {
            tracing::error!(error = %err, "storage failure");
            McpError::internal_error(err.to_string(), None)
        }
    }
}

impl<S: TodoService> ServerHandler for TodoServer<S> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(self.resources().await))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        self.read(&request.uri).await
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(tools::catalog()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let args = request.arguments.unwrap_or_default();
        Ok(self.call(&request.name, args).await)
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        let prompt = Prompt::new(SUMMARY_PROMPT_NAME, Some(SUMMARY_PROMPT_DESCRIPTION), None);
        Ok(ListPromptsResult::with_all_items(vec![prompt]))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        self.prompt(&request.name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::todo_service::TodoServiceImpl;
    use crate::infrastructure::json_file_repo::JsonFileTodoRepository;
    use rmcp::model::ErrorCode;

    type FileServer = TodoServer<TodoServiceImpl<JsonFileTodoRepository>>;

    async fn server(dir: &tempfile::TempDir) -> FileServer {
        let repo = JsonFileTodoRepository::new(dir.path().join("todos.json"));
        TodoServer::new(Arc::new(TodoServiceImpl::initialize(repo).await.unwrap()))
    }

    fn args(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    fn text_of(result: &CallToolResult) -> String {
        let value = serde_json::to_value(result).unwrap();
        value["content"][0]["text"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn resources_carry_the_done_flag() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(&dir).await;
        server.call(tools::CREATE_TODO, args(json!({ "title": "A", "content": "B" }))).await;
        server.call(tools::MARK_TODO_DONE, args(json!({ "id": "1", "done": true }))).await;

        let listed = serde_json::to_value(server.resources().await).unwrap();
        assert_eq!(listed[0]["uri"], "todo:///1");
        assert_eq!(listed[0]["name"], "A");
        assert_eq!(listed[0]["mimeType"], "text/plain");
        assert_eq!(listed[0]["_meta"]["done"], true);

        let read = serde_json::to_value(server.read("todo:///1").await.unwrap()).unwrap();
        assert_eq!(read["contents"][0]["text"], "B");
        assert_eq!(read["contents"][0]["_meta"]["done"], true);
    }

    #[tokio::test]
    async fn tool_failures_are_flagged_results() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(&dir).await;

        let result = server.call(tools::CREATE_TODO, JsonObject::new()).await;
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "Title and content are required");

        let result = server.call("archive_todo", JsonObject::new()).await;
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "Unknown operation: tool archive_todo");

        let result = server.call(tools::GET_ALL_TODOS, JsonObject::new()).await;
        assert_ne!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "No todos available");
    }

    #[tokio::test]
    async fn read_and_prompt_errors_map_to_protocol_codes() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(&dir).await;

        let err = server.read("todo:///5").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RESOURCE_NOT_FOUND);
        assert_eq!(err.message, "Todo not found: 5");

        let err = server.read("not a uri").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);

        let err = server.prompt("nope").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn summary_prompt_embeds_each_todo() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(&dir).await;
        server.call(tools::CREATE_TODO, args(json!({ "title": "Plan", "content": "trip" }))).await;

        let prompt = server.prompt(SUMMARY_PROMPT_NAME).await.unwrap();
        let value = serde_json::to_value(&prompt).unwrap();
        let messages = value["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(
            messages[0],
            json!({
                "role": "user",
                "content": { "type": "text", "text": "Please summarize the following todos:" }
            })
        );
        let embedded = &messages[1]["content"]["resource"];
        assert_eq!(messages[1]["content"]["type"], "resource");
        assert_eq!(embedded["uri"], "todo:///1");
        assert_eq!(embedded["text"], "trip");
        assert_eq!(embedded["_meta"]["done"], false);
    }

    #[tokio::test]
    async fn info_advertises_all_three_capabilities() {
        let dir = tempfile::tempdir().unwrap();
        let info = serde_json::to_value(server(&dir).await.get_info()).unwrap();
        assert_eq!(info["serverInfo"]["name"], "todo-mcp");
        assert!(info["capabilities"]["resources"].is_object());
        assert!(info["capabilities"]["tools"].is_object());
        assert!(info["capabilities"]["prompts"].is_object());
    }
}
