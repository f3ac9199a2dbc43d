use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;

use crate::domain::{repository::TodoRepository, todo::TodoCollection};

/// Stores the whole collection as one JSON object in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileTodoRepository {
    path: PathBuf,
}

impl JsonFileTodoRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }
}

#[async_trait]
impl TodoRepository for JsonFileTodoRepository {
    async fn load(&self) -> Result<Option<TodoCollection>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no todo file yet");
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", self.path.display()));
            }
        };

        match serde_json::from_slice::<TodoCollection>(&bytes) {
            Ok(todos) => Ok(Some(todos)),
            Err(e) => {
                // Keep the unreadable file around instead of overwriting it with the default.
                let aside = self.sibling(".corrupt");
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    moved_to = %aside.display(),
                    "todo file is not a valid collection"
                );
                fs::rename(&self.path, &aside)
                    .await
                    .with_context(|| format!("failed to move {} aside", self.path.display()))?;
                Ok(None)
            }
        }
    }

    async fn save(&self, todos: &TodoCollection) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let bytes = serde_json::to_vec_pretty(todos).context("failed to encode todos")?;
        let tmp = self.sibling(".tmp");
        fs::write(&tmp, &bytes)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), entries = todos.len(), "todos saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::todo::{Todo, TodoId};

    fn sample() -> TodoCollection {
        [
            ("1", Todo { title: "Buy milk".into(), content: "2 litres".into(), done: false }),
            ("2", Todo { title: "Call mum".into(), content: "Sunday".into(), done: true }),
        ]
        .into_iter()
        .map(|(id, t)| (TodoId::from(id), t))
        .collect()
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileTodoRepository::new(dir.path().join("todos.json"));
        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileTodoRepository::new(dir.path().join("nested/todos.json"));
        repo.save(&sample()).await.unwrap();
        assert_eq!(repo.load().await.unwrap(), Some(sample()));
        assert!(!dir.path().join("nested/todos.json.tmp").exists());
    }

    #[tokio::test]
    async fn file_is_a_plain_object_keyed_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todos.json");
        JsonFileTodoRepository::new(&path).save(&sample()).await.unwrap();
        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(
            raw["2"],
            serde_json::json!({ "title": "Call mum", "content": "Sunday", "done": true })
        );
    }

    #[tokio::test]
    async fn corrupt_file_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todos.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let repo = JsonFileTodoRepository::new(&path);
        assert!(repo.load().await.unwrap().is_none());
        assert!(!path.exists());
        assert_eq!(std::fs::read(dir.path().join("todos.json.corrupt")).unwrap(), b"{ not json");
    }

    #[tokio::test]
    async fn unreadable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be cannot be read as one.
        let repo = JsonFileTodoRepository::new(dir.path());
        assert!(repo.load().await.is_err());
    }
}
