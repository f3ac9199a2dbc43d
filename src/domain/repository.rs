use async_trait::async_trait;
use super::todo::TodoCollection;

/// Backing storage for the whole collection. Every save replaces what was
/// stored before.
#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    /// `Ok(None)` when nothing usable is stored yet.
    async fn load(&self) -> anyhow::Result<Option<TodoCollection>>;
    async fn save(&self, todos: &TodoCollection) -> anyhow::Result<()>;
}
