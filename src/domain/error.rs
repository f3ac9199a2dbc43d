use thiserror::Error;

/// Failures surfaced to callers of the todo store.
#[derive(Error, Debug)]
pub enum TodoError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Todo not found: {0}")]
    NotFound(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Failed to persist todos: {0:#}")]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TodoError>;
