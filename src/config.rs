use std::path::PathBuf;

use anyhow::{Context, Result};

pub const STORE_PATH_VAR: &str = "TODO_STORE_PATH";

#[derive(Debug, Clone)]
pub struct Config {
    pub store_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let store_path = match std::env::var_os(STORE_PATH_VAR) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => default_store_path()?,
        };
        Ok(Self { store_path })
    }
}

/// `~/.todo-mcp/todos.json`
pub fn default_store_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .with_context(|| format!("cannot resolve a home directory; set {STORE_PATH_VAR}"))?;
    Ok(home.join(".todo-mcp").join("todos.json"))
}
