use std::sync::Arc;

use anyhow::Context;
use rmcp::ServiceExt;
use todo_mcp::{
    application::todo_service::TodoServiceImpl,
    config::Config,
    infrastructure::json_file_repo::JsonFileTodoRepository,
    mcp::{server::TodoServer, transport},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    // stdout carries protocol frames, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::from_env()?;
    tracing::info!(path = %config.store_path.display(), "todo store");
    let repo = JsonFileTodoRepository::new(&config.store_path);
    let service = TodoServiceImpl::initialize(repo)
        .await
        .with_context(|| format!("failed to open todo store at {}", config.store_path.display()))?;

    let running = TodoServer::new(Arc::new(service))
        .serve(transport::stdio())
        .await
        .context("failed to start MCP server over stdio")?;
    running.waiting().await.context("MCP server terminated unexpectedly")?;
    tracing::info!("shutdown");
    Ok(())
}
