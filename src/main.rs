use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use legal_assistant::core::config::{AppPaths, ConfigService};
use legal_assistant::core::logging;
use legal_assistant::server;
use legal_assistant::state::error::InitializationError;
use legal_assistant::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths);

    let config = ConfigService::new(paths.clone());
    let settings = config
        .load_settings()
        .map_err(|e| InitializationError::Config(e.into()))?;
    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);

    let state = AppState::initialize(paths, config, settings)?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
