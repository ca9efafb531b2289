use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use krishi_rag::config::Settings;
use krishi_rag::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("krishi_rag=info,tower_http=info")),
        )
        .init();

    let settings = Settings::load()?;
    tracing::info!("Vector store backend: {:?}", settings.store.backend);
    tracing::info!("LLM runtime: {}", settings.llm.base_url);

    let state = Arc::new(AppState::initialize(&settings).await?);
    let app = server::router(state, Duration::from_secs(settings.server.request_timeout_secs));

    let listener =
        tokio::net::TcpListener::bind((settings.server.host.as_str(), settings.server.port)).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Application is shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
