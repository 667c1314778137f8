//! HTTP server for movie recommendations.
//!
//! Loads the catalog and the prebuilt similarity matrix, then serves
//! `GET /`, `GET /health` and `POST /recommend`.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::http::{create_router, ApiSettings, AppState};
use server::{Config, RecommendationService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!("Starting movie recommendation server");

    let state = AppState::new(ApiSettings::from(&config));

    // Everything must load before the listener opens; any failure is fatal
    let service = RecommendationService::load(
        &config.data_path,
        &config.catalog_options(),
        &config.model_dir,
    )
    .context("Failed to initialize the recommendation service")?;
    state.install(Arc::new(service));

    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
