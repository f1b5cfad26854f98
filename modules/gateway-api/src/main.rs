use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use gateway_api::{build_router, telemetry::log_filter, AppState};
use gateway_common::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = log_filter(rust_log.as_deref(), config.facebook_enable_debug)?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    config.log_summary();

    tokio::fs::create_dir_all(&config.cache_dir)
        .await
        .with_context(|| format!("creating cache directory {}", config.cache_dir.display()))?;

    let state = Arc::new(AppState::from_config(&config));
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Personal gateway starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Personal gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
