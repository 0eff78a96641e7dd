//! Mirador - dashboard data service over the Odoo ERP
//!
//! Binary entry point for the HTTP server.

use anyhow::Context;
use mirador_api::{router, AppContext};
use tokio::net::TcpListener;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging FIRST so .env loading is visible
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load environment variables from .env file
    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => debug!(%err, "no .env file loaded"),
    }

    let config = mirador_infra::config::load().context("loading configuration")?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let ctx = AppContext::new(config).context("wiring application context")?;
    let app = router(ctx);

    let listener = TcpListener::bind(&addr).await.with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Mirador API listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, letting in-flight requests finish.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to listen for shutdown signal");
    }
}
