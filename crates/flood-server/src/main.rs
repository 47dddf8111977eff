use anyhow::{Context, Result};
use flood_server::{build_app, open_provider, open_store, set_ready, AppOptions};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Observability
    flood_obs::init("floodd");

    // Config
    let cfg = flood_config::AppConfig::load().context("Failed to load configuration")?;
    let http_bind = cfg.http_bind();

    let store = open_store(&cfg).await?;
    let provider = open_provider(&cfg)?;
    if cfg.api_key().is_none() {
        warn!("FLOOD_API_KEY not set; pushes and admin calls will answer 500");
    }

    // Build app and state
    let options = AppOptions::new(store, provider)
        .with_api_key(cfg.api_key())
        .with_weather_ttl(cfg.weather_ttl())
        .with_weather_timeout(cfg.weather_timeout());
    let (app, state) = build_app(options)?;

    // Start HTTP server
    let addr: SocketAddr = http_bind.parse().context("Invalid HTTP bind address")?;
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind TCP listener")?;

    // Mark ready just before serving
    set_ready(&state, true);

    info!(%addr, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Flood server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
