// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use tracing_subscriber::EnvFilter;

use peak_window::application::peak_service::PeakAnalysisService;
use peak_window::application::rolling_peak::RollingPeakEngine;
use peak_window::infrastructure::config::load_app_config;
use peak_window::infrastructure::upload_source::UploadTableSource;
use peak_window::presentation::{self, app_state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config().context("Failed to load configuration")?;

    // Create table source (infrastructure layer)
    let source = Arc::new(UploadTableSource::new());

    // Create services (application layer)
    let engine = RollingPeakEngine::with_window_limit(config.analysis.max_windows);
    let peak_service = PeakAnalysisService::new(source, engine);

    // Create application state
    let state = Arc::new(AppState { peak_service });

    // Build router (presentation layer)
    let router = presentation::router(state, config.analysis.max_upload_bytes);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_addr))?;
    tracing::info!("Starting peak-window service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
