// Churn Analytics - Web Server
// REST API with Axum over the in-memory churn dataset

use anyhow::{Context, Result};
use clap::Parser;
use churn_analytics::api::{create_router, AppState};
use churn_analytics::{ServerArgs, ServerConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = ServerArgs::parse();
    let config = ServerConfig::from(&args);

    info!(
        listen = %config.listen_addr,
        data = %config.data.data_path.display(),
        "Starting churn analytics server"
    );

    // The dataset is loaded once; no partial data is ever served
    let service = config
        .data
        .load_service()
        .with_context(|| format!("Failed to load dataset from {}", config.data.data_path.display()))?;
    info!(customers = service.store().len(), "Dataset loaded");

    let app = create_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;
    info!("Server listening on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
