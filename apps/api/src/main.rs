mod config;
mod errors;
mod images;
mod models;
mod outline;
mod projects;
mod routes;
mod state;
mod store;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::images::client::ImageApiClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::ProjectStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Xiaohongshu assistant API v{}", env!("CARGO_PKG_VERSION"));

    let store = ProjectStore::open(&config.data_dir).with_context(|| {
        format!("Failed to open project store in {}", config.data_dir.display())
    })?;
    info!("Project store ready at {}", config.data_dir.display());

    let image_client = ImageApiClient::new(config.image_api.clone())
        .context("Failed to build image API client")?;
    info!(
        "Image API client initialized (model: {}, endpoint: {}, images shape: {})",
        image_client.model(),
        config.image_api.endpoint,
        config.image_api.is_images_endpoint()
    );

    let state = AppState {
        store: Arc::new(store),
        images: Arc::new(image_client),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
