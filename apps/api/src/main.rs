mod annotations;
mod asset_client;
mod config;
mod errors;
mod evidence;
mod models;
mod report;
mod routes;
mod settings;
mod state;
mod storage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::asset_client::ProofSnapClient;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ImageProof API v{}", env!("CARGO_PKG_VERSION"));

    let assets = ProofSnapClient::new(
        config.proofsnap_api_url.clone(),
        Duration::from_secs(config.proofsnap_timeout_secs),
    )?
    .with_retry_base(Duration::from_millis(config.proofsnap_retry_base_ms));
    info!("ProofSnap client initialized ({})", config.proofsnap_api_url);

    let state = AppState::open(config.clone(), Arc::new(assets)).await;
    info!(data_dir = %config.data_dir.display(), "Local stores opened");
    let annotations = state.annotations.clone();

    // The UI is served from another origin on the same machine.
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("{}:{}", config.bind_addr, config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    annotations.close().await;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
