mod api;
mod auth;
mod config;
mod engine;
mod error;
mod geo;
mod models;
mod observability;
mod routing;
mod schema;
mod state;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::auth::GoogleIdentityVerifier;
use crate::observability::metrics::Metrics;
use crate::routing::google::GoogleMapsProvider;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let http = reqwest::Client::new();
    let metrics = Metrics::new();

    let routes = Arc::new(GoogleMapsProvider::new(
        http.clone(),
        config.maps_api_key.clone(),
        config.maps_base_url.clone(),
        metrics.clone(),
    ));
    let verifier = Arc::new(GoogleIdentityVerifier::new(
        http,
        config.identity_api_key.clone(),
        config.identity_base_url.clone(),
    ));

    let shared_state = Arc::new(state::AppState::new(
        config.event_buffer_size,
        verifier,
        routes,
        metrics,
    ));

    let app = api::rest::router(shared_state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
