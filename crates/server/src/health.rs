use std::net::SocketAddr;

use anyhow::anyhow;
use axum::{Json, Router, routing::get};
use config::HealthConfig;
use http::StatusCode;

#[derive(Debug, serde::Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub(crate) enum HealthState {
    /// Indicates that the server is healthy and operational.
    Healthy,
}

/// Handles health check requests and returns the current health status of the server.
pub(crate) async fn health() -> (StatusCode, Json<HealthState>) {
    (StatusCode::OK, Json(HealthState::Healthy))
}

/// Binds the health check endpoint to its own listener, away from the
/// proxied surface.
pub(super) async fn bind_health_endpoint(addr: SocketAddr, health_config: HealthConfig) -> anyhow::Result<()> {
    let path = &health_config.path;
    let app = Router::new().route(path, get(health));

    log::info!("Health check endpoint exposed at http://{addr}{path}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow!("Failed to bind the health endpoint to {addr}: {e}"))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow!("Failed to start HTTP server in the health endpoint: {e}"))?;

    Ok(())
}
