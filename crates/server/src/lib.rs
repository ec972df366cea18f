//! Tollgate server library.
//!
//! Provides a reusable serve function to run the gateway either from the binary, or from the
//! integration tests.

#![deny(missing_docs)]

mod auth;
mod gateway;
pub mod headers;
mod health;
mod proxy;
mod tiers;

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, anyhow};
use auth::AuthLayer;
use axum::{
    Router,
    extract::{Request, State},
    response::Response,
    routing::get,
};
use config::Config;
use gateway::Gateway;
use http::HeaderValue;
use proxy::HttpUpstream;
use secrecy::ExposeSecret;
use tiers::TierTable;
use token::Hs256Signer;
use tokio::net::TcpListener;

/// Configuration for serving the gateway.
pub struct ServeConfig {
    /// The socket address (IP and port) the server will bind to
    pub listen_address: SocketAddr,
    /// The deserialized tollgate TOML configuration.
    pub config: Config,
}

/// Starts and runs the gateway with the provided configuration.
///
/// Binds the listener, wires the request pipeline (secret check, tier
/// classification, token minting, upstream relay) as a catch-all route and
/// blocks serving HTTP until a fatal error. A bind failure is fatal and
/// reported to the caller.
pub async fn serve(ServeConfig { listen_address, config }: ServeConfig) -> anyhow::Result<()> {
    config.validate()?;

    let proxy_secret = config
        .auth
        .proxy_secret
        .clone()
        .context("proxy secret disappeared after validation")?;

    let signing_secret = config
        .token
        .signing_secret
        .as_ref()
        .context("signing secret disappeared after validation")?;

    let api_key = config
        .token
        .api_key
        .as_ref()
        .context("API key disappeared after validation")?;

    let api_key =
        HeaderValue::from_str(api_key.expose_secret()).context("configured API key is not a valid header value")?;

    let base_url = config.upstream.base_url();

    let gateway = Arc::new(Gateway::new(
        TierTable::new(&config.tiers),
        Box::new(Hs256Signer::new(signing_secret)),
        Box::new(HttpUpstream::new(&base_url)?),
        api_key,
    ));

    let mut app = Router::new()
        .fallback(proxy_request)
        .with_state(gateway)
        .layer(AuthLayer::new(proxy_secret));

    // The health endpoint stays outside the auth layer. On a separate
    // listener when configured, otherwise mounted next to the catch-all
    // route, where it shadows the same upstream path.
    if config.server.health.enabled {
        if let Some(listen) = config.server.health.listen {
            tokio::spawn(health::bind_health_endpoint(listen, config.server.health.clone()));
        } else {
            let health_router = Router::new().route(&config.server.health.path, get(health::health));

            app = app.merge(health_router);
        }
    }

    let listener = TcpListener::bind(listen_address)
        .await
        .map_err(|e| anyhow!("Failed to bind to {listen_address}: {e}"))?;

    log::info!("Gateway listening at http://{listen_address}, forwarding to {base_url}");

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow!("Failed to start HTTP server: {e}"))?;

    Ok(())
}

async fn proxy_request(State(gateway): State<Arc<Gateway>>, request: Request) -> Response {
    gateway.handle(request).await
}
