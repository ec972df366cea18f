//! Tollgate configuration structures to map the tollgate.toml configuration.

#![deny(missing_docs)]

mod auth;
mod health;
mod loader;
mod tiers;
mod token;
mod upstream;

use std::{net::SocketAddr, path::Path};

pub use auth::AuthConfig;
pub use health::HealthConfig;
use serde::Deserialize;
pub use tiers::{TierConfig, TierId, TiersConfig};
pub use token::TokenConfig;
pub use upstream::UpstreamConfig;

/// Main configuration structure for the Tollgate application.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration settings.
    pub server: ServerConfig,
    /// Upstream REST API the gateway forwards to.
    pub upstream: UpstreamConfig,
    /// Front-door authentication settings.
    pub auth: AuthConfig,
    /// Token signing settings for the upstream-facing JWT.
    pub token: TokenConfig,
    /// Subscription tier table.
    pub tiers: TiersConfig,
}

impl Config {
    /// Load configuration from a file path, expanding `{{ env.NAME }}`
    /// placeholders and validating the result.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }

    /// Validates that the configuration names an upstream and carries all
    /// required secrets.
    pub fn validate(&self) -> anyhow::Result<()> {
        loader::validate(self)
    }
}

/// HTTP server configuration settings.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// The socket address the server should listen on.
    pub listen_address: Option<SocketAddr>,
    /// Health endpoint configuration.
    pub health: HealthConfig,
}
