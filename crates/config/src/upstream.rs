//! Upstream REST API settings.

use serde::Deserialize;

fn default_port() -> u16 {
    80
}

/// The single upstream host every authenticated request is relayed to.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Hostname of the upstream REST API.
    #[serde(default)]
    pub host: String,
    /// Port of the upstream REST API.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            host: String::new(),
            port: default_port(),
        }
    }
}

impl UpstreamConfig {
    /// The base URL requests are proxied to.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
