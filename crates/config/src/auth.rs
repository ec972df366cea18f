//! Front-door authentication settings.

use secrecy::SecretString;
use serde::Deserialize;

/// Shared-secret authentication for the trusted front-door partner.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// The secret the front door must present on every request. Requests
    /// without it are rejected before any other processing.
    pub proxy_secret: Option<SecretString>,
}
