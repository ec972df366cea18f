//! Token signing settings for the upstream-facing JWT.

use secrecy::SecretString;
use serde::Deserialize;

/// Credentials presented to the upstream API.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenConfig {
    /// API key attached to every forwarded request.
    pub api_key: Option<SecretString>,
    /// Symmetric secret used to HMAC-sign the session token.
    pub signing_secret: Option<SecretString>,
}
