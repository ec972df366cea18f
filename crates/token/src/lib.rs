//! Session token minting for the upstream API.
//!
//! The gateway embeds the caller's resolved subscription limits in a signed
//! JWT so the upstream can enforce them without a session store. The session
//! identifier is a deterministic hash of the caller and their limits, stable
//! for as long as both stay the same.

#![deny(missing_docs)]

use std::fmt::Write;

use chrono::{Duration, Utc};
use jwt_compact::{
    AlgorithmExt, Claims, CreationError, Header,
    alg::{Hs256, Hs256Key},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Domain claim embedded in every minted token.
pub const TOKEN_DOMAIN: &str = "tollgate.local";

/// Token lifetime in seconds: seven days from issuance.
pub const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Claims describing the authorized session and its limits.
///
/// Serialized into the JWT payload next to the standard `exp` claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayClaims {
    /// Rate limit string of the resolved tier, enforced downstream.
    pub rate: String,
    /// Maximum concurrent connections of the resolved tier.
    pub connections: u32,
    /// The resolved tier identifier.
    pub role: String,
    /// Deterministic pseudo-identity of the caller, see [`session_id`].
    #[serde(rename = "sessionID")]
    pub session_id: String,
    /// Fixed domain claim, [`TOKEN_DOMAIN`].
    pub domain: String,
}

/// Computes the deterministic session identifier for a caller and their
/// resolved limits.
///
/// SHA-256 over caller + rate + decimal connections, as lowercase hex. An
/// absent caller header hashes the empty string, collapsing all anonymous
/// callers of a tier into one session.
pub fn session_id(caller: &str, rate: &str, connections: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(caller.as_bytes());
    hasher.update(rate.as_bytes());
    hasher.update(connections.to_string().as_bytes());

    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);

    for byte in digest {
        write!(out, "{byte:02x}").unwrap();
    }

    out
}

/// Errors from token minting.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Serializing or signing the claim set failed.
    #[error("failed to sign token: {0}")]
    Signing(#[from] CreationError),
}

/// Capability boundary for token signing, so alternate algorithms or
/// key-rotation strategies can be substituted without touching the request
/// handler.
pub trait TokenSigner: Send + Sync {
    /// Wraps the claims with an expiry of now plus [`TOKEN_TTL_SECS`] and
    /// signs them into a compact token string.
    fn sign(&self, claims: GatewayClaims) -> Result<String, TokenError>;
}

/// HMAC-SHA256 signer keyed by the configured signing secret.
pub struct Hs256Signer {
    key: Hs256Key,
}

impl Hs256Signer {
    /// Creates a signer from the shared signing secret.
    pub fn new(secret: &SecretString) -> Self {
        Hs256Signer {
            key: Hs256Key::new(secret.expose_secret().as_bytes()),
        }
    }
}

impl TokenSigner for Hs256Signer {
    fn sign(&self, claims: GatewayClaims) -> Result<String, TokenError> {
        let mut claims = Claims::new(claims);
        claims.expiration = Some(Utc::now() + Duration::seconds(TOKEN_TTL_SECS));

        Ok(Hs256.token(&Header::empty(), &claims, &self.key)?)
    }
}

#[cfg(test)]
mod tests {
    use jwt_compact::UntrustedToken;

    use super::*;

    fn signer() -> Hs256Signer {
        Hs256Signer::new(&SecretString::from("test-signing-secret".to_string()))
    }

    fn claims(caller: &str, role: &str, rate: &str, connections: u32) -> GatewayClaims {
        GatewayClaims {
            rate: rate.to_string(),
            connections,
            role: role.to_string(),
            session_id: session_id(caller, rate, connections),
            domain: TOKEN_DOMAIN.to_string(),
        }
    }

    fn decode(token: &str, secret: &str) -> Claims<GatewayClaims> {
        let untrusted = UntrustedToken::new(token).unwrap();
        let key = Hs256Key::new(secret.as_bytes());

        Hs256.validator(&key).validate(&untrusted).unwrap().claims().clone()
    }

    #[test]
    fn session_id_is_deterministic() {
        let a = session_id("userA", "250M", 25);
        let b = session_id("userA", "250M", 25);

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn session_id_changes_with_any_input() {
        let base = session_id("userA", "250M", 25);

        assert_ne!(base, session_id("userB", "250M", 25));
        assert_ne!(base, session_id("userA", "100M", 25));
        assert_ne!(base, session_id("userA", "250M", 26));
    }

    #[test]
    fn anonymous_callers_of_a_tier_share_a_session() {
        assert_eq!(session_id("", "20M", 2), session_id("", "20M", 2));
    }

    #[test]
    fn signed_token_round_trips_with_the_same_secret() {
        let token = signer().sign(claims("userA", "ultra", "250M", 25)).unwrap();
        let decoded = decode(&token, "test-signing-secret");

        assert_eq!(decoded.custom.role, "ultra");
        assert_eq!(decoded.custom.rate, "250M");
        assert_eq!(decoded.custom.connections, 25);
        assert_eq!(decoded.custom.domain, TOKEN_DOMAIN);
        assert_eq!(decoded.custom.session_id, session_id("userA", "250M", 25));
    }

    #[test]
    fn signed_token_is_rejected_with_a_different_secret() {
        let token = signer().sign(claims("userA", "basic", "20M", 2)).unwrap();
        let untrusted = UntrustedToken::new(&token).unwrap();
        let key = Hs256Key::new(b"some-other-secret");

        assert!(Hs256.validator::<GatewayClaims>(&key).validate(&untrusted).is_err());
    }

    #[test]
    fn expiry_is_seven_days_out() {
        let token = signer().sign(claims("userA", "basic", "20M", 2)).unwrap();
        let decoded = decode(&token, "test-signing-secret");

        let exp = decoded.expiration.unwrap();
        let expected = Utc::now() + Duration::seconds(TOKEN_TTL_SECS);

        let drift = (expected - exp).num_seconds().abs();
        assert!(drift <= 5, "expiry drifted {drift}s from the expected instant");
    }
}
