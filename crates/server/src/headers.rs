//! Header names on the gateway's inbound and outbound surfaces.

use http::HeaderName;

/// Inbound shared secret proving the request came through the trusted front
/// door.
pub const PROXY_SECRET: HeaderName = HeaderName::from_static("x-proxy-secret");

/// Inbound subscription descriptor, prefix-matched against the tier table.
pub const SUBSCRIPTION: HeaderName = HeaderName::from_static("x-subscription");

/// Inbound caller identifier, used only as session-id hash input.
pub const USER: HeaderName = HeaderName::from_static("x-user");

/// Outbound signed session token.
pub const TOKEN: HeaderName = HeaderName::from_static("x-token");

/// Outbound API key expected by the upstream.
pub const API_KEY: HeaderName = HeaderName::from_static("x-api-key");
