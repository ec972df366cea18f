//! Subscription tier table.

use std::fmt;

use serde::Deserialize;

/// The closed set of subscription tier identifiers.
///
/// Callers are matched against tiers in this declaration order, lowest first.
/// The identifiers are mutually non-prefixing, so at most one can match a
/// given subscription descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierId {
    /// The default tier, used when no other tier matches.
    Basic,
    /// Mid-level paid tier.
    Pro,
    /// High-level paid tier.
    Ultra,
    /// Top paid tier.
    Mega,
}

impl TierId {
    /// All tiers in fixed matching priority order.
    pub const ALL: [TierId; 4] = [TierId::Basic, TierId::Pro, TierId::Ultra, TierId::Mega];

    /// The lowercase identifier used for prefix matching and the token role.
    pub fn as_str(self) -> &'static str {
        match self {
            TierId::Basic => "basic",
            TierId::Pro => "pro",
            TierId::Ultra => "ultra",
            TierId::Mega => "mega",
        }
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rate and connection limits granted by one tier.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierConfig {
    /// Rate limit string, opaque to the gateway and enforced downstream.
    pub rate: String,
    /// Maximum concurrent connections.
    pub connections: u32,
}

impl TierConfig {
    fn new(rate: &str, connections: u32) -> Self {
        TierConfig {
            rate: rate.to_string(),
            connections,
        }
    }
}

/// Limits for each of the four subscription tiers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TiersConfig {
    /// Limits for the basic tier.
    pub basic: TierConfig,
    /// Limits for the pro tier.
    pub pro: TierConfig,
    /// Limits for the ultra tier.
    pub ultra: TierConfig,
    /// Limits for the mega tier.
    pub mega: TierConfig,
}

impl Default for TiersConfig {
    fn default() -> Self {
        TiersConfig {
            basic: TierConfig::new("20M", 2),
            pro: TierConfig::new("100M", 10),
            ultra: TierConfig::new("250M", 25),
            mega: TierConfig::new("1000M", 100),
        }
    }
}

impl TiersConfig {
    /// Tier limits keyed by identifier, in matching priority order.
    pub fn ordered(&self) -> [(TierId, &TierConfig); 4] {
        [
            (TierId::Basic, &self.basic),
            (TierId::Pro, &self.pro),
            (TierId::Ultra, &self.ultra),
            (TierId::Mega, &self.mega),
        ]
    }

    /// The limits for one tier.
    pub fn get(&self, id: TierId) -> &TierConfig {
        match id {
            TierId::Basic => &self.basic,
            TierId::Pro => &self.pro,
            TierId::Ultra => &self.ultra,
            TierId::Mega => &self.mega,
        }
    }
}
