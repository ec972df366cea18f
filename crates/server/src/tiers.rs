use config::{TierId, TiersConfig};

/// One subscription level and the limits it grants.
#[derive(Debug, Clone)]
pub(crate) struct Tier {
    pub id: TierId,
    pub rate: String,
    pub connections: u32,
}

/// The tier table, checked in fixed priority order with basic first.
///
/// An ordered list rather than a map: tier identifiers are mutually
/// non-prefixing, but a fixed order keeps classification deterministic even
/// if that ever changed.
pub(crate) struct TierTable {
    tiers: Vec<Tier>,
}

impl TierTable {
    pub fn new(config: &TiersConfig) -> Self {
        let tiers = config
            .ordered()
            .into_iter()
            .map(|(id, tier)| Tier {
                id,
                rate: tier.rate.clone(),
                connections: tier.connections,
            })
            .collect();

        TierTable { tiers }
    }

    /// Resolves a subscription descriptor to a tier.
    ///
    /// The descriptor is lowercased and the first tier whose identifier is a
    /// prefix of it wins. No match, or no descriptor at all, resolves to the
    /// default tier.
    pub fn classify(&self, subscription: Option<&str>) -> &Tier {
        let Some(subscription) = subscription else {
            return self.default_tier();
        };

        let subscription = subscription.to_lowercase();

        self.tiers
            .iter()
            .find(|tier| subscription.starts_with(tier.id.as_str()))
            .unwrap_or_else(|| self.default_tier())
    }

    fn default_tier(&self) -> &Tier {
        &self.tiers[0]
    }
}
