//! Price tier binning.
//!
//! Tiers are left-closed, right-open: a price equal to a breakpoint belongs
//! to the tier that starts there. The last tier is unbounded above.

use serde::{Deserialize, Serialize};

use crate::config::TierBound;
use crate::types::Money;

/// A tier resolved against its neighbours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    pub index: usize,
    pub label: String,
    pub lower: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<Money>,
}

impl PriceTier {
    pub fn contains(&self, price: Money) -> bool {
        price >= self.lower && self.upper.map_or(true, |u| price < u)
    }
}

/// Ordered tier set used to bucket prices.
#[derive(Debug, Clone, PartialEq)]
pub struct TierScheme {
    tiers: Vec<PriceTier>,
}

impl TierScheme {
    /// Build from ascending lower bounds (validated by `DashboardConfig`).
    pub fn new(bounds: &[TierBound]) -> Self {
        let tiers = bounds
            .iter()
            .enumerate()
            .map(|(i, b)| PriceTier {
                index: i,
                label: b.label.clone(),
                lower: b.lower,
                upper: bounds.get(i + 1).map(|next| next.lower),
            })
            .collect();
        Self { tiers }
    }

    /// Single catch-all tier, used when prices are unavailable.
    pub fn single(label: &str) -> Self {
        Self {
            tiers: vec![PriceTier {
                index: 0,
                label: label.to_string(),
                lower: Money::ZERO,
                upper: None,
            }],
        }
    }

    pub fn tiers(&self) -> &[PriceTier] {
        &self.tiers
    }

    /// The unique tier containing `price`; `None` below the first breakpoint.
    pub fn assign(&self, price: Money) -> Option<&PriceTier> {
        // Upper bounds are ascending, so the first tier whose upper bound
        // exceeds the price is the only candidate.
        self.tiers
            .iter()
            .find(|t| t.upper.map_or(true, |u| price < u))
            .filter(|t| price >= t.lower)
    }
}
