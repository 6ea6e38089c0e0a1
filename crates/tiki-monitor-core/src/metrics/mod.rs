//! Derived business metrics over a product table.

pub mod brand_equity;
pub mod concentration;
pub mod customer;
pub mod derivation;
pub mod tiers;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dataset::schema::ColumnPresence;
use crate::dataset::ProductRecord;
use crate::types::Basis;

pub use derivation::{derive, DatasetMetrics, DerivedDataset, DerivedProduct};

/// A product's rating when it has actually been rated. Listings without
/// reviews carry a 0 average and are treated as unrated.
pub fn rated(record: &ProductRecord) -> Option<Decimal> {
    record.rating.filter(|r| *r > Decimal::ZERO)
}

/// How each metric is obtained, fixed once per column layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricBasis {
    pub revenue: Basis,
    pub price_tier: Basis,
    pub price_z_score: Basis,
    pub value_score: Basis,
    pub clv: Basis,
    pub nps: Basis,
    pub brand_equity: Basis,
    pub inventory_turnover: Basis,
    pub satisfaction_index: Basis,
    pub repeat_purchase: Basis,
    pub market_share: Basis,
    pub hhi: Basis,
}

impl MetricBasis {
    pub fn resolve(p: &ColumnPresence) -> Self {
        let pick = |full: bool, partial: bool| {
            if full {
                Basis::Computed
            } else if partial {
                Basis::Simplified
            } else {
                Basis::Fallback
            }
        };
        Self {
            revenue: pick(p.reported_revenue || (p.price && p.quantity_sold), false),
            price_tier: pick(p.price, false),
            price_z_score: pick(p.price, false),
            value_score: pick(p.price && p.rating, false),
            clv: pick(
                p.price && p.rating && p.review_count && p.quantity_sold,
                p.price && p.rating,
            ),
            nps: pick(p.rating, false),
            brand_equity: pick(p.brand && p.rating && p.review_count, p.brand),
            inventory_turnover: pick(p.review_count, false),
            satisfaction_index: pick(p.rating && p.review_count, p.rating),
            repeat_purchase: pick(p.rating && p.discount_rate, p.rating),
            market_share: pick(p.category, true),
            hhi: pick(p.brand, false),
        }
    }

    /// Metrics not computed from their full formula.
    pub fn degraded(&self) -> Vec<(&'static str, Basis)> {
        [
            ("revenue", self.revenue),
            ("price_tier", self.price_tier),
            ("price_z_score", self.price_z_score),
            ("value_score", self.value_score),
            ("clv", self.clv),
            ("nps", self.nps),
            ("brand_equity", self.brand_equity),
            ("inventory_turnover", self.inventory_turnover),
            ("satisfaction_index", self.satisfaction_index),
            ("repeat_purchase", self.repeat_purchase),
            ("market_share", self.market_share),
            ("hhi", self.hhi),
        ]
        .into_iter()
        .filter(|(_, b)| *b != Basis::Computed)
        .collect()
    }
}
