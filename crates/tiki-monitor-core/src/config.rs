use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MonitorError;
use crate::types::{Money, Rate, Score};
use crate::MonitorResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What the loader does when the input path does not resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFilePolicy {
    /// Fail with `DataNotFound`.
    #[default]
    Strict,
    /// Generate a demo table and report it as a warning.
    Synthesize,
}

/// One price tier: prices in `[lower, next tier's lower)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierBound {
    pub label: String,
    pub lower: Money,
}

/// Weights of the brand equity components. Must sum to 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityWeights {
    pub quality: Rate,
    pub volume: Rate,
    pub revenue: Rate,
    pub awareness: Rate,
}

impl Default for EquityWeights {
    fn default() -> Self {
        Self {
            quality: dec!(0.30),
            volume: dec!(0.25),
            revenue: dec!(0.25),
            awareness: dec!(0.20),
        }
    }
}

/// Constants substituted when a metric's inputs are absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConstants {
    pub brand_equity: Score,
    pub inventory_turnover: Decimal,
    pub satisfaction_index: Score,
    pub repeat_purchase: Rate,
}

impl Default for FallbackConstants {
    fn default() -> Self {
        Self {
            brand_equity: dec!(65.0),
            inventory_turnover: dec!(1.0),
            satisfaction_index: dec!(70.0),
            repeat_purchase: dec!(0.3),
        }
    }
}

/// Row limits for the ranked tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopN {
    pub brands: usize,
    pub subcategories: usize,
    pub subcategory_distribution: usize,
    pub products: usize,
}

impl Default for TopN {
    fn default() -> Self {
        Self {
            brands: 10,
            subcategories: 15,
            subcategory_distribution: 15,
            products: 20,
        }
    }
}

/// Every tunable of the load → derive → summarize pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub missing_file: MissingFilePolicy,
    pub synthetic_rows: usize,
    /// Seed for the synthetic table; random when absent.
    pub synthetic_seed: Option<u64>,
    /// Ascending lower bounds; the last tier is unbounded above.
    pub price_tiers: Vec<TierBound>,
    /// Label used for every row when the price column is absent.
    pub default_tier_label: String,
    pub clv_margin: Rate,
    pub equity_weights: EquityWeights,
    pub repeat_rating_weight: Rate,
    pub repeat_discount_weight: Rate,
    pub fallbacks: FallbackConstants,
    pub promoter_rating: Decimal,
    pub detractor_rating: Decimal,
    pub hhi_moderate: Decimal,
    pub hhi_high: Decimal,
    pub top_n: TopN,
    pub rating_bins: usize,
    pub price_bins: usize,
    pub scatter_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            missing_file: MissingFilePolicy::Strict,
            synthetic_rows: 200,
            synthetic_seed: None,
            price_tiers: default_price_tiers(),
            default_tier_label: "All prices".into(),
            clv_margin: dec!(0.3),
            equity_weights: EquityWeights::default(),
            repeat_rating_weight: dec!(0.7),
            repeat_discount_weight: dec!(0.3),
            fallbacks: FallbackConstants::default(),
            promoter_rating: dec!(4.5),
            detractor_rating: dec!(3.0),
            hhi_moderate: dec!(1500),
            hhi_high: dec!(2500),
            top_n: TopN::default(),
            rating_bins: 20,
            price_bins: 30,
            scatter_limit: 500,
        }
    }
}

fn default_price_tiers() -> Vec<TierBound> {
    [
        ("0-1M", dec!(0)),
        ("1-5M", dec!(1_000_000)),
        ("5-10M", dec!(5_000_000)),
        ("10-20M", dec!(10_000_000)),
        ("20-50M", dec!(20_000_000)),
        ("50-100M", dec!(50_000_000)),
        ("100M+", dec!(100_000_000)),
    ]
    .into_iter()
    .map(|(label, lower)| TierBound {
        label: label.into(),
        lower,
    })
    .collect()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl DashboardConfig {
    /// Reject configurations the pipeline cannot honour.
    pub fn validate(&self) -> MonitorResult<()> {
        if self.price_tiers.is_empty() {
            return Err(MonitorError::ConfigError(
                "At least one price tier is required".into(),
            ));
        }
        for pair in self.price_tiers.windows(2) {
            if pair[1].lower <= pair[0].lower {
                return Err(MonitorError::ConfigError(format!(
                    "Price tier '{}' must start above '{}'",
                    pair[1].label, pair[0].label
                )));
            }
        }
        if self.price_tiers[0].lower < Decimal::ZERO {
            return Err(MonitorError::ConfigError(
                "Price tiers cannot start below zero".into(),
            ));
        }

        let w = &self.equity_weights;
        let total = w.quality + w.volume + w.revenue + w.awareness;
        if (total - Decimal::ONE).abs() > dec!(0.0001) {
            return Err(MonitorError::ConfigError(format!(
                "Brand equity weights must sum to 1, got {total}"
            )));
        }
        let repeat_total = self.repeat_rating_weight + self.repeat_discount_weight;
        if (repeat_total - Decimal::ONE).abs() > dec!(0.0001) {
            return Err(MonitorError::ConfigError(format!(
                "Repeat purchase weights must sum to 1, got {repeat_total}"
            )));
        }
        if self.detractor_rating >= self.promoter_rating {
            return Err(MonitorError::ConfigError(
                "Detractor rating must be below promoter rating".into(),
            ));
        }
        if self.hhi_moderate >= self.hhi_high {
            return Err(MonitorError::ConfigError(
                "Moderate HHI threshold must be below the high threshold".into(),
            ));
        }
        if self.clv_margin < Decimal::ZERO {
            return Err(MonitorError::ConfigError(
                "CLV margin cannot be negative".into(),
            ));
        }
        if self.rating_bins == 0 || self.price_bins == 0 {
            return Err(MonitorError::ConfigError(
                "Histogram bin counts must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(DashboardConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_tiers_match_dashboard_bins() {
        let cfg = DashboardConfig::default();
        let labels: Vec<&str> = cfg.price_tiers.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["0-1M", "1-5M", "5-10M", "10-20M", "20-50M", "50-100M", "100M+"]
        );
    }

    #[test]
    fn test_unsorted_tiers_rejected() {
        let mut cfg = DashboardConfig::default();
        cfg.price_tiers.swap(1, 2);
        assert!(matches!(cfg.validate(), Err(MonitorError::ConfigError(_))));
    }

    #[test]
    fn test_equity_weights_must_sum_to_one() {
        let mut cfg = DashboardConfig::default();
        cfg.equity_weights.quality = dec!(0.5);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: DashboardConfig =
            serde_json::from_str(r#"{"missing_file": "synthesize", "clv_margin": "0.25"}"#)
                .unwrap();
        assert_eq!(cfg.missing_file, MissingFilePolicy::Synthesize);
        assert_eq!(cfg.clv_margin, dec!(0.25));
        assert_eq!(cfg.top_n.brands, 10);
    }
}
