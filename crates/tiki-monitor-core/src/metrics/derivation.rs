//! Per-row and dataset-level metric derivation.
//!
//! Covers:
//! 1. **Revenue** -- reported revenue, else price * quantity sold
//! 2. **Price tier** -- left-closed bucket over configured breakpoints
//! 3. **Price z-score** -- (price - mean) / sample std dev
//! 4. **Value score** -- rating / (price in millions) * 100
//! 5. **CLV proxy** -- price * (quantity / (reviews + 1)) * rating * margin
//! 6. **Inventory turnover proxy** -- quantity / (reviews + 1)
//! 7. **Satisfaction index** -- rating / 5 * 100
//! 8. **Repeat purchase probability** -- blend of rating and relative discount
//! 9. **Category market share** -- revenue / category revenue
//! 10. **NPS, brand equity, HHI** -- dataset level
//!
//! Derivation is total: a missing optional column selects a simpler formula
//! or a configured constant, recorded in [`MetricBasis`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::DashboardConfig;
use crate::dataset::schema::ColumnPresence;
use crate::dataset::{ProductRecord, ProductTable};
use crate::metrics::brand_equity::{aggregate_brands, BrandAggregate};
use crate::metrics::concentration::{classify, herfindahl_index, MarketStructure};
use crate::metrics::customer::{
    net_promoter_score, satisfaction, satisfaction_index, NpsBreakdown,
};
use crate::metrics::tiers::{PriceTier, TierScheme};
use crate::metrics::{rated, MetricBasis};
use crate::stats::{max_of, mean, safe_div, sample_std_dev, saturating_sum};
use crate::types::{Money, Rate, Score};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Derived columns of one product, aligned with the table's records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedProduct {
    pub row: usize,
    pub revenue: Money,
    /// Index into `DerivedDataset::tiers`.
    pub tier: Option<usize>,
    pub price_z_score: Decimal,
    pub value_score: Option<Decimal>,
    pub clv_proxy: Money,
    pub inventory_turnover: Decimal,
    pub satisfaction_index: Score,
    pub repeat_purchase_probability: Rate,
    /// Fraction of the product's category revenue.
    pub category_market_share: Rate,
}

/// Scalar metrics over the whole table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetrics {
    pub total_revenue: Money,
    /// Rows whose price * quantity exceeded `Decimal::MAX` and were capped.
    pub capped_revenue_rows: usize,
    pub mean_price: Option<Money>,
    pub price_std_dev: Option<Money>,
    /// Mean over rated products.
    pub mean_rating: Option<Decimal>,
    pub nps: NpsBreakdown,
    pub satisfaction_index: Score,
    /// Mean of brand equity scores, or the fallback constant.
    pub brand_equity: Score,
    pub hhi: Decimal,
    /// `None` when there is no brand revenue to classify.
    pub market_structure: Option<MarketStructure>,
}

/// Everything the summary layer needs from one derivation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedDataset {
    pub products: Vec<DerivedProduct>,
    pub brands: Vec<BrandAggregate>,
    pub tiers: Vec<PriceTier>,
    pub metrics: DatasetMetrics,
    pub basis: MetricBasis,
}

impl DerivedDataset {
    pub fn tier_label(&self, product: &DerivedProduct) -> Option<&str> {
        product
            .tier
            .and_then(|i| self.tiers.get(i))
            .map(|t| t.label.as_str())
    }
}

/// Dataset-wide inputs shared by the per-row formulas.
struct RowContext<'a> {
    presence: ColumnPresence,
    config: &'a DashboardConfig,
    tiers: TierScheme,
    mean_price: Option<Money>,
    price_std_dev: Option<Money>,
    mean_rating: Option<Decimal>,
    max_discount: Decimal,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Derive every metric for `table`. Never fails; an empty table yields zeros.
pub fn derive(table: &ProductTable, config: &DashboardConfig) -> DerivedDataset {
    let presence = table.presence();
    let basis = MetricBasis::resolve(&presence);
    let records = &table.records;

    let prices: Vec<Money> = records.iter().filter_map(|r| r.price).collect();
    let ratings: Vec<Decimal> = records.iter().filter_map(rated).collect();

    let tiers = if presence.price {
        TierScheme::new(&config.price_tiers)
    } else {
        TierScheme::single(&config.default_tier_label)
    };

    let ctx = RowContext {
        presence,
        config,
        tiers,
        mean_price: mean(&prices),
        price_std_dev: sample_std_dev(&prices),
        mean_rating: mean(&ratings),
        max_discount: max_of(records.iter().filter_map(|r| r.discount_rate))
            .unwrap_or(Decimal::ZERO),
    };

    let revenues: Vec<Money> = records.iter().map(revenue).collect();
    let category_totals = category_revenue(records, &revenues, presence.category);

    let products: Vec<DerivedProduct> = records
        .iter()
        .zip(revenues.iter())
        .map(|(r, rev)| {
            let group_total = category_totals
                .get(&category_key(r, presence.category))
                .copied()
                .unwrap_or(Decimal::ZERO);
            derive_row(r, *rev, group_total, &ctx)
        })
        .collect();

    let brands = if presence.brand {
        aggregate_brands(records, &revenues, &presence, &config.equity_weights)
    } else {
        Vec::new()
    };

    let total_revenue = saturating_sum(revenues.iter().copied());
    let capped_revenue_rows = records.iter().filter(|r| revenue_overflows(r)).count();
    if capped_revenue_rows > 0 {
        log::warn!("{capped_revenue_rows} rows exceed the revenue range and were capped");
    }
    let brand_shares: Vec<Rate> = brands.iter().map(|b| b.market_share).collect();
    let hhi = herfindahl_index(&brand_shares);
    let market_structure = if brands.is_empty() || total_revenue.is_zero() {
        None
    } else {
        Some(classify(hhi, config.hhi_moderate, config.hhi_high))
    };

    let brand_equity = if presence.brand {
        mean(&brands.iter().map(|b| b.equity_score).collect::<Vec<_>>())
            .unwrap_or(Decimal::ZERO)
    } else {
        config.fallbacks.brand_equity
    };

    let csi = if presence.rating {
        satisfaction_index(records, presence.review_count)
            .unwrap_or(config.fallbacks.satisfaction_index)
    } else {
        config.fallbacks.satisfaction_index
    };

    let metrics = DatasetMetrics {
        total_revenue,
        capped_revenue_rows,
        mean_price: ctx.mean_price,
        price_std_dev: ctx.price_std_dev,
        mean_rating: ctx.mean_rating,
        nps: net_promoter_score(records, config.promoter_rating, config.detractor_rating),
        satisfaction_index: csi,
        brand_equity,
        hhi,
        market_structure,
    };

    log::debug!(
        "derived {} products, {} brands, HHI {}",
        products.len(),
        brands.len(),
        hhi.round_dp(2)
    );

    DerivedDataset {
        products,
        brands,
        tiers: ctx.tiers.tiers().to_vec(),
        metrics,
        basis,
    }
}

/// Reported revenue when supplied, else price * quantity, else zero.
/// A product past `Decimal::MAX` saturates.
pub fn revenue(record: &ProductRecord) -> Money {
    match (record.reported_revenue, record.price) {
        (Some(reported), _) => reported,
        (None, Some(price)) => price.saturating_mul(record.quantity_sold),
        (None, None) => Decimal::ZERO,
    }
}

fn revenue_overflows(record: &ProductRecord) -> bool {
    match (record.reported_revenue, record.price) {
        (None, Some(price)) => price.checked_mul(record.quantity_sold).is_none(),
        _ => false,
    }
}

fn derive_row(
    r: &ProductRecord,
    revenue: Money,
    category_total: Money,
    ctx: &RowContext<'_>,
) -> DerivedProduct {
    let cfg = ctx.config;
    let rating = rated(r);

    let tier = if ctx.presence.price {
        r.price.and_then(|p| ctx.tiers.assign(p)).map(|t| t.index)
    } else {
        Some(0)
    };

    DerivedProduct {
        row: r.row,
        revenue,
        tier,
        price_z_score: price_z_score(r.price, ctx.mean_price, ctx.price_std_dev),
        value_score: value_score(rating, r.price),
        clv_proxy: clv_proxy(r, rating, ctx),
        inventory_turnover: if ctx.presence.review_count {
            inventory_turnover(r.quantity_sold, r.review_count)
        } else {
            cfg.fallbacks.inventory_turnover
        },
        satisfaction_index: rating
            .map(satisfaction)
            .unwrap_or(cfg.fallbacks.satisfaction_index),
        repeat_purchase_probability: match rating {
            Some(rt) => {
                let discount_term = safe_div(
                    r.discount_rate.unwrap_or(Decimal::ZERO),
                    ctx.max_discount,
                );
                cfg.repeat_rating_weight * (rt / dec!(5))
                    + cfg.repeat_discount_weight * discount_term
            }
            None => cfg.fallbacks.repeat_purchase,
        },
        category_market_share: safe_div(revenue, category_total),
    }
}

/// (price - mean) / std dev; zero when undefined.
pub fn price_z_score(
    price: Option<Money>,
    mean: Option<Money>,
    std_dev: Option<Money>,
) -> Decimal {
    match (price, mean, std_dev) {
        (Some(p), Some(m), Some(sd)) => safe_div(p.saturating_sub(m), sd),
        _ => Decimal::ZERO,
    }
}

/// Rating points per million VND, scaled by 100.
pub fn value_score(rating: Option<Decimal>, price: Option<Money>) -> Option<Decimal> {
    match (rating, price) {
        (Some(r), Some(p)) if p > Decimal::ZERO => r
            .checked_div(p / dec!(1_000_000))?
            .checked_mul(dec!(100)),
        _ => None,
    }
}

pub fn inventory_turnover(quantity: Decimal, reviews: Option<Decimal>) -> Decimal {
    quantity / reviews.unwrap_or(Decimal::ZERO).saturating_add(Decimal::ONE)
}

fn clv_proxy(r: &ProductRecord, rating: Option<Decimal>, ctx: &RowContext<'_>) -> Money {
    let margin = ctx.config.clv_margin;
    let Some(price) = r.price else {
        return Decimal::ZERO;
    };
    match (rating, r.review_count) {
        (Some(rt), Some(reviews)) if ctx.presence.review_count => {
            price
                .saturating_mul(inventory_turnover(r.quantity_sold, Some(reviews)))
                .saturating_mul(rt)
                .saturating_mul(margin)
        }
        _ => ctx
            .mean_rating
            .map(|m| price.saturating_mul(m).saturating_mul(margin))
            .unwrap_or(Decimal::ZERO),
    }
}

fn category_key(r: &ProductRecord, by_category: bool) -> Option<String> {
    if by_category {
        r.category.clone()
    } else {
        None
    }
}

fn category_revenue(
    records: &[ProductRecord],
    revenues: &[Money],
    by_category: bool,
) -> HashMap<Option<String>, Money> {
    let mut totals: HashMap<Option<String>, Money> = HashMap::new();
    for (r, rev) in records.iter().zip(revenues.iter()) {
        let total = totals.entry(category_key(r, by_category)).or_default();
        *total = total.saturating_add(*rev);
    }
    totals
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
