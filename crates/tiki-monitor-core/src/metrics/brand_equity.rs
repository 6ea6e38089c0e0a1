//! Brand aggregates and the composite brand equity score.
//!
//! Equity = 100 * (w_q * quality + w_v * volume + w_r * revenue + w_a * awareness)
//! where each component is the brand's value divided by the largest value
//! across brands (0-1 scaling):
//! - quality: mean rating of rated products
//! - volume: quantity sold
//! - revenue: revenue
//! - awareness: review total, or product count without a review column

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::EquityWeights;
use crate::dataset::schema::ColumnPresence;
use crate::dataset::ProductRecord;
use crate::metrics::concentration::revenue_shares;
use crate::metrics::rated;
use crate::stats::{mean, safe_div};
use crate::types::{Money, Rate, Score};

/// Group label for rows without a brand.
pub const UNBRANDED: &str = "(Unbranded)";

/// Per-brand totals over the current table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandAggregate {
    pub brand: String,
    pub products: usize,
    pub revenue: Money,
    pub quantity: Decimal,
    pub mean_rating: Option<Decimal>,
    pub reviews: Decimal,
    pub equity_score: Score,
    /// Fraction of the table's total revenue.
    pub market_share: Rate,
}

#[derive(Default)]
struct BrandAccumulator {
    products: usize,
    revenue: Money,
    quantity: Decimal,
    ratings: Vec<Decimal>,
    reviews: Decimal,
}

/// Aggregate `records` by brand in first-seen order. `revenues` is aligned
/// with `records`.
pub fn aggregate_brands(
    records: &[ProductRecord],
    revenues: &[Money],
    presence: &ColumnPresence,
    weights: &EquityWeights,
) -> Vec<BrandAggregate> {
    let mut order: Vec<String> = Vec::new();
    let mut acc: HashMap<String, BrandAccumulator> = HashMap::new();

    for (record, revenue) in records.iter().zip(revenues.iter()) {
        let key = record.brand.clone().unwrap_or_else(|| UNBRANDED.to_string());
        let entry = acc.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            BrandAccumulator::default()
        });
        entry.products += 1;
        entry.revenue = entry.revenue.saturating_add(*revenue);
        entry.quantity = entry.quantity.saturating_add(record.quantity_sold);
        if let Some(r) = rated(record) {
            entry.ratings.push(r);
        }
        entry.reviews = entry
            .reviews
            .saturating_add(record.review_count.unwrap_or(Decimal::ZERO));
    }

    let mut brands: Vec<BrandAggregate> = order
        .into_iter()
        .filter_map(|brand| {
            let a = acc.remove(&brand)?;
            Some(BrandAggregate {
                brand,
                products: a.products,
                revenue: a.revenue,
                quantity: a.quantity,
                mean_rating: mean(&a.ratings),
                reviews: a.reviews,
                equity_score: Decimal::ZERO,
                market_share: Decimal::ZERO,
            })
        })
        .collect();

    let shares = revenue_shares(&brands.iter().map(|b| b.revenue).collect::<Vec<_>>());
    for (b, share) in brands.iter_mut().zip(shares) {
        b.market_share = share;
    }
    score_equity(&mut brands, presence, weights);
    brands
}

fn awareness(b: &BrandAggregate, presence: &ColumnPresence) -> Decimal {
    if presence.review_count {
        b.reviews
    } else {
        Decimal::from(b.products as u64)
    }
}

fn score_equity(brands: &mut [BrandAggregate], presence: &ColumnPresence, w: &EquityWeights) {
    let quality_of = |b: &BrandAggregate| b.mean_rating.unwrap_or(Decimal::ZERO);
    let max_of = |f: &dyn Fn(&BrandAggregate) -> Decimal| {
        brands.iter().map(f).max().unwrap_or(Decimal::ZERO)
    };
    let max_quality = max_of(&quality_of);
    let max_volume = max_of(&|b: &BrandAggregate| b.quantity);
    let max_revenue = max_of(&|b: &BrandAggregate| b.revenue);
    let max_awareness = max_of(&|b: &BrandAggregate| awareness(b, presence));

    let scores: Vec<Score> = brands
        .iter()
        .map(|b| {
            let composite = w.quality * safe_div(quality_of(b), max_quality)
                + w.volume * safe_div(b.quantity, max_volume)
                + w.revenue * safe_div(b.revenue, max_revenue)
                + w.awareness * safe_div(awareness(b, presence), max_awareness);
            composite * dec!(100)
        })
        .collect();

    for (b, score) in brands.iter_mut().zip(scores) {
        b.equity_score = score;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(
        row: usize,
        brand: Option<&str>,
        qty: Decimal,
        rating: Option<Decimal>,
    ) -> ProductRecord {
        ProductRecord {
            row,
            id: None,
            name: None,
            brand: brand.map(String::from),
            category: None,
            subcategory: None,
            price: Some(dec!(1_000_000)),
            quantity_sold: qty,
            rating,
            review_count: Some(dec!(10)),
            discount_rate: None,
            reported_revenue: None,
            cells: Vec::new(),
        }
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let records = vec![
            product(0, Some("Xiaomi"), dec!(1), Some(dec!(4))),
            product(1, Some("Apple"), dec!(1), Some(dec!(5))),
            product(2, Some("Xiaomi"), dec!(1), Some(dec!(3))),
        ];
        let revenues = vec![dec!(10), dec!(30), dec!(20)];
        let brands = aggregate_brands(
            &records,
            &revenues,
            &ColumnPresence::all(),
            &EquityWeights::default(),
        );
        assert_eq!(brands.len(), 2);
        assert_eq!(brands[0].brand, "Xiaomi");
        assert_eq!(brands[0].products, 2);
        assert_eq!(brands[0].revenue, dec!(30));
        assert_eq!(brands[0].mean_rating, Some(dec!(3.5)));
        assert_eq!(brands[0].market_share, dec!(0.5));
    }

    #[test]
    fn test_leader_in_every_component_scores_100() {
        let records = vec![
            product(0, Some("A"), dec!(10), Some(dec!(5))),
            product(1, Some("B"), dec!(1), Some(dec!(2))),
        ];
        let revenues = vec![dec!(100), dec!(10)];
        let mut presence = ColumnPresence::all();
        presence.review_count = false;
        let brands =
            aggregate_brands(&records, &revenues, &presence, &EquityWeights::default());
        // A leads quality, volume, revenue; awareness ties on product count.
        assert_eq!(brands[0].equity_score, dec!(100));
        // B: 0.30*0.4 + 0.25*0.1 + 0.25*0.1 + 0.20*1 = 0.37
        assert_eq!(brands[1].equity_score, dec!(37.0));
    }

    #[test]
    fn test_unbranded_rows_grouped() {
        let records = vec![
            product(0, None, dec!(1), None),
            product(1, Some("A"), dec!(1), None),
        ];
        let revenues = vec![dec!(40), dec!(60)];
        let brands = aggregate_brands(
            &records,
            &revenues,
            &ColumnPresence::all(),
            &EquityWeights::default(),
        );
        assert_eq!(brands[0].brand, UNBRANDED);
        let total: Decimal = brands.iter().map(|b| b.market_share).sum();
        assert_eq!(total, Decimal::ONE);
    }
}
