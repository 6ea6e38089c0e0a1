//! Customer proxies derived from star ratings.
//!
//! These approximate survey metrics from listing data: NPS from the share of
//! high versus low ratings, satisfaction from the rating scaled to 0-100.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::dataset::ProductRecord;
use crate::metrics::rated;
use crate::stats::{ln_one_plus, mean, safe_div};
use crate::types::Score;

/// Net Promoter Score approximated from ratings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NpsBreakdown {
    pub promoters: usize,
    pub passives: usize,
    pub detractors: usize,
    pub rated: usize,
    /// ((promoters - detractors) / rated) * 100, in [-100, 100].
    pub score: Score,
}

/// Count promoters (rating >= `promoter`) and detractors (rating <=
/// `detractor`) over rated products.
pub fn net_promoter_score(
    records: &[ProductRecord],
    promoter: Decimal,
    detractor: Decimal,
) -> NpsBreakdown {
    let mut out = NpsBreakdown::default();
    for r in records.iter().filter_map(rated) {
        out.rated += 1;
        if r >= promoter {
            out.promoters += 1;
        } else if r <= detractor {
            out.detractors += 1;
        } else {
            out.passives += 1;
        }
    }
    if out.rated > 0 {
        let net = Decimal::from(out.promoters as i64) - Decimal::from(out.detractors as i64);
        out.score = net / Decimal::from(out.rated as u64) * dec!(100);
    }
    out
}

/// Satisfaction of one rating on a 0-100 scale.
pub fn satisfaction(rating: Decimal) -> Score {
    rating / dec!(5) * dec!(100)
}

/// Dataset satisfaction index: row satisfaction weighted by ln(reviews + 1)
/// when `review_weighted`, plain mean otherwise. `None` without ratings.
pub fn satisfaction_index(records: &[ProductRecord], review_weighted: bool) -> Option<Score> {
    let rows: Vec<(Score, Decimal)> = records
        .iter()
        .filter_map(|r| {
            let rating = rated(r)?;
            let weight = ln_one_plus(r.review_count.unwrap_or(Decimal::ZERO));
            Some((satisfaction(rating), weight))
        })
        .collect();
    if rows.is_empty() {
        return None;
    }

    let total_weight: Decimal = rows.iter().map(|(_, w)| *w).sum();
    if review_weighted && total_weight > Decimal::ZERO {
        let weighted: Decimal = rows.iter().map(|(s, w)| *s * *w).sum();
        return Some(safe_div(weighted, total_weight));
    }
    mean(&rows.iter().map(|(s, _)| *s).collect::<Vec<_>>())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rated_product(rating: Option<Decimal>, reviews: Option<Decimal>) -> ProductRecord {
        ProductRecord {
            row: 0,
            id: None,
            name: None,
            brand: None,
            category: None,
            subcategory: None,
            price: None,
            quantity_sold: Decimal::ZERO,
            rating,
            review_count: reviews,
            discount_rate: None,
            reported_revenue: None,
            cells: Vec::new(),
        }
    }

    #[test]
    fn test_nps_example() {
        let records = vec![
            rated_product(Some(dec!(4.8)), None),
            rated_product(Some(dec!(4.8)), None),
            rated_product(Some(dec!(3.0)), None),
        ];
        let nps = net_promoter_score(&records, dec!(4.5), dec!(3.0));
        assert_eq!(nps.promoters, 2);
        assert_eq!(nps.detractors, 1);
        assert_eq!(nps.rated, 3);
        assert!((nps.score - dec!(33.333)).abs() < dec!(0.001));
    }

    #[test]
    fn test_nps_ignores_unrated() {
        let records = vec![
            rated_product(None, None),
            rated_product(Some(Decimal::ZERO), None),
            rated_product(Some(dec!(4.0)), None),
        ];
        let nps = net_promoter_score(&records, dec!(4.5), dec!(3.0));
        assert_eq!(nps.rated, 1);
        assert_eq!(nps.passives, 1);
        assert_eq!(nps.score, Decimal::ZERO);
    }

    #[test]
    fn test_nps_no_ratings_is_zero() {
        let nps = net_promoter_score(&[], dec!(4.5), dec!(3.0));
        assert_eq!(nps, NpsBreakdown::default());
    }

    #[test]
    fn test_satisfaction_scale() {
        assert_eq!(satisfaction(dec!(5)), dec!(100));
        assert_eq!(satisfaction(dec!(4)), dec!(80));
    }

    #[test]
    fn test_review_weighting_favours_reviewed_products() {
        let records = vec![
            rated_product(Some(dec!(5)), Some(dec!(1000))),
            rated_product(Some(dec!(2)), Some(dec!(1))),
        ];
        let weighted = satisfaction_index(&records, true).unwrap();
        let plain = satisfaction_index(&records, false).unwrap();
        assert_eq!(plain, dec!(70));
        assert!(weighted > plain);
    }

    #[test]
    fn test_satisfaction_index_without_ratings() {
        let records = vec![rated_product(None, Some(dec!(3)))];
        assert_eq!(satisfaction_index(&records, true), None);
    }
}
