//! Market concentration.
//!
//! HHI = sum((share * 100)^2), i.e. squared fractional shares scaled by
//! 10,000. Bounded by [0, 10000]; a single firm scores 10,000.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::stats::{safe_div, saturating_sum};
use crate::types::{Money, Rate};

/// Market structure bands on the HHI scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStructure {
    Competitive,
    ModeratelyConcentrated,
    HighlyConcentrated,
}

impl std::fmt::Display for MarketStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketStructure::Competitive => write!(f, "Competitive"),
            MarketStructure::ModeratelyConcentrated => write!(f, "Moderately Concentrated"),
            MarketStructure::HighlyConcentrated => write!(f, "Highly Concentrated"),
        }
    }
}

/// Fraction of the total held by each entry; all zero when the total is zero.
pub fn revenue_shares(revenues: &[Money]) -> Vec<Rate> {
    let exact = revenues
        .iter()
        .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(*r));
    if let Some(total) = exact {
        return revenues.iter().map(|r| safe_div(*r, total)).collect();
    }
    // total out of range: share out the pre-divided revenues instead
    let n = Decimal::from(revenues.len() as u64);
    let scaled: Vec<Money> = revenues.iter().map(|r| *r / n).collect();
    let total = saturating_sum(scaled.iter().copied());
    scaled.iter().map(|r| safe_div(*r, total)).collect()
}

/// Herfindahl-Hirschman index of fractional shares.
pub fn herfindahl_index(shares: &[Rate]) -> Decimal {
    saturating_sum(shares.iter().map(|s| {
        let pct = s.saturating_mul(dec!(100));
        pct.saturating_mul(pct)
    }))
}

/// `< moderate` competitive, `[moderate, high]` moderate, `> high` highly
/// concentrated.
pub fn classify(hhi: Decimal, moderate: Decimal, high: Decimal) -> MarketStructure {
    if hhi < moderate {
        MarketStructure::Competitive
    } else if hhi <= high {
        MarketStructure::ModeratelyConcentrated
    } else {
        MarketStructure::HighlyConcentrated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Decimal, b: Decimal, eps: Decimal) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_monopoly_is_10000() {
        let shares = revenue_shares(&[dec!(500)]);
        assert_eq!(herfindahl_index(&shares), dec!(10000));
    }

    #[test]
    fn test_two_brand_example() {
        // 100M vs 20M revenue
        let shares = revenue_shares(&[dec!(100_000_000), dec!(20_000_000)]);
        let hhi = herfindahl_index(&shares);
        assert!(approx_eq(hhi, dec!(7222.22), dec!(0.01)));
        assert_eq!(
            classify(hhi, dec!(1500), dec!(2500)),
            MarketStructure::HighlyConcentrated
        );
    }

    #[test]
    fn test_equal_shares() {
        // 10 equal firms: 10 * 10^2 = 1000
        let shares = revenue_shares(&[dec!(1); 10]);
        assert!(approx_eq(herfindahl_index(&shares), dec!(1000), dec!(0.0001)));
    }

    #[test]
    fn test_shares_sum_to_one() {
        let shares = revenue_shares(&[dec!(3), dec!(7), dec!(11), dec!(13)]);
        let total: Decimal = shares.iter().copied().sum();
        assert!(approx_eq(total, Decimal::ONE, dec!(0.0000001)));
    }

    #[test]
    fn test_zero_total() {
        let shares = revenue_shares(&[Decimal::ZERO, Decimal::ZERO]);
        assert_eq!(herfindahl_index(&shares), Decimal::ZERO);
    }

    #[test]
    fn test_shares_of_capped_revenues() {
        let shares = revenue_shares(&[Decimal::MAX, Decimal::MAX]);
        assert!(shares.iter().all(|s| approx_eq(*s, dec!(0.5), dec!(0.0001))));
        assert!(approx_eq(herfindahl_index(&shares), dec!(5000), dec!(0.01)));
    }

    #[test]
    fn test_classification_boundaries() {
        let (m, h) = (dec!(1500), dec!(2500));
        assert_eq!(classify(dec!(1499.99), m, h), MarketStructure::Competitive);
        assert_eq!(classify(dec!(1500), m, h), MarketStructure::ModeratelyConcentrated);
        assert_eq!(classify(dec!(2500), m, h), MarketStructure::ModeratelyConcentrated);
        assert_eq!(classify(dec!(2500.01), m, h), MarketStructure::HighlyConcentrated);
    }
}
