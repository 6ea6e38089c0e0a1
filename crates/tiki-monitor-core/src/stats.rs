//! Descriptive statistics over `Decimal` slices.
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`. Sums and
//! products clamp at the representable range instead of panicking.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

/// Sum that saturates at `Decimal::MAX` / `Decimal::MIN`.
pub fn saturating_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let n = Decimal::from(values.len() as u64);
    let exact = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v));
    match exact {
        Some(sum) => Some(sum / n),
        // sum out of range: average the pre-divided terms
        None => Some(saturating_sum(values.iter().map(|v| *v / n))),
    }
}

/// Sample standard deviation (n - 1 denominator); `None` below two values.
pub fn sample_std_dev(values: &[Decimal]) -> Option<Decimal> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let deviations: Vec<Decimal> = values.iter().map(|v| v.saturating_sub(m)).collect();
    // Squares are taken on deviations scaled into [-1, 1].
    let scale = deviations
        .iter()
        .map(|d| d.abs())
        .max()
        .unwrap_or(Decimal::ZERO);
    if scale.is_zero() {
        return Some(Decimal::ZERO);
    }
    let sum_sq = saturating_sum(deviations.iter().map(|d| {
        let u = *d / scale;
        u * u
    }));
    let variance = sum_sq / Decimal::from((values.len() - 1) as u64);
    Some(sqrt_decimal(variance).saturating_mul(scale))
}

/// Largest value; `None` for an empty iterator.
pub fn max_of(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values.into_iter().max()
}

/// Square root via rust_decimal's built-in sqrt, zero for non-positive input.
pub fn sqrt_decimal(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    value.sqrt().unwrap_or(Decimal::ZERO)
}

/// ln(1 + x) for x >= 0; zero otherwise.
pub fn ln_one_plus(x: Decimal) -> Decimal {
    if x <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    Decimal::ONE.saturating_add(x).checked_ln().unwrap_or(Decimal::ZERO)
}

/// `numerator / denominator`, zero when the denominator is zero or the
/// quotient is out of range.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}
