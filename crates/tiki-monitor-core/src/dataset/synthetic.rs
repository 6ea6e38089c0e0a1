//! Demo product tables.
//!
//! The shape is fixed (every recognised column, a phone-and-accessories
//! catalogue); the values are random unless a seed is given.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::dataset::loader::load_products;
use crate::dataset::schema::ProductField;
use crate::dataset::{DataSource, ProductTable};
use crate::error::MonitorError;
use crate::MonitorResult;

const BRANDS: [&str; 8] = [
    "Samsung", "Apple", "Xiaomi", "OPPO", "Vivo", "Realme", "Nokia", "OEM",
];

const CATALOGUE: [(&str, &[&str]); 2] = [
    (
        "Điện Thoại - Máy Tính Bảng",
        &["Điện thoại Smartphone", "Máy tính bảng", "Điện thoại phổ thông"],
    ),
    (
        "Thiết Bị Số - Phụ Kiện Số",
        &["Tai nghe", "Sạc dự phòng", "Ốp lưng"],
    ),
];

/// Generate `rows` synthetic products.
pub fn generate(rows: usize, seed: Option<u64>) -> MonitorResult<ProductTable> {
    if rows == 0 {
        return Err(MonitorError::InvalidInput {
            field: "synthetic_rows".into(),
            reason: "At least one synthetic row is required".into(),
        });
    }
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let csv_text = render_csv(rows, &mut rng)?;
    let mut table = load_products(csv_text.as_bytes())?;
    table.report.source = DataSource::Synthetic { rows, seed };
    Ok(table)
}

/// Synthetic rows as CSV text with canonical headers.
pub fn render_csv(rows: usize, rng: &mut StdRng) -> MonitorResult<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    let headers: Vec<&str> = ProductField::ALL
        .iter()
        .filter(|f| **f != ProductField::ReportedRevenue)
        .map(|f| f.canonical())
        .collect();
    wtr.write_record(&headers)?;

    for i in 0..rows {
        let brand = BRANDS.choose(rng).copied().unwrap_or("OEM");
        let (category, subcategories) = CATALOGUE[rng.gen_range(0..CATALOGUE.len())];
        let subcategory = subcategories.choose(rng).copied().unwrap_or_default();

        let is_device = category == CATALOGUE[0].0;
        let price_k: u64 = if is_device {
            rng.gen_range(900..45_000)
        } else {
            rng.gen_range(50..2_000)
        };
        let price = Decimal::from(price_k * 1_000);
        let quantity: u32 = rng.gen_range(0..5_000);
        let reviews: u32 = if quantity == 0 {
            0
        } else {
            rng.gen_range(0..=quantity.min(2_000))
        };
        let rating = if reviews == 0 {
            Decimal::ZERO
        } else {
            Decimal::new(rng.gen_range(30..=50), 1)
        };
        let discount: u32 = rng.gen_range(0..=50);

        let record = [
            format!("{}", 100_000 + i),
            format!("{brand} {subcategory} #{}", i + 1),
            brand.to_string(),
            category.to_string(),
            subcategory.to_string(),
            price.to_string(),
            quantity.to_string(),
            rating.to_string(),
            reviews.to_string(),
            discount.to_string(),
        ];
        wtr.write_record(&record)?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| MonitorError::SerializationError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| MonitorError::SerializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_shape() {
        let table = generate(50, Some(1)).unwrap();
        assert_eq!(table.len(), 50);
        let p = table.presence();
        assert!(p.price && p.brand && p.rating && p.review_count && p.discount_rate);
        assert!(!p.reported_revenue);
        assert!(table.report.coerced.is_empty());
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = generate(10, Some(99)).unwrap();
        let b = generate(10, Some(99)).unwrap();
        assert_eq!(a.records, b.records);
    }

    #[test]
    fn test_values_respect_invariants() {
        let table = generate(200, Some(3)).unwrap();
        for r in &table.records {
            assert!(r.price.unwrap() >= Decimal::ZERO);
            assert!(r.quantity_sold >= Decimal::ZERO);
            let rating = r.rating.unwrap();
            assert!(rating >= Decimal::ZERO && rating <= Decimal::from(5));
        }
    }

    #[test]
    fn test_zero_rows_rejected() {
        assert!(generate(0, None).is_err());
    }
}
