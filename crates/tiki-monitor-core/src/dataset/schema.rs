//! Column resolution for product tables.
//!
//! The set of recognised input fields is fixed. Each field lists the header
//! aliases it answers to; a table's headers are matched once at load time
//! and the result is carried as a typed presence record, so no derivation
//! has to probe header names again.

use serde::{Deserialize, Serialize};

/// Every optional input field the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductField {
    Id,
    Name,
    Brand,
    Category,
    Subcategory,
    Price,
    QuantitySold,
    Rating,
    ReviewCount,
    DiscountRate,
    ReportedRevenue,
}

impl ProductField {
    pub const ALL: [ProductField; 11] = [
        ProductField::Id,
        ProductField::Name,
        ProductField::Brand,
        ProductField::Category,
        ProductField::Subcategory,
        ProductField::Price,
        ProductField::QuantitySold,
        ProductField::Rating,
        ProductField::ReviewCount,
        ProductField::DiscountRate,
        ProductField::ReportedRevenue,
    ];

    /// Accepted header names, lower-case. The first one is canonical.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            ProductField::Id => &["id", "product_id"],
            ProductField::Name => &["product_name", "name"],
            ProductField::Brand => &["brand_name", "brand"],
            ProductField::Category => &["category_name", "category"],
            ProductField::Subcategory => &["subcategory_name", "subcategory"],
            ProductField::Price => &["price", "price(vnd)"],
            ProductField::QuantitySold => &["quantity_sold"],
            ProductField::Rating => &["rating_average", "rating"],
            ProductField::ReviewCount => &["review_count"],
            ProductField::DiscountRate => &["discount_rate", "discount", "discount_rate(%)"],
            ProductField::ReportedRevenue => &["total_sales_per_product"],
        }
    }

    pub fn canonical(&self) -> &'static str {
        self.aliases()[0]
    }

    /// What the pipeline does without this column.
    pub fn degradation(&self) -> &'static str {
        match self {
            ProductField::Id | ProductField::Name => "products are listed without identity",
            ProductField::Brand => "brand equity uses its fallback constant and HHI is zero",
            ProductField::Category => "market share is computed over the whole table",
            ProductField::Subcategory => "subcategory rankings are empty",
            ProductField::Price => {
                "every row falls into the default tier; value score and CLV are unavailable"
            }
            ProductField::QuantitySold => "quantity is treated as zero",
            ProductField::Rating => {
                "NPS is zero; satisfaction and repeat purchase use fallback constants"
            }
            ProductField::ReviewCount => {
                "CLV uses the mean-rating estimate; inventory turnover uses its fallback constant"
            }
            ProductField::DiscountRate => "repeat purchase probability ignores discounts",
            ProductField::ReportedRevenue => "revenue is price × quantity sold",
        }
    }
}

impl std::fmt::Display for ProductField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

/// Presence flag per recognised field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPresence {
    pub id: bool,
    pub name: bool,
    pub brand: bool,
    pub category: bool,
    pub subcategory: bool,
    pub price: bool,
    pub quantity_sold: bool,
    pub rating: bool,
    pub review_count: bool,
    pub discount_rate: bool,
    pub reported_revenue: bool,
}

impl ColumnPresence {
    pub fn has(&self, field: ProductField) -> bool {
        match field {
            ProductField::Id => self.id,
            ProductField::Name => self.name,
            ProductField::Brand => self.brand,
            ProductField::Category => self.category,
            ProductField::Subcategory => self.subcategory,
            ProductField::Price => self.price,
            ProductField::QuantitySold => self.quantity_sold,
            ProductField::Rating => self.rating,
            ProductField::ReviewCount => self.review_count,
            ProductField::DiscountRate => self.discount_rate,
            ProductField::ReportedRevenue => self.reported_revenue,
        }
    }

    fn set(&mut self, field: ProductField) {
        let flag = match field {
            ProductField::Id => &mut self.id,
            ProductField::Name => &mut self.name,
            ProductField::Brand => &mut self.brand,
            ProductField::Category => &mut self.category,
            ProductField::Subcategory => &mut self.subcategory,
            ProductField::Price => &mut self.price,
            ProductField::QuantitySold => &mut self.quantity_sold,
            ProductField::Rating => &mut self.rating,
            ProductField::ReviewCount => &mut self.review_count,
            ProductField::DiscountRate => &mut self.discount_rate,
            ProductField::ReportedRevenue => &mut self.reported_revenue,
        };
        *flag = true;
    }

    /// All recognised columns present.
    pub fn all() -> Self {
        let mut p = Self::default();
        for field in ProductField::ALL {
            p.set(field);
        }
        p
    }

    pub fn missing(&self) -> Vec<ProductField> {
        ProductField::ALL
            .into_iter()
            .filter(|f| !self.has(*f))
            .collect()
    }
}

/// Header positions of the recognised fields in one concrete table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSchema {
    positions: Vec<(ProductField, usize)>,
    presence: ColumnPresence,
}

impl ColumnSchema {
    /// Match headers against field aliases. Earlier aliases win when a
    /// table carries several spellings of the same field.
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Self {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| h.as_ref().trim().to_lowercase())
            .collect();

        let mut schema = ColumnSchema::default();
        for field in ProductField::ALL {
            let hit = field
                .aliases()
                .iter()
                .find_map(|alias| normalized.iter().position(|h| h == alias));
            if let Some(idx) = hit {
                schema.positions.push((field, idx));
                schema.presence.set(field);
            }
        }
        schema
    }

    pub fn position(&self, field: ProductField) -> Option<usize> {
        self.positions
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, idx)| *idx)
    }

    pub fn presence(&self) -> ColumnPresence {
        self.presence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_dashboard_headers() {
        let headers = [
            "id",
            "product_name",
            "price(vnd)",
            "quantity_sold",
            "brand_name",
            "category_name",
            "subcategory_name",
            "rating_average",
        ];
        let schema = ColumnSchema::resolve(&headers);
        assert_eq!(schema.position(ProductField::Price), Some(2));
        assert_eq!(schema.position(ProductField::Brand), Some(4));
        let p = schema.presence();
        assert!(p.price && p.quantity_sold && p.rating);
        assert!(!p.review_count);
        assert!(!p.discount_rate);
    }

    #[test]
    fn test_header_matching_ignores_case_and_whitespace() {
        let schema = ColumnSchema::resolve(&[" Price ", "Discount_Rate(%)"]);
        assert_eq!(schema.position(ProductField::Price), Some(0));
        assert_eq!(schema.position(ProductField::DiscountRate), Some(1));
    }

    #[test]
    fn test_canonical_alias_preferred() {
        let schema = ColumnSchema::resolve(&["rating", "rating_average"]);
        assert_eq!(schema.position(ProductField::Rating), Some(1));
    }

    #[test]
    fn test_missing_lists_absent_fields() {
        let schema = ColumnSchema::resolve(&["price", "quantity_sold"]);
        let missing = schema.presence().missing();
        assert!(missing.contains(&ProductField::Brand));
        assert!(!missing.contains(&ProductField::Price));
        assert_eq!(missing.len(), ProductField::ALL.len() - 2);
    }

    #[test]
    fn test_all_presence() {
        let p = ColumnPresence::all();
        assert!(p.missing().is_empty());
    }
}
