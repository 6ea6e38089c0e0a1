//! Product filter predicate and the option lists that drive it.
//!
//! Constraints combine with AND. An empty multi-select imposes no
//! constraint. A constraint on a column the table lacks is dropped and
//! reported rather than emptying the result.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::dataset::schema::{ColumnPresence, ProductField};
use crate::dataset::{ProductRecord, ProductTable};
use crate::error::MonitorError;
use crate::types::Money;
use crate::MonitorResult;

/// Single-select category with an "all" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySelection {
    #[default]
    All,
    Only(String),
}

impl CategorySelection {
    pub fn is_all(&self) -> bool {
        matches!(self, CategorySelection::All)
    }
}

/// Inclusive price bounds; either side may be open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<Money>,
    pub max: Option<Money>,
}

impl PriceRange {
    pub fn contains(&self, price: Money) -> bool {
        self.min.map_or(true, |m| price >= m) && self.max.map_or(true, |m| price <= m)
    }
}

/// The dashboard's sidebar selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductFilter {
    pub category: CategorySelection,
    pub subcategories: Vec<String>,
    pub brands: Vec<String>,
    /// Rows without a price are excluded when a range is set.
    pub price_range: Option<PriceRange>,
}

impl ProductFilter {
    pub fn validate(&self) -> MonitorResult<()> {
        let Some(range) = &self.price_range else {
            return Ok(());
        };
        if let (Some(lo), Some(hi)) = (range.min, range.max) {
            if lo > hi {
                return Err(MonitorError::InvalidInput {
                    field: "price_range".into(),
                    reason: format!("Minimum price {lo} exceeds maximum {hi}"),
                });
            }
        }
        if range.min.is_some_and(|m| m < Decimal::ZERO) {
            return Err(MonitorError::InvalidInput {
                field: "price_range".into(),
                reason: "Minimum price cannot be negative".into(),
            });
        }
        Ok(())
    }

    /// Columns this filter constrains but the table does not have.
    pub fn unsupported_fields(&self, presence: &ColumnPresence) -> Vec<ProductField> {
        let mut out = Vec::new();
        if !self.category.is_all() && !presence.category {
            out.push(ProductField::Category);
        }
        if !self.subcategories.is_empty() && !presence.subcategory {
            out.push(ProductField::Subcategory);
        }
        if !self.brands.is_empty() && !presence.brand {
            out.push(ProductField::Brand);
        }
        if self.price_range.is_some() && !presence.price {
            out.push(ProductField::Price);
        }
        out
    }

    /// This filter without the constraints the table cannot satisfy.
    pub fn effective(&self, presence: &ColumnPresence) -> ProductFilter {
        let mut f = self.clone();
        for field in self.unsupported_fields(presence) {
            match field {
                ProductField::Category => f.category = CategorySelection::All,
                ProductField::Subcategory => f.subcategories.clear(),
                ProductField::Brand => f.brands.clear(),
                ProductField::Price => f.price_range = None,
                _ => {}
            }
        }
        f
    }

    pub fn matches_category(&self, r: &ProductRecord) -> bool {
        match &self.category {
            CategorySelection::All => true,
            CategorySelection::Only(c) => r.category.as_deref() == Some(c.as_str()),
        }
    }

    pub fn matches_subcategory(&self, r: &ProductRecord) -> bool {
        self.subcategories.is_empty()
            || r
                .subcategory
                .as_ref()
                .is_some_and(|s| self.subcategories.contains(s))
    }

    pub fn matches_brand(&self, r: &ProductRecord) -> bool {
        self.brands.is_empty() || r.brand.as_ref().is_some_and(|b| self.brands.contains(b))
    }

    pub fn matches_price(&self, r: &ProductRecord) -> bool {
        match &self.price_range {
            None => true,
            Some(range) => r.price.is_some_and(|p| range.contains(p)),
        }
    }

    pub fn matches(&self, r: &ProductRecord) -> bool {
        self.matches_category(r)
            && self.matches_subcategory(r)
            && self.matches_brand(r)
            && self.matches_price(r)
    }

    /// Rows of `table` that pass the filter, in source order.
    pub fn apply(&self, table: &ProductTable) -> ProductTable {
        let f = self.effective(&table.presence());
        table.subset(|r| f.matches(r))
    }
}

/// Values a selection control can offer under the current selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    /// Within the selected category.
    pub subcategories: Vec<String>,
    /// Within the selected category and subcategories.
    pub brands: Vec<String>,
    pub price_min: Option<Money>,
    pub price_max: Option<Money>,
}

/// Sorted distinct values, cascading category → subcategory → brand.
pub fn filter_options(table: &ProductTable, filter: &ProductFilter) -> FilterOptions {
    let f = filter.effective(&table.presence());
    let distinct = |pick: &dyn Fn(&ProductRecord) -> Option<&String>,
                    keep: &dyn Fn(&ProductRecord) -> bool| {
        table
            .records
            .iter()
            .filter(|r| keep(r))
            .filter_map(pick)
            .cloned()
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect::<Vec<_>>()
    };

    let categories = distinct(&|r| r.category.as_ref(), &|_| true);
    let subcategories = distinct(&|r| r.subcategory.as_ref(), &|r| f.matches_category(r));
    let brands = distinct(&|r| r.brand.as_ref(), &|r| {
        f.matches_category(r) && f.matches_subcategory(r)
    });

    let prices: Vec<Money> = table.records.iter().filter_map(|r| r.price).collect();
    let price_min = prices.iter().min().copied();
    let price_max = prices.iter().max().copied();

    FilterOptions {
        categories,
        subcategories,
        brands,
        price_min,
        price_max,
    }
}
