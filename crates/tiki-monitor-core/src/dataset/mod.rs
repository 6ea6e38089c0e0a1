//! Product tables: loading, schema resolution, synthetic demo data, export.

pub mod export;
pub mod loader;
pub mod schema;
#[cfg(feature = "synthetic")]
pub mod synthetic;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};
use schema::{ColumnPresence, ColumnSchema, ProductField};

/// One product row after type coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Zero-based position in the source table.
    pub row: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub price: Option<Money>,
    /// Missing or unparseable quantities are zero.
    pub quantity_sold: Decimal,
    /// Average star rating in [0, 5].
    pub rating: Option<Decimal>,
    pub review_count: Option<Decimal>,
    /// Discount as given in the source (fraction or percent; only relative
    /// magnitude is used downstream).
    pub discount_rate: Option<Rate>,
    /// Pre-computed revenue; takes precedence over price × quantity.
    pub reported_revenue: Option<Money>,
    /// Source cell text, in header order, for export.
    #[serde(skip)]
    pub cells: Vec<String>,
}

/// Where a table came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    File { path: String },
    Reader,
    Synthetic { rows: usize, seed: Option<u64> },
}

/// Cells that could not be used as read and were coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionCount {
    pub field: ProductField,
    pub cells: usize,
}

/// Summary of what the loader saw and changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub source: DataSource,
    pub rows: usize,
    pub columns: ColumnPresence,
    pub coerced: Vec<CoercionCount>,
}

impl LoadReport {
    /// Human-readable notes for the output envelope.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let DataSource::Synthetic { rows, .. } = &self.source {
            out.push(format!(
                "Input file not found; showing {rows} rows of synthetic demo data"
            ));
        }
        for field in self.columns.missing() {
            out.push(format!(
                "Column '{}' not found: {}",
                field.canonical(),
                field.degradation()
            ));
        }
        for c in &self.coerced {
            out.push(format!(
                "{} '{}' value(s) were unparseable or out of range and treated as missing",
                c.cells,
                c.field.canonical()
            ));
        }
        out
    }
}

/// A loaded product table.
#[derive(Debug, Clone)]
pub struct ProductTable {
    pub headers: Vec<String>,
    pub schema: ColumnSchema,
    pub records: Vec<ProductRecord>,
    pub report: LoadReport,
}

impl ProductTable {
    pub fn presence(&self) -> ColumnPresence {
        self.schema.presence()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// A copy holding only the records that satisfy `keep`, in source order.
    pub fn subset(&self, mut keep: impl FnMut(&ProductRecord) -> bool) -> ProductTable {
        ProductTable {
            headers: self.headers.clone(),
            schema: self.schema.clone(),
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
            report: self.report.clone(),
        }
    }
}
