//! CSV product table loader.
//!
//! Recognised columns are listed in [`ProductField`]; any other column is
//! carried through to export untouched. Numeric cells that fail to parse,
//! or fall outside their valid range, become missing instead of failing
//! the load.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::config::{DashboardConfig, MissingFilePolicy};
use crate::dataset::schema::{ColumnSchema, ProductField};
use crate::dataset::{CoercionCount, DataSource, LoadReport, ProductRecord, ProductTable};
use crate::error::MonitorError;
use crate::MonitorResult;

/// Load a product table from any CSV reader.
pub fn load_products<R: Read>(reader: R) -> MonitorResult<ProductTable> {
    read_table(reader, DataSource::Reader)
}

/// Load a product table from a CSV file, applying the missing-file policy.
pub fn load_products_file(path: &Path, config: &DashboardConfig) -> MonitorResult<ProductTable> {
    if !path.is_file() {
        return match config.missing_file {
            MissingFilePolicy::Strict => Err(MonitorError::DataNotFound {
                path: path.display().to_string(),
            }),
            MissingFilePolicy::Synthesize => synthesize_for(path, config),
        };
    }

    let file = std::fs::File::open(path)?;
    let table = read_table(
        file,
        DataSource::File {
            path: path.display().to_string(),
        },
    )?;
    log::info!(
        "Loaded {} product rows from {}",
        table.len(),
        path.display()
    );
    Ok(table)
}

#[cfg(feature = "synthetic")]
fn synthesize_for(path: &Path, config: &DashboardConfig) -> MonitorResult<ProductTable> {
    log::warn!(
        "{} does not exist; generating {} synthetic rows",
        path.display(),
        config.synthetic_rows
    );
    crate::dataset::synthetic::generate(config.synthetic_rows, config.synthetic_seed)
}

#[cfg(not(feature = "synthetic"))]
fn synthesize_for(path: &Path, _config: &DashboardConfig) -> MonitorResult<ProductTable> {
    Err(MonitorError::ConfigError(format!(
        "{} does not exist and synthetic data support is not compiled in",
        path.display()
    )))
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn read_table<R: Read>(reader: R, source: DataSource) -> MonitorResult<ProductTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(String::from).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(MonitorError::EmptyTable("no header row".into()));
    }

    let schema = ColumnSchema::resolve(&headers);
    let mut coercions = Coercions::default();
    let mut records = Vec::new();

    for (row, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| {
            MonitorError::MalformedTable(format!("CSV parse error at line {}: {}", row + 2, e))
        })?;
        let cells: Vec<String> = record.iter().map(String::from).collect();
        records.push(parse_record(row, cells, &schema, &mut coercions));
    }

    if records.is_empty() {
        return Err(MonitorError::EmptyTable("no data rows".into()));
    }

    let report = LoadReport {
        source,
        rows: records.len(),
        columns: schema.presence(),
        coerced: coercions.into_counts(),
    };
    for field in report.columns.missing() {
        log::debug!("column '{}' absent: {}", field, field.degradation());
    }

    Ok(ProductTable {
        headers,
        schema,
        records,
        report,
    })
}

fn parse_record(
    row: usize,
    cells: Vec<String>,
    schema: &ColumnSchema,
    coercions: &mut Coercions,
) -> ProductRecord {
    let cell = |field: ProductField| {
        schema
            .position(field)
            .and_then(|idx| cells.get(idx))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    };
    let text = |field: ProductField| cell(field).map(String::from);

    let mut number = |field: ProductField, valid: fn(Decimal) -> bool| -> Option<Decimal> {
        let raw = cell(field)?;
        match parse_decimal(raw) {
            Some(v) if valid(v) => Some(v),
            _ => {
                coercions.bump(field);
                None
            }
        }
    };

    let price = number(ProductField::Price, non_negative);
    let quantity_sold = number(ProductField::QuantitySold, non_negative).unwrap_or(Decimal::ZERO);
    let rating = number(ProductField::Rating, |v| v >= Decimal::ZERO && v <= dec!(5));
    let review_count = number(ProductField::ReviewCount, non_negative);
    let discount_rate = number(ProductField::DiscountRate, non_negative);
    let reported_revenue = number(ProductField::ReportedRevenue, non_negative);

    let id = text(ProductField::Id);
    let name = text(ProductField::Name);
    let brand = text(ProductField::Brand);
    let category = text(ProductField::Category);
    let subcategory = text(ProductField::Subcategory);

    ProductRecord {
        row,
        id,
        name,
        brand,
        category,
        subcategory,
        price,
        quantity_sold,
        rating,
        review_count,
        discount_rate,
        reported_revenue,
        cells,
    }
}

fn non_negative(v: Decimal) -> bool {
    v >= Decimal::ZERO
}

/// Parse plain or scientific notation; `nan`/`null`-style markers are missing.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    match s.to_ascii_lowercase().as_str() {
        "nan" | "null" | "none" | "na" | "n/a" | "-" => return None,
        _ => {}
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

#[derive(Default)]
struct Coercions {
    counts: Vec<CoercionCount>,
}

impl Coercions {
    fn bump(&mut self, field: ProductField) {
        match self.counts.iter_mut().find(|c| c.field == field) {
            Some(c) => c.cells += 1,
            None => self.counts.push(CoercionCount { field, cells: 1 }),
        }
    }

    fn into_counts(self) -> Vec<CoercionCount> {
        self.counts
    }
}
