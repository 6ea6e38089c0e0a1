//! CSV export of a (filtered) product table.
//!
//! Source columns are written back as read. Derived columns follow:
//! `total_sales_per_product` (unless the source already has it),
//! `price_range` and the per-row metrics. A source column named like a
//! derived one is overwritten in place.

use rust_decimal::Decimal;
use std::io::Write;
use std::path::Path;

use crate::dataset::schema::ProductField;
use crate::dataset::ProductTable;
use crate::metrics::{DerivedDataset, DerivedProduct};
use crate::MonitorResult;

pub const PRICE_RANGE_COLUMN: &str = "price_range";

/// Per-row metric columns, in export order.
pub const METRIC_COLUMNS: [&str; 7] = [
    "price_z_score",
    "value_score",
    "clv_proxy",
    "inventory_turnover",
    "satisfaction_index",
    "repeat_purchase_probability",
    "category_market_share",
];

const EXPORT_DP: u32 = 4;

fn cell(v: Decimal) -> String {
    v.round_dp(EXPORT_DP).normalize().to_string()
}

fn metric_cells(p: &DerivedProduct) -> [String; 7] {
    [
        cell(p.price_z_score),
        p.value_score.map(cell).unwrap_or_default(),
        cell(p.clv_proxy),
        cell(p.inventory_turnover),
        cell(p.satisfaction_index),
        cell(p.repeat_purchase_probability),
        cell(p.category_market_share),
    ]
}

fn source_position(table: &ProductTable, name: &str) -> Option<usize> {
    table
        .headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

/// Derived column names that are not already source columns.
fn appended_columns(table: &ProductTable) -> Vec<&'static str> {
    let mut out = Vec::new();
    if !table.presence().reported_revenue {
        out.push(ProductField::ReportedRevenue.canonical());
    }
    out.extend(
        std::iter::once(PRICE_RANGE_COLUMN)
            .chain(METRIC_COLUMNS)
            .filter(|name| source_position(table, name).is_none()),
    );
    out
}

/// Header row of an export of `table`.
pub fn export_headers(table: &ProductTable) -> Vec<String> {
    let mut headers = table.headers.clone();
    headers.extend(appended_columns(table).into_iter().map(String::from));
    headers
}

/// Write `table` with its derived columns. `derived` must have been
/// computed from `table`. Returns the number of data rows written.
pub fn export_csv<W: Write>(
    table: &ProductTable,
    derived: &DerivedDataset,
    writer: W,
) -> MonitorResult<usize> {
    let headers = export_headers(table);
    let add_revenue = !table.presence().reported_revenue;

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&headers)?;

    for (record, product) in table.records.iter().zip(derived.products.iter()) {
        let mut row = record.cells.clone();
        if add_revenue {
            row.push(cell(product.revenue));
        }
        let range = derived.tier_label(product).unwrap_or_default().to_string();
        let values = std::iter::once((PRICE_RANGE_COLUMN, range))
            .chain(METRIC_COLUMNS.into_iter().zip(metric_cells(product)));
        for (name, value) in values {
            match source_position(table, name).and_then(|idx| row.get_mut(idx)) {
                Some(existing) => *existing = value,
                None => row.push(value),
            }
        }
        wtr.write_record(&row)?;
    }
    wtr.flush()?;

    log::debug!("exported {} rows, {} columns", table.len(), headers.len());
    Ok(table.len())
}

/// Export to a file, creating or truncating it.
pub fn export_csv_file(
    table: &ProductTable,
    derived: &DerivedDataset,
    path: &Path,
) -> MonitorResult<usize> {
    let file = std::fs::File::create(path)?;
    let rows = export_csv(table, derived, std::io::BufWriter::new(file))?;
    log::info!("Wrote {} rows to {}", rows, path.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::dataset::loader::load_products;
    use crate::metrics::derive;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn export(csv: &str) -> (Vec<String>, Vec<HashMap<String, String>>) {
        let table = load_products(csv.as_bytes()).unwrap();
        let derived = derive(&table, &DashboardConfig::default());
        let mut out = Vec::new();
        export_csv(&table, &derived, &mut out).unwrap();

        let mut rdr = csv::Reader::from_reader(out.as_slice());
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        let rows = rdr
            .records()
            .map(|r| {
                headers
                    .iter()
                    .cloned()
                    .zip(r.unwrap().iter().map(String::from))
                    .collect()
            })
            .collect();
        (headers, rows)
    }

    #[test]
    fn test_adds_revenue_and_price_range() {
        let (headers, rows) =
            export("Brand_Name,price,quantity_sold,seller\nA,2000000,3,shop1\nB,,1,shop2\n");
        assert_eq!(
            headers[..6],
            [
                "Brand_Name",
                "price",
                "quantity_sold",
                "seller",
                "total_sales_per_product",
                "price_range"
            ]
        );
        assert_eq!(headers[6..], METRIC_COLUMNS);
        assert_eq!(rows[0]["seller"], "shop1");
        assert_eq!(rows[0]["total_sales_per_product"], "6000000");
        assert_eq!(rows[0]["price_range"], "1-5M");
        assert_eq!(rows[1]["total_sales_per_product"], "0");
        assert_eq!(rows[1]["price_range"], "");
    }

    #[test]
    fn test_keeps_reported_revenue_column() {
        let (headers, rows) = export("price,quantity_sold,total_sales_per_product\n500000,2,7\n");
        assert_eq!(
            headers
                .iter()
                .filter(|h| *h == "total_sales_per_product")
                .count(),
            1
        );
        assert_eq!(rows[0]["total_sales_per_product"], "7");
        assert_eq!(rows[0]["price_range"], "0-1M");
    }

    #[test]
    fn test_existing_derived_columns_are_replaced() {
        let (headers, rows) = export("price,price_range,clv_proxy\n30000000,stale,stale\n");
        assert_eq!(headers.iter().filter(|h| *h == "price_range").count(), 1);
        assert_eq!(headers.iter().filter(|h| *h == "clv_proxy").count(), 1);
        assert_eq!(rows[0]["price_range"], "20-50M");
        assert_eq!(rows[0]["clv_proxy"], "0");
    }

    #[test]
    fn test_writes_per_row_metrics() {
        let (_, rows) = export(
            "category_name,price,quantity_sold,rating_average,review_count,discount_rate\n\
             A,1000000,99,4,9,10\n\
             A,3000000,1,5,0,20\n",
        );
        let first = &rows[0];
        // 1,000,000 * (99 / 10) * 4 * 0.3
        assert_eq!(first["clv_proxy"], "11880000");
        assert_eq!(first["inventory_turnover"], "9.9");
        assert_eq!(first["satisfaction_index"], "80");
        // 4 / 1M VND * 100
        assert_eq!(first["value_score"], "400");
        // 0.7 * 0.8 + 0.3 * 0.5
        assert_eq!(first["repeat_purchase_probability"], "0.71");
        // 99M of 102M
        assert_eq!(first["category_market_share"], "0.9706");
        assert_eq!(first["price_z_score"], "-0.7071");
        assert_eq!(rows[1]["price_z_score"], "0.7071");
    }
}
