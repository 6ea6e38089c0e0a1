use clap::Args;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Instant;

use tiki_monitor_core::analytics::filter_options;
use tiki_monitor_core::config::DashboardConfig;
use tiki_monitor_core::dataset::export::{export_csv_file, export_headers};
use tiki_monitor_core::dataset::schema::ProductField;
use tiki_monitor_core::dataset::synthetic;
use tiki_monitor_core::dataset::LoadReport;
use tiki_monitor_core::metrics::{derive, MetricBasis};
use tiki_monitor_core::with_metadata;

use crate::commands::{FilterArgs, GlobalArgs, Workspace};

#[derive(Args)]
pub struct ExportArgs {
    /// Destination CSV
    #[arg(long, default_value = "tiki_products_filtered.csv")]
    pub out: String,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Args)]
pub struct SampleArgs {
    /// Number of products to generate
    #[arg(long, default_value_t = 200)]
    pub rows: usize,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Destination CSV
    #[arg(long, default_value = "tiki_product_data.csv")]
    pub out: String,
}

#[derive(Serialize)]
struct ColumnEntry {
    field: ProductField,
    header: Option<String>,
    effect_when_missing: Option<&'static str>,
}

#[derive(Serialize)]
struct SchemaReport {
    headers: Vec<String>,
    columns: Vec<ColumnEntry>,
    basis: MetricBasis,
    load: LoadReport,
}

#[derive(Serialize)]
struct WriteReport {
    path: String,
    rows: usize,
    columns: Vec<String>,
}

pub fn run_filters(global: &GlobalArgs, args: FilterArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let filter = args.to_filter();
    filter.validate()?;
    let mut ws = Workspace::open(global, args.top)?;
    let table = ws.table()?;
    let options = filter_options(table, &filter);
    let warnings = table.report.warnings();
    let elapsed = start.elapsed().as_micros() as u64;
    let out = with_metadata(
        "Distinct values per filter, cascading category to subcategory to brand",
        &filter,
        warnings,
        elapsed,
        options,
    );
    Ok(serde_json::to_value(out)?)
}

pub fn run_schema(global: &GlobalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut ws = Workspace::open(global, None)?;
    let table = ws.table()?;
    let presence = table.presence();

    let columns = ProductField::ALL
        .iter()
        .map(|field| ColumnEntry {
            field: *field,
            header: table
                .schema
                .position(*field)
                .and_then(|i| table.headers.get(i))
                .cloned(),
            effect_when_missing: if presence.has(*field) {
                None
            } else {
                Some(field.degradation())
            },
        })
        .collect();

    let report = SchemaReport {
        headers: table.headers.clone(),
        columns,
        basis: MetricBasis::resolve(&presence),
        load: table.report.clone(),
    };
    let warnings = table.report.warnings();
    let elapsed = start.elapsed().as_micros() as u64;
    let out = with_metadata(
        "Header alias resolution and metric basis selection",
        &json!({ "source": report.load.source }),
        warnings,
        elapsed,
        report,
    );
    Ok(serde_json::to_value(out)?)
}

pub fn run_export(global: &GlobalArgs, args: ExportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let filter = args.filter.to_filter();
    let mut ws = Workspace::open(global, args.filter.top)?;
    let analysis = ws.analyze(&filter)?;

    let rows = export_csv_file(&analysis.table, &analysis.derived, Path::new(&args.out))?;
    let report = WriteReport {
        path: args.out.clone(),
        rows,
        columns: export_headers(&analysis.table),
    };
    let elapsed = start.elapsed().as_micros() as u64;
    let out = with_metadata(
        "Filtered source rows with total_sales_per_product and price_range appended",
        &filter,
        analysis.warnings,
        elapsed,
        report,
    );
    Ok(serde_json::to_value(out)?)
}

pub fn run_sample(args: SampleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let config = DashboardConfig::default();
    let table = synthetic::generate(args.rows, args.seed)?;
    let derived = derive(&table, &config);

    let rows = export_csv_file(&table, &derived, Path::new(&args.out))?;
    let report = WriteReport {
        path: args.out.clone(),
        rows,
        columns: export_headers(&table),
    };
    let elapsed = start.elapsed().as_micros() as u64;
    let out = with_metadata(
        "Synthetic product catalogue",
        &json!({ "rows": args.rows, "seed": args.seed }),
        Vec::new(),
        elapsed,
        report,
    );
    Ok(serde_json::to_value(out)?)
}
