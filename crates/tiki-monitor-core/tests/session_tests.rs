use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tiki_monitor_core::analytics::ProductFilter;
use tiki_monitor_core::config::{DashboardConfig, MissingFilePolicy};
use tiki_monitor_core::dataset::export::export_csv_file;
use tiki_monitor_core::dataset::DataSource;
use tiki_monitor_core::session::Session;
use tiki_monitor_core::MonitorError;

fn write_csv(path: &Path, body: &str) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(body.as_bytes()).unwrap();
}

fn touch(path: &Path, offset_secs: u64) {
    let f = fs::File::options().write(true).open(path).unwrap();
    f.set_modified(SystemTime::now() + Duration::from_secs(offset_secs))
        .unwrap();
}

// ===========================================================================
// Cache
// ===========================================================================

#[test]
fn test_second_request_hits_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.csv");
    write_csv(&path, "brand_name,price,quantity_sold\nA,100,1\n");

    let mut session = Session::default();
    session.dashboard(&path, &ProductFilter::default()).unwrap();
    session.dashboard(&path, &ProductFilter::default()).unwrap();

    assert_eq!(session.cache().misses(), 1);
    assert_eq!(session.cache().hits(), 1);
}

#[test]
fn test_modified_file_is_reloaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.csv");
    write_csv(&path, "brand_name,price,quantity_sold\nA,100,1\n");

    let mut session = Session::default();
    let first = session.dashboard(&path, &ProductFilter::default()).unwrap();
    assert_eq!(first.result.kpis.total_revenue, dec!(100));

    write_csv(&path, "brand_name,price,quantity_sold\nA,100,1\nB,50,2\n");
    touch(&path, 60);

    let second = session.dashboard(&path, &ProductFilter::default()).unwrap();
    assert_eq!(second.result.kpis.total_revenue, dec!(200));
    assert_eq!(session.cache().misses(), 2);
    assert_eq!(session.cache().len(), 1);
}

#[test]
fn test_deleted_file_is_evicted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.csv");
    write_csv(&path, "price,quantity_sold\n1,1\n");

    let mut session = Session::default();
    session.table(&path).unwrap();
    assert_eq!(session.cache().len(), 1);

    fs::remove_file(&path).unwrap();
    let err = session.table(&path).unwrap_err();
    assert!(matches!(err, MonitorError::DataNotFound { .. }));
    assert!(session.cache().is_empty());
}

#[test]
fn test_distinct_paths_cached_separately() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.csv");
    let b = dir.path().join("b.csv");
    write_csv(&a, "price,quantity_sold\n1,1\n");
    write_csv(&b, "price,quantity_sold\n2,1\n");

    let mut session = Session::default();
    session.table(&a).unwrap();
    session.table(&b).unwrap();
    session.table(&a).unwrap();
    assert_eq!(session.cache().len(), 2);
    assert_eq!(session.cache().hits(), 1);
}

// ===========================================================================
// Missing file policy
// ===========================================================================

#[test]
fn test_strict_policy_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.csv");
    let mut session = Session::default();
    let err = session
        .dashboard(&path, &ProductFilter::default())
        .unwrap_err();
    assert!(matches!(err, MonitorError::DataNotFound { .. }));
}

#[test]
fn test_synthesize_policy_warns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.csv");
    let config = DashboardConfig {
        missing_file: MissingFilePolicy::Synthesize,
        synthetic_rows: 50,
        synthetic_seed: Some(7),
        ..Default::default()
    };
    let mut session = Session::new(config).unwrap();
    let out = session.dashboard(&path, &ProductFilter::default()).unwrap();

    assert_eq!(out.result.kpis.products, 50);
    assert!(out.warnings[0].contains("synthetic demo data"));
    let table = session.table(&path).unwrap();
    assert_eq!(
        table.report.source,
        DataSource::Synthetic {
            rows: 50,
            seed: Some(7)
        }
    );
}

// ===========================================================================
// Export
// ===========================================================================

#[test]
fn test_export_filtered_rows() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("products.csv");
    let output = dir.path().join("filtered.csv");
    write_csv(
        &input,
        "id,brand_name,price,quantity_sold\n1,A,2000000,2\n2,B,60000000,1\n3,A,900000,5\n",
    );

    let filter = ProductFilter {
        brands: vec!["A".into()],
        ..Default::default()
    };
    let mut session = Session::default();
    let analysis = session.analyze(&input, &filter).unwrap();
    let rows = export_csv_file(&analysis.table, &analysis.derived, &output).unwrap();
    assert_eq!(rows, 2);

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(
        written,
        "id,brand_name,price,quantity_sold,total_sales_per_product,price_range,\
         price_z_score,value_score,clv_proxy,inventory_turnover,satisfaction_index,\
         repeat_purchase_probability,category_market_share\n\
         1,A,2000000,2,4000000,1-5M,0.7071,,0,1,70,0.3,0.4706\n\
         3,A,900000,5,4500000,0-1M,-0.7071,,0,1,70,0.3,0.5294\n"
    );
}
