//! Request pipeline: load (cached) → filter → derive → summarize.
//!
//! Only the raw table is cached. Every request filters and derives from
//! scratch, so results never depend on earlier requests.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use crate::analytics::filter::{filter_options, FilterOptions, ProductFilter};
use crate::analytics::summary::{summarize, Dashboard};
use crate::config::DashboardConfig;
use crate::dataset::loader::load_products_file;
use crate::dataset::ProductTable;
use crate::metrics::{derive, DerivedDataset};
use crate::types::{with_metadata, ComputationOutput};
use crate::MonitorResult;

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

struct CachedTable {
    modified: Option<SystemTime>,
    table: ProductTable,
}

/// Raw tables keyed by path and modification time.
#[derive(Default)]
pub struct TableCache {
    entries: HashMap<PathBuf, CachedTable>,
    hits: usize,
    misses: usize,
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl TableCache {
    /// The cached table for `path`, reloading when the file's mtime moved.
    pub fn get_or_load(
        &mut self,
        path: &Path,
        config: &DashboardConfig,
    ) -> MonitorResult<&ProductTable> {
        let modified = modified_time(path);
        let fresh = self
            .entries
            .get(path)
            .is_some_and(|c| c.modified == modified);

        if fresh {
            self.hits += 1;
            log::debug!("table cache hit for {}", path.display());
        } else {
            self.misses += 1;
            let table = match load_products_file(path, config) {
                Ok(table) => table,
                Err(e) => {
                    self.entries.remove(path);
                    return Err(e);
                }
            };
            self.entries
                .insert(path.to_path_buf(), CachedTable { modified, table });
        }

        self.entries
            .get(path)
            .map(|c| &c.table)
            .ok_or_else(|| crate::MonitorError::DataNotFound {
                path: path.display().to_string(),
            })
    }

    pub fn invalidate(&mut self, path: &Path) {
        self.entries.remove(path);
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// A filtered table and its derived metrics.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub table: ProductTable,
    pub derived: DerivedDataset,
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
struct Assumptions<'a> {
    filter: &'a ProductFilter,
    config: &'a DashboardConfig,
}

/// Filter `table` and derive metrics over the rows that remain.
pub fn analyze(
    table: &ProductTable,
    filter: &ProductFilter,
    config: &DashboardConfig,
) -> MonitorResult<Analysis> {
    filter.validate()?;

    let mut warnings = table.report.warnings();
    for field in filter.unsupported_fields(&table.presence()) {
        warnings.push(format!(
            "Filter on '{}' ignored: column not present",
            field.canonical()
        ));
    }

    let filtered = filter.apply(table);
    if filtered.is_empty() {
        log::info!("filter selected 0 of {} rows", table.len());
        warnings.push("No products match the current filters".to_string());
    }

    let derived = derive(&filtered, config);
    if derived.metrics.capped_revenue_rows > 0 {
        warnings.push(format!(
            "{} rows exceed the revenue range; their revenue is capped",
            derived.metrics.capped_revenue_rows
        ));
    }
    for (metric, basis) in derived.basis.degraded() {
        warnings.push(format!("{metric} uses the {basis} formula"));
    }

    Ok(Analysis {
        table: filtered,
        derived,
        warnings,
    })
}

/// Run the whole pipeline over an already loaded table.
pub fn dashboard_for(
    table: &ProductTable,
    filter: &ProductFilter,
    config: &DashboardConfig,
) -> MonitorResult<ComputationOutput<Dashboard>> {
    let start = Instant::now();
    let analysis = analyze(table, filter, config)?;
    let dashboard = summarize(&analysis.table, &analysis.derived, filter, config);
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Product dashboard: filter, per-row derivation, grouped aggregation",
        &Assumptions { filter, config },
        analysis.warnings,
        elapsed,
        dashboard,
    ))
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Owns the configuration and the table cache for a run of requests.
#[derive(Default)]
pub struct Session {
    config: DashboardConfig,
    cache: TableCache,
}

impl Session {
    pub fn new(config: DashboardConfig) -> MonitorResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cache: TableCache::default(),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn cache(&self) -> &TableCache {
        &self.cache
    }

    /// The unfiltered table at `path`.
    pub fn table(&mut self, path: &Path) -> MonitorResult<&ProductTable> {
        self.cache.get_or_load(path, &self.config)
    }

    pub fn analyze(&mut self, path: &Path, filter: &ProductFilter) -> MonitorResult<Analysis> {
        let table = self.cache.get_or_load(path, &self.config)?;
        analyze(table, filter, &self.config)
    }

    pub fn dashboard(
        &mut self,
        path: &Path,
        filter: &ProductFilter,
    ) -> MonitorResult<ComputationOutput<Dashboard>> {
        let table = self.cache.get_or_load(path, &self.config)?;
        dashboard_for(table, filter, &self.config)
    }

    pub fn filter_options(
        &mut self,
        path: &Path,
        filter: &ProductFilter,
    ) -> MonitorResult<FilterOptions> {
        let table = self.cache.get_or_load(path, &self.config)?;
        Ok(filter_options(table, filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::filter::CategorySelection;
    use crate::dataset::loader::load_products;

    const CSV: &str = "brand_name,category_name,price,quantity_sold\nA,X,100,1\nB,Y,200,2\n";

    #[test]
    fn test_filter_on_absent_column_warns() {
        let table = load_products("price,quantity_sold\n1,1\n".as_bytes()).unwrap();
        let filter = ProductFilter {
            brands: vec!["A".into()],
            ..Default::default()
        };
        let a = analyze(&table, &filter, &DashboardConfig::default()).unwrap();
        assert_eq!(a.table.len(), 1);
        assert!(a.warnings.iter().any(|w| w.contains("'brand_name' ignored")));
    }

    #[test]
    fn test_degradations_reported() {
        let table = load_products(CSV.as_bytes()).unwrap();
        let out = dashboard_for(&table, &ProductFilter::default(), &DashboardConfig::default())
            .unwrap();
        assert!(out.warnings.iter().any(|w| w.starts_with("nps uses the fallback")));
        assert_eq!(out.result.kpis.products, 2);
    }

    #[test]
    fn test_empty_selection_warns() {
        let table = load_products(CSV.as_bytes()).unwrap();
        let filter = ProductFilter {
            category: CategorySelection::Only("Z".into()),
            ..Default::default()
        };
        let out = dashboard_for(&table, &filter, &DashboardConfig::default()).unwrap();
        assert!(out
            .warnings
            .contains(&"No products match the current filters".to_string()));
        assert_eq!(out.result.kpis.products, 0);
    }

    #[test]
    fn test_missing_file_is_not_cached() {
        let mut session = Session::default();
        let path = Path::new("/nonexistent/products.csv");
        assert!(session.table(path).is_err());
        assert!(session.cache().is_empty());
        assert_eq!(session.cache().misses(), 1);
    }
}
