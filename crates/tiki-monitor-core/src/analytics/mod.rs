//! Filtering and dashboard aggregation over derived product data.

pub mod filter;
pub mod ranking;
pub mod summary;

pub use filter::{filter_options, CategorySelection, FilterOptions, PriceRange, ProductFilter};
pub use summary::{summarize, Dashboard, KpiSummary, RankBy};
