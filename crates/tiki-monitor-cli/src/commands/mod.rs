pub mod dashboard;
pub mod dataset;

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

use tiki_monitor_core::analytics::{
    CategorySelection, Dashboard, PriceRange, ProductFilter, RankBy,
};
use tiki_monitor_core::config::{DashboardConfig, MissingFilePolicy};
use tiki_monitor_core::dataset::ProductTable;
use tiki_monitor_core::session::{self, Analysis, Session};
use tiki_monitor_core::{ComputationOutput, MonitorResult};

use crate::input;

pub const DEFAULT_INPUT: &str = "tiki_product_data.csv";

/// Flags shared by every subcommand.
pub struct GlobalArgs {
    pub input: Option<String>,
    pub config: Option<String>,
    pub synthesize: bool,
}

#[derive(Args, Clone)]
pub struct FilterArgs {
    /// Keep one category (all categories when omitted)
    #[arg(long)]
    pub category: Option<String>,

    /// Keep these subcategories (repeatable)
    #[arg(long = "subcategory")]
    pub subcategories: Vec<String>,

    /// Keep these brands (repeatable)
    #[arg(long = "brand")]
    pub brands: Vec<String>,

    /// Lowest price kept, inclusive
    #[arg(long)]
    pub min_price: Option<Decimal>,

    /// Highest price kept, inclusive
    #[arg(long)]
    pub max_price: Option<Decimal>,

    /// Rows per ranked table
    #[arg(long)]
    pub top: Option<usize>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> ProductFilter {
        let price_range = if self.min_price.is_some() || self.max_price.is_some() {
            Some(PriceRange {
                min: self.min_price,
                max: self.max_price,
            })
        } else {
            None
        };
        ProductFilter {
            category: match &self.category {
                Some(c) => CategorySelection::Only(c.clone()),
                None => CategorySelection::All,
            },
            subcategories: self.subcategories.clone(),
            brands: self.brands.clone(),
            price_range,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RankArg {
    Revenue,
    Quantity,
}

impl From<RankArg> for RankBy {
    fn from(r: RankArg) -> Self {
        match r {
            RankArg::Revenue => RankBy::Revenue,
            RankArg::Quantity => RankBy::Quantity,
        }
    }
}

#[derive(Args)]
pub struct ProductsArgs {
    /// Ranking metric
    #[arg(long, value_enum, default_value = "revenue")]
    pub by: RankArg,

    #[command(flatten)]
    pub filter: FilterArgs,
}

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

enum TableSource {
    Path(PathBuf),
    Piped(ProductTable),
}

/// A session plus the table this invocation reads.
pub struct Workspace {
    session: Session,
    source: TableSource,
}

impl Workspace {
    /// Resolve configuration and input. `top` overrides every ranked
    /// table's length.
    pub fn open(global: &GlobalArgs, top: Option<usize>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config: DashboardConfig = match &global.config {
            Some(path) => input::file::read_config(path)?,
            None => DashboardConfig::default(),
        };
        if global.synthesize {
            config.missing_file = MissingFilePolicy::Synthesize;
        }
        if let Some(n) = top {
            config.top_n.brands = n;
            config.top_n.subcategories = n;
            config.top_n.subcategory_distribution = n;
            config.top_n.products = n;
        }

        let source = match &global.input {
            Some(path) => TableSource::Path(input::file::resolve_input(path)?),
            None => match input::stdin::read_stdin_table()? {
                Some(table) => TableSource::Piped(table),
                None => TableSource::Path(input::file::resolve_input(DEFAULT_INPUT)?),
            },
        };

        Ok(Self {
            session: Session::new(config)?,
            source,
        })
    }

    pub fn table(&mut self) -> MonitorResult<&ProductTable> {
        match &self.source {
            TableSource::Path(path) => self.session.table(path),
            TableSource::Piped(table) => Ok(table),
        }
    }

    pub fn analyze(&mut self, filter: &ProductFilter) -> MonitorResult<Analysis> {
        match &self.source {
            TableSource::Path(path) => self.session.analyze(path, filter),
            TableSource::Piped(table) => session::analyze(table, filter, self.session.config()),
        }
    }

    pub fn dashboard(
        &mut self,
        filter: &ProductFilter,
    ) -> MonitorResult<ComputationOutput<Dashboard>> {
        match &self.source {
            TableSource::Path(path) => self.session.dashboard(path, filter),
            TableSource::Piped(table) => {
                session::dashboard_for(table, filter, self.session.config())
            }
        }
    }
}
