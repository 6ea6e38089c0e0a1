mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::dataset::{ExportArgs, SampleArgs};
use commands::{FilterArgs, GlobalArgs, ProductsArgs};

/// Snapshot analytics for marketplace product catalogs
#[derive(Parser)]
#[command(
    name = "tikimon",
    version,
    about = "Snapshot analytics for marketplace product catalogs",
    long_about = "Loads a product CSV, derives revenue, customer and concentration \
                  metrics, and prints the KPIs, rankings and distributions a \
                  market dashboard shows. Filters narrow every section."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Product CSV (stdin when omitted and piped, else tiki_product_data.csv)
    #[arg(long, global = true)]
    input: Option<String>,

    /// Dashboard configuration file (.yaml, .yml or .json)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Generate demo data when the input file does not exist
    #[arg(long, global = true)]
    synthesize: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Every dashboard section
    Dashboard(FilterArgs),
    /// Headline KPIs
    Kpis(FilterArgs),
    /// Top brands by revenue and brand equity scores
    Brands(FilterArgs),
    /// Top subcategories by revenue and by product count
    Subcategories(FilterArgs),
    /// Top products by revenue or quantity
    Products(ProductsArgs),
    /// Quantity and revenue per price tier
    Tiers(FilterArgs),
    /// Rating and price histograms plus scatter samples
    Distributions(FilterArgs),
    /// Values available to each filter under the current selection
    Filters(FilterArgs),
    /// Recognised columns and how each metric will be computed
    Schema,
    /// Write the filtered table with derived columns to CSV
    Export(ExportArgs),
    /// Write a synthetic demo dataset to CSV
    Sample(SampleArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let global = GlobalArgs {
        input: cli.input,
        config: cli.config,
        synthesize: cli.synthesize,
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Dashboard(args) => commands::dashboard::run_dashboard(&global, args),
        Commands::Kpis(args) => commands::dashboard::run_kpis(&global, args),
        Commands::Brands(args) => commands::dashboard::run_brands(&global, args),
        Commands::Subcategories(args) => commands::dashboard::run_subcategories(&global, args),
        Commands::Products(args) => commands::dashboard::run_products(&global, args),
        Commands::Tiers(args) => commands::dashboard::run_tiers(&global, args),
        Commands::Distributions(args) => commands::dashboard::run_distributions(&global, args),
        Commands::Filters(args) => commands::dataset::run_filters(&global, args),
        Commands::Schema => commands::dataset::run_schema(&global),
        Commands::Export(args) => commands::dataset::run_export(&global, args),
        Commands::Sample(args) => commands::dataset::run_sample(args),
        Commands::Version => {
            println!("tikimon {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
