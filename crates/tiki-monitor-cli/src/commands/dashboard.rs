use serde::Serialize;
use serde_json::{json, Value};

use tiki_monitor_core::analytics::{Dashboard, RankBy};
use tiki_monitor_core::ComputationOutput;

use crate::commands::{FilterArgs, GlobalArgs, ProductsArgs, Workspace};

/// Re-wrap a dashboard envelope around one slice of its result.
fn envelope<T: Serialize>(
    out: ComputationOutput<Dashboard>,
    pick: impl FnOnce(Dashboard) -> T,
) -> Result<Value, Box<dyn std::error::Error>> {
    let ComputationOutput {
        result,
        methodology,
        assumptions,
        warnings,
        metadata,
    } = out;
    let reshaped = ComputationOutput {
        result: pick(result),
        methodology,
        assumptions,
        warnings,
        metadata,
    };
    Ok(serde_json::to_value(reshaped)?)
}

fn run_section<T: Serialize>(
    global: &GlobalArgs,
    args: &FilterArgs,
    pick: impl FnOnce(Dashboard) -> T,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut ws = Workspace::open(global, args.top)?;
    let out = ws.dashboard(&args.to_filter())?;
    envelope(out, pick)
}

pub fn run_dashboard(global: &GlobalArgs, args: FilterArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_section(global, &args, |d| d)
}

pub fn run_kpis(global: &GlobalArgs, args: FilterArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_section(global, &args, |d| d.kpis)
}

pub fn run_brands(global: &GlobalArgs, args: FilterArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_section(global, &args, |d| {
        json!({
            "hhi": d.kpis.hhi,
            "market_structure": d.kpis.market_structure,
            "top_brands": d.top_brands,
            "brand_equity": d.brand_equity,
        })
    })
}

pub fn run_subcategories(
    global: &GlobalArgs,
    args: FilterArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    run_section(global, &args, |d| {
        json!({
            "top_subcategories": d.top_subcategories,
            "subcategory_distribution": d.subcategory_distribution,
        })
    })
}

pub fn run_products(global: &GlobalArgs, args: ProductsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let by: RankBy = args.by.into();
    run_section(global, &args.filter, |d| {
        let products = match by {
            RankBy::Revenue => d.top_products_by_revenue,
            RankBy::Quantity => d.top_products_by_quantity,
        };
        json!({ "by": by, "products": products })
    })
}

pub fn run_tiers(global: &GlobalArgs, args: FilterArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_section(global, &args, |d| json!({ "tier_volumes": d.tier_volumes }))
}

pub fn run_distributions(
    global: &GlobalArgs,
    args: FilterArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    run_section(global, &args, |d| {
        json!({
            "rating_histogram": d.rating_histogram,
            "price_histogram": d.price_histogram,
            "price_vs_quantity": d.price_vs_quantity,
            "discount_vs_quantity": d.discount_vs_quantity,
        })
    })
}
