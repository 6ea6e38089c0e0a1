//! Dashboard sections over a filtered, derived table.
//!
//! Every section is a plain data structure; a section with nothing in it
//! is returned empty and named in [`Dashboard::no_data`].

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analytics::filter::ProductFilter;
use crate::analytics::ranking::{group_totals, Contribution, GroupTotal, TopK};
use crate::config::DashboardConfig;
use crate::dataset::ProductTable;
use crate::metrics::brand_equity::BrandAggregate;
use crate::metrics::concentration::MarketStructure;
use crate::metrics::{DerivedDataset, MetricBasis};
use crate::stats::{mean, saturating_sum};
use crate::types::{Money, Rate, Score};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Headline scalars. All zero for an empty table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub products: usize,
    pub total_quantity: Decimal,
    pub total_revenue: Money,
    pub avg_price: Money,
    pub avg_rating: Decimal,
    pub nps: Score,
    pub satisfaction_index: Score,
    pub avg_clv: Money,
    pub brand_equity: Score,
    pub hhi: Decimal,
    pub market_structure: Option<MarketStructure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    Revenue,
    Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRank {
    pub row: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub price: Option<Money>,
    pub price_range: Option<String>,
    pub quantity_sold: Decimal,
    pub revenue: Money,
    pub price_z_score: Decimal,
    pub value_score: Option<Decimal>,
    pub clv_proxy: Money,
    pub inventory_turnover: Decimal,
    pub satisfaction_index: Score,
    pub repeat_purchase_probability: Rate,
    pub category_market_share: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierVolume {
    pub label: String,
    pub lower: Money,
    pub upper: Option<Money>,
    pub products: usize,
    pub quantity: Decimal,
    pub revenue: Money,
}

/// Equal-width bin; the last bin is closed on the right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: Decimal,
    pub upper: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub row: usize,
    pub x: Decimal,
    pub y: Decimal,
}

/// Everything the dashboard renders for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub kpis: KpiSummary,
    pub top_brands: Vec<GroupTotal>,
    pub top_subcategories: Vec<GroupTotal>,
    pub subcategory_distribution: Vec<GroupTotal>,
    pub top_products_by_revenue: Vec<ProductRank>,
    pub top_products_by_quantity: Vec<ProductRank>,
    /// Sorted by equity score.
    pub brand_equity: Vec<BrandAggregate>,
    pub tier_volumes: Vec<TierVolume>,
    pub rating_histogram: Vec<HistogramBin>,
    pub price_histogram: Vec<HistogramBin>,
    pub price_vs_quantity: Vec<ScatterPoint>,
    pub discount_vs_quantity: Vec<ScatterPoint>,
    pub basis: MetricBasis,
    /// Sections with nothing to show.
    pub no_data: Vec<String>,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Build every section. `table` and `derived` must come from the same
/// filtered table.
pub fn summarize(
    table: &ProductTable,
    derived: &DerivedDataset,
    filter: &ProductFilter,
    config: &DashboardConfig,
) -> Dashboard {
    let top = &config.top_n;
    let mut brand_equity = derived.brands.clone();
    brand_equity.sort_by(|a, b| b.equity_score.cmp(&a.equity_score));

    let dashboard = Dashboard {
        kpis: kpi_summary(table, derived),
        top_brands: top_brands(table, derived, filter, top.brands),
        top_subcategories: top_subcategories(table, derived, top.subcategories),
        subcategory_distribution: subcategory_distribution(
            table,
            derived,
            top.subcategory_distribution,
        ),
        top_products_by_revenue: top_products(table, derived, RankBy::Revenue, top.products),
        top_products_by_quantity: top_products(table, derived, RankBy::Quantity, top.products),
        brand_equity,
        tier_volumes: tier_volumes(table, derived),
        rating_histogram: rating_histogram(table, config.rating_bins),
        price_histogram: price_histogram(table, config.price_bins),
        price_vs_quantity: price_vs_quantity(table, config.scatter_limit),
        discount_vs_quantity: discount_vs_quantity(table, config.scatter_limit),
        basis: derived.basis,
        no_data: Vec::new(),
    };
    let no_data = empty_sections(&dashboard);
    Dashboard { no_data, ..dashboard }
}

fn empty_sections(d: &Dashboard) -> Vec<String> {
    let sections = [
        ("kpis", d.kpis.products == 0),
        ("top_brands", d.top_brands.is_empty()),
        ("top_subcategories", d.top_subcategories.is_empty()),
        ("subcategory_distribution", d.subcategory_distribution.is_empty()),
        ("top_products_by_revenue", d.top_products_by_revenue.is_empty()),
        ("top_products_by_quantity", d.top_products_by_quantity.is_empty()),
        ("brand_equity", d.brand_equity.is_empty()),
        ("tier_volumes", d.tier_volumes.is_empty()),
        ("rating_histogram", d.rating_histogram.is_empty()),
        ("price_histogram", d.price_histogram.is_empty()),
        ("price_vs_quantity", d.price_vs_quantity.is_empty()),
        ("discount_vs_quantity", d.discount_vs_quantity.is_empty()),
    ];
    sections
        .into_iter()
        .filter(|(_, empty)| *empty)
        .map(|(name, _)| name.to_string())
        .collect()
}

pub fn kpi_summary(table: &ProductTable, derived: &DerivedDataset) -> KpiSummary {
    if table.is_empty() {
        return KpiSummary::default();
    }
    let m = &derived.metrics;
    let clv: Vec<Money> = derived.products.iter().map(|p| p.clv_proxy).collect();
    // every present rating, 0 included
    let ratings: Vec<Decimal> = table.records.iter().filter_map(|r| r.rating).collect();
    KpiSummary {
        products: table.len(),
        total_quantity: saturating_sum(table.records.iter().map(|r| r.quantity_sold)),
        total_revenue: m.total_revenue,
        avg_price: m.mean_price.unwrap_or(Decimal::ZERO),
        avg_rating: mean(&ratings).unwrap_or(Decimal::ZERO),
        nps: m.nps.score,
        satisfaction_index: m.satisfaction_index,
        avg_clv: mean(&clv).unwrap_or(Decimal::ZERO),
        brand_equity: m.brand_equity,
        hhi: m.hhi,
        market_structure: m.market_structure,
    }
}

/// Revenue by brand, split by category while every category is selected.
/// Rows without a brand are left out.
pub fn top_brands(
    table: &ProductTable,
    derived: &DerivedDataset,
    filter: &ProductFilter,
    n: usize,
) -> Vec<GroupTotal> {
    let presence = table.presence();
    if !presence.brand {
        return Vec::new();
    }
    let by_category = presence.category && filter.category.is_all();
    let rows = table
        .records
        .iter()
        .zip(derived.products.iter())
        .filter_map(|(r, d)| {
            Some(Contribution {
                key: (
                    if by_category { r.category.clone() } else { None },
                    r.brand.clone()?,
                ),
                quantity: r.quantity_sold,
                revenue: d.revenue,
            })
        });
    let groups = group_totals(rows)
        .into_iter()
        .map(|((category, label), products, quantity, revenue)| GroupTotal {
            category,
            label,
            products,
            quantity,
            revenue,
        })
        .collect();
    TopK::new(n).select(groups, |g: &GroupTotal| g.revenue)
}

fn subcategory_groups(table: &ProductTable, derived: &DerivedDataset) -> Vec<GroupTotal> {
    if !table.presence().subcategory {
        return Vec::new();
    }
    let rows = table
        .records
        .iter()
        .zip(derived.products.iter())
        .filter_map(|(r, d)| {
            Some(Contribution {
                key: r.subcategory.clone()?,
                quantity: r.quantity_sold,
                revenue: d.revenue,
            })
        });
    group_totals(rows)
        .into_iter()
        .map(|(label, products, quantity, revenue)| GroupTotal {
            category: None,
            label,
            products,
            quantity,
            revenue,
        })
        .collect()
}

pub fn top_subcategories(table: &ProductTable, derived: &DerivedDataset, n: usize) -> Vec<GroupTotal> {
    TopK::new(n).select(subcategory_groups(table, derived), |g: &GroupTotal| g.revenue)
}

/// Subcategories ranked by product count.
pub fn subcategory_distribution(
    table: &ProductTable,
    derived: &DerivedDataset,
    n: usize,
) -> Vec<GroupTotal> {
    TopK::new(n).select(subcategory_groups(table, derived), |g: &GroupTotal| {
        Decimal::from(g.products as u64)
    })
}

pub fn top_products(
    table: &ProductTable,
    derived: &DerivedDataset,
    by: RankBy,
    n: usize,
) -> Vec<ProductRank> {
    let ranks = table
        .records
        .iter()
        .zip(derived.products.iter())
        .map(|(r, d)| ProductRank {
            row: r.row,
            id: r.id.clone(),
            name: r.name.clone(),
            brand: r.brand.clone(),
            category: r.category.clone(),
            price: r.price,
            price_range: derived.tier_label(d).map(String::from),
            quantity_sold: r.quantity_sold,
            revenue: d.revenue,
            price_z_score: d.price_z_score,
            value_score: d.value_score,
            clv_proxy: d.clv_proxy,
            inventory_turnover: d.inventory_turnover,
            satisfaction_index: d.satisfaction_index,
            repeat_purchase_probability: d.repeat_purchase_probability,
            category_market_share: d.category_market_share,
        })
        .collect();
    TopK::new(n).select(ranks, |p: &ProductRank| match by {
        RankBy::Revenue => p.revenue,
        RankBy::Quantity => p.quantity_sold,
    })
}

/// Quantity and revenue per occupied tier, in tier order.
pub fn tier_volumes(table: &ProductTable, derived: &DerivedDataset) -> Vec<TierVolume> {
    derived
        .tiers
        .iter()
        .filter_map(|tier| {
            let members: Vec<_> = table
                .records
                .iter()
                .zip(derived.products.iter())
                .filter(|(_, d)| d.tier == Some(tier.index))
                .collect();
            if members.is_empty() {
                return None;
            }
            Some(TierVolume {
                label: tier.label.clone(),
                lower: tier.lower,
                upper: tier.upper,
                products: members.len(),
                quantity: saturating_sum(members.iter().map(|(r, _)| r.quantity_sold)),
                revenue: saturating_sum(members.iter().map(|(_, d)| d.revenue)),
            })
        })
        .collect()
}

/// Every present rating, 0 included, in equal-width bins.
pub fn rating_histogram(table: &ProductTable, bins: usize) -> Vec<HistogramBin> {
    let values: Vec<Decimal> = table.records.iter().filter_map(|r| r.rating).collect();
    histogram(&values, bins)
}

/// Positive prices in equal-width bins.
pub fn price_histogram(table: &ProductTable, bins: usize) -> Vec<HistogramBin> {
    let values: Vec<Decimal> = table
        .records
        .iter()
        .filter_map(|r| r.price)
        .filter(|p| *p > Decimal::ZERO)
        .collect();
    histogram(&values, bins)
}

/// Equal-width bins spanning [min, max]. A constant series is one bin.
pub fn histogram(values: &[Decimal], bins: usize) -> Vec<HistogramBin> {
    let (Some(min), Some(max)) = (values.iter().min().copied(), values.iter().max().copied())
    else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    let width = (max - min) / Decimal::from(bins as u64);
    if width.is_zero() {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| {
            let lower = min + width * Decimal::from(i as u64);
            let upper = if i + 1 == bins { max } else { lower + width };
            HistogramBin {
                lower,
                upper,
                count: 0,
            }
        })
        .collect();
    for v in values {
        let idx = ((*v - min) / width)
            .floor()
            .to_usize()
            .unwrap_or(0)
            .min(bins - 1);
        out[idx].count += 1;
    }
    out
}

pub fn price_vs_quantity(table: &ProductTable, limit: usize) -> Vec<ScatterPoint> {
    table
        .records
        .iter()
        .filter(|r| r.quantity_sold > Decimal::ZERO)
        .filter_map(|r| {
            let price = r.price.filter(|p| *p > Decimal::ZERO)?;
            Some(ScatterPoint {
                row: r.row,
                x: price,
                y: r.quantity_sold,
            })
        })
        .take(limit)
        .collect()
}

pub fn discount_vs_quantity(table: &ProductTable, limit: usize) -> Vec<ScatterPoint> {
    table
        .records
        .iter()
        .filter(|r| r.quantity_sold > Decimal::ZERO)
        .filter_map(|r| {
            Some(ScatterPoint {
                row: r.row,
                x: r.discount_rate?,
                y: r.quantity_sold,
            })
        })
        .take(limit)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::filter::CategorySelection;
    use crate::dataset::loader::load_products;
    use crate::metrics::derive;
    use rust_decimal_macros::dec;

    const CSV: &str = "\
product_name,brand_name,category_name,subcategory_name,price,quantity_sold,rating_average,discount_rate
P1,Samsung,Phones,Smartphone,10000000,5,4.8,10
P2,Samsung,Tablets,Tablet,8000000,2,4.0,
P3,Apple,Phones,Smartphone,20000000,3,4.9,5
P4,Nokia,Phones,Feature,500000,50,0,20
P5,,Phones,Feature,300000,0,3.0,
";

    fn run(filter: &ProductFilter) -> (ProductTable, Dashboard) {
        let cfg = DashboardConfig::default();
        let table = filter.apply(&load_products(CSV.as_bytes()).unwrap());
        let derived = derive(&table, &cfg);
        let dash = summarize(&table, &derived, filter, &cfg);
        (table, dash)
    }

    #[test]
    fn test_kpis() {
        let (_, d) = run(&ProductFilter::default());
        assert_eq!(d.kpis.products, 5);
        assert_eq!(d.kpis.total_quantity, dec!(60));
        assert_eq!(d.kpis.total_revenue, dec!(151_000_000));
        // (4.8 + 4.0 + 4.9 + 0 + 3.0) / 5
        assert_eq!(d.kpis.avg_rating, dec!(3.34));
    }

    #[test]
    fn test_top_brands_split_by_category_when_all_selected() {
        let (_, d) = run(&ProductFilter::default());
        let labels: Vec<_> = d
            .top_brands
            .iter()
            .map(|g| (g.category.as_deref(), g.label.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![
                (Some("Phones"), "Apple"),
                (Some("Phones"), "Samsung"),
                (Some("Phones"), "Nokia"),
                (Some("Tablets"), "Samsung"),
            ]
        );
    }

    #[test]
    fn test_zero_rating_counts_toward_average_and_histogram() {
        let cfg = DashboardConfig::default();
        let table = load_products("price,quantity_sold,rating_average\n100,1,5\n100,1,0\n".as_bytes())
            .unwrap();
        let derived = derive(&table, &cfg);
        let d = summarize(&table, &derived, &ProductFilter::default(), &cfg);
        assert_eq!(d.kpis.avg_rating, dec!(2.5));
        assert_eq!(d.rating_histogram.iter().map(|b| b.count).sum::<usize>(), 2);
        // NPS still skips the unrated listing
        assert_eq!(derived.metrics.nps.rated, 1);
    }

    #[test]
    fn test_ranked_products_carry_derived_columns() {
        let (table, d) = run(&ProductFilter::default());
        let derived = derive(&table, &DashboardConfig::default());
        let top = &d.top_products_by_revenue[0];
        let source = &derived.products[top.row];
        assert_eq!(top.name.as_deref(), Some("P3"));
        assert_eq!(top.price_z_score, source.price_z_score);
        assert_eq!(top.value_score, source.value_score);
        assert_eq!(top.clv_proxy, source.clv_proxy);
        assert_eq!(top.inventory_turnover, source.inventory_turnover);
        assert_eq!(top.satisfaction_index, dec!(98));
        assert_eq!(top.repeat_purchase_probability, source.repeat_purchase_probability);
        // 60M of the 135M Phones revenue
        assert!((top.category_market_share - dec!(0.4444)).abs() < dec!(0.0001));
        assert!(top.price_z_score > Decimal::ZERO);
    }

    #[test]
    fn test_top_brands_merge_within_one_category() {
        let filter = ProductFilter {
            category: CategorySelection::Only("Phones".into()),
            ..Default::default()
        };
        let (_, d) = run(&filter);
        assert!(d.top_brands.iter().all(|g| g.category.is_none()));
        assert_eq!(d.top_brands[0].label, "Apple");
    }

    #[test]
    fn test_subcategory_sections() {
        let (_, d) = run(&ProductFilter::default());
        assert_eq!(d.top_subcategories[0].label, "Smartphone");
        assert_eq!(d.top_subcategories[0].revenue, dec!(110_000_000));
        assert_eq!(d.subcategory_distribution[0].label, "Smartphone");
        assert_eq!(d.subcategory_distribution[0].products, 2);
        // tie on count: first seen wins
        assert_eq!(d.subcategory_distribution[1].label, "Feature");
    }

    #[test]
    fn test_top_products() {
        let (_, d) = run(&ProductFilter::default());
        assert_eq!(d.top_products_by_revenue[0].name.as_deref(), Some("P3"));
        assert_eq!(d.top_products_by_quantity[0].name.as_deref(), Some("P4"));
        assert_eq!(d.top_products_by_quantity[0].price_range.as_deref(), Some("0-1M"));
    }

    #[test]
    fn test_tier_volumes_in_tier_order() {
        let (_, d) = run(&ProductFilter::default());
        let labels: Vec<_> = d.tier_volumes.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["0-1M", "5-10M", "10-20M", "20-50M"]);
        assert_eq!(d.tier_volumes[0].quantity, dec!(50));
        assert_eq!(d.tier_volumes[0].products, 2);
    }

    #[test]
    fn test_scatter_requires_positive_quantity() {
        let (_, d) = run(&ProductFilter::default());
        assert_eq!(d.price_vs_quantity.len(), 4);
        let rows: Vec<_> = d.discount_vs_quantity.iter().map(|p| p.row).collect();
        assert_eq!(rows, vec![0, 2, 3]);
    }

    #[test]
    fn test_empty_selection_is_all_zero_with_placeholders() {
        let filter = ProductFilter {
            category: CategorySelection::Only("Laptops".into()),
            ..Default::default()
        };
        let (table, d) = run(&filter);
        assert!(table.is_empty());
        assert_eq!(d.kpis, KpiSummary::default());
        assert_eq!(d.no_data.len(), 12);
        assert!(d.no_data.contains(&"top_brands".to_string()));
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let values: Vec<Decimal> = (1..=100).map(Decimal::from).collect();
        let bins = histogram(&values, 30);
        assert_eq!(bins.len(), 30);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 100);
        assert_eq!(bins[29].upper, dec!(100));
    }

    #[test]
    fn test_histogram_constant_and_empty() {
        let bins = histogram(&[dec!(4), dec!(4)], 20);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 2);
        assert!(histogram(&[], 20).is_empty());
    }
}
