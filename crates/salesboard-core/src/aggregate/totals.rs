//! Grouped totals, shares and rankings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{group_sum, rank_desc};
use crate::dataset::RowSet;
use crate::model::{Row, column};
use crate::ratio::{safe_percent, safe_ratio};
use crate::table::{Table, ToTable};

/// Summed sales for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub key: String,
    pub sales: f64,
}

/// Sales summed per value of one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesByKey {
    /// Column header of the grouping dimension.
    pub dimension: String,
    pub entries: Vec<GroupTotal>,
}

impl SalesByKey {
    pub fn total(&self) -> f64 {
        self.entries.iter().fold(0.0, |acc, e| acc + e.sales)
    }
}

impl ToTable for SalesByKey {
    fn to_table(&self) -> Table {
        let mut table = Table::new([self.dimension.as_str(), column::SALES]);
        for entry in &self.entries {
            table.push(vec![entry.key.as_str().into(), entry.sales.into()]);
        }
        table
    }
}

/// Category totals, one bar per category.
pub fn category_sales(rows: &RowSet<'_>) -> SalesByKey {
    sales_by(rows, column::CATEGORY, |r| r.category.as_str())
}

/// The `n` cities with the highest sales, ties in city order.
pub fn top_cities(rows: &RowSet<'_>, n: usize) -> SalesByKey {
    let mut by_city = sales_by(rows, column::CITY, |r| r.city.as_str());
    by_city.entries = rank_desc(by_city.entries, n, |e| e.sales);
    by_city
}

fn sales_by<'a>(
    rows: &RowSet<'a>,
    dimension: &str,
    key: impl Fn(&'a Row) -> &'a str,
) -> SalesByKey {
    let entries = group_sum(rows, key, |r| r.sales)
        .into_iter()
        .map(|(key, sales)| GroupTotal {
            key: key.to_string(),
            sales,
        })
        .collect();
    SalesByKey {
        dimension: dimension.to_string(),
        entries,
    }
}

/// One slice of a proportion chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareEntry {
    pub key: String,
    pub sales: f64,
    /// Fraction of total sales in `[0, 1]`; `None` when total sales are zero.
    pub share: Option<f64>,
}

/// Sales proportions per value of one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesShare {
    pub dimension: String,
    pub entries: Vec<ShareEntry>,
}

impl ToTable for SalesShare {
    fn to_table(&self) -> Table {
        let mut table = Table::new([self.dimension.as_str(), column::SALES, "Share"]);
        for entry in &self.entries {
            table.push(vec![
                entry.key.as_str().into(),
                entry.sales.into(),
                entry.share.into(),
            ]);
        }
        table
    }
}

pub fn segment_sales(rows: &RowSet<'_>) -> SalesShare {
    shares(sales_by(rows, column::SEGMENT, |r| r.segment.as_str()))
}

pub fn category_share(rows: &RowSet<'_>) -> SalesShare {
    shares(category_sales(rows))
}

fn shares(totals: SalesByKey) -> SalesShare {
    let total = totals.total();
    SalesShare {
        entries: totals
            .entries
            .into_iter()
            .map(|e| ShareEntry {
                share: safe_ratio(e.sales, total),
                key: e.key,
                sales: e.sales,
            })
            .collect(),
        dimension: totals.dimension,
    }
}

/// Independent sums for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPerformance {
    pub region: String,
    pub sales: f64,
    pub profit: f64,
    pub quantity: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionTable {
    pub entries: Vec<RegionPerformance>,
}

impl ToTable for RegionTable {
    fn to_table(&self) -> Table {
        let mut table = Table::new([
            column::REGION,
            column::SALES,
            column::PROFIT,
            column::QUANTITY,
        ]);
        for e in &self.entries {
            table.push(vec![
                e.region.as_str().into(),
                e.sales.into(),
                e.profit.into(),
                e.quantity.into(),
            ]);
        }
        table
    }
}

pub fn region_performance(rows: &RowSet<'_>) -> RegionTable {
    let mut groups: BTreeMap<&str, RegionPerformance> = BTreeMap::new();
    for row in rows.iter() {
        let entry = groups
            .entry(row.region.as_str())
            .or_insert_with(|| RegionPerformance {
                region: row.region.clone(),
                sales: 0.0,
                profit: 0.0,
                quantity: 0,
            });
        entry.sales += row.sales;
        entry.profit += row.profit;
        entry.quantity += row.quantity;
    }
    RegionTable {
        entries: groups.into_values().collect(),
    }
}

/// Summed profit for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductProfit {
    pub product: String,
    pub profit: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRanking {
    pub entries: Vec<ProductProfit>,
}

impl ToTable for ProductRanking {
    fn to_table(&self) -> Table {
        let mut table = Table::new([column::PRODUCT_NAME, column::PROFIT]);
        for e in &self.entries {
            table.push(vec![e.product.as_str().into(), e.profit.into()]);
        }
        table
    }
}

/// The `n` most profitable products, or `None` when the upload has no product names.
pub fn top_products(rows: &RowSet<'_>, n: usize) -> Option<ProductRanking> {
    if !rows.columns().product_name {
        return None;
    }
    let entries = group_sum(rows, |r| r.product_name.as_deref().unwrap_or(""), |r| r.profit)
        .into_iter()
        .map(|(product, profit)| ProductProfit {
            product: product.to_string(),
            profit,
        })
        .collect();
    Some(ProductRanking {
        entries: rank_desc(entries, n, |e| e.profit),
    })
}

/// Sales, profit and margin for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMargin {
    pub category: String,
    pub sales: f64,
    pub profit: f64,
    /// `profit / sales * 100`; `None` when the category has no sales.
    pub margin_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryMargins {
    pub entries: Vec<CategoryMargin>,
}

impl ToTable for CategoryMargins {
    fn to_table(&self) -> Table {
        let mut table = Table::new([
            column::CATEGORY,
            column::SALES,
            column::PROFIT,
            "Profit Margin %",
        ]);
        for e in &self.entries {
            table.push(vec![
                e.category.as_str().into(),
                e.sales.into(),
                e.profit.into(),
                e.margin_pct.into(),
            ]);
        }
        table
    }
}

pub fn category_margin(rows: &RowSet<'_>) -> CategoryMargins {
    let mut groups: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for row in rows.iter() {
        let (sales, profit) = groups.entry(row.category.as_str()).or_insert((0.0, 0.0));
        *sales += row.sales;
        *profit += row.profit;
    }
    CategoryMargins {
        entries: groups
            .into_iter()
            .map(|(category, (sales, profit))| CategoryMargin {
                category: category.to_string(),
                sales,
                profit,
                margin_pct: safe_percent(profit, sales),
            })
            .collect(),
    }
}
