//! Aggregate tables derived from the filtered rows.
//!
//! Every function here is a pure recomputation over a [`RowSet`]; nothing is
//! cached between calls. Grouped results come out in ascending key order,
//! rankings are stable descending sorts over that order.

mod hierarchy;
mod time;
mod totals;

pub use hierarchy::{HierarchyNode, sales_hierarchy};
pub use time::{MonthlyPoint, MonthlySeries, PivotRow, SubCategoryPivot, monthly_sales, sub_category_by_month};
pub use totals::{
    CategoryMargin, CategoryMargins, GroupTotal, ProductProfit, ProductRanking, RegionPerformance,
    RegionTable, SalesByKey, SalesShare, ShareEntry, category_margin, category_sales,
    category_share, region_performance, segment_sales, top_cities, top_products,
};

use std::collections::BTreeMap;

use crate::dataset::RowSet;
use crate::model::Row;

/// Sum `value` per `key`, keys ascending.
pub(crate) fn group_sum<'a, K, F, V>(rows: &RowSet<'a>, key: F, value: V) -> BTreeMap<K, f64>
where
    K: Ord,
    F: Fn(&'a Row) -> K,
    V: Fn(&Row) -> f64,
{
    let mut groups = BTreeMap::new();
    for row in rows.iter() {
        *groups.entry(key(row)).or_insert(0.0) += value(row);
    }
    groups
}

/// Stable descending sort by `score`, truncated to `n` entries.
pub(crate) fn rank_desc<T>(mut entries: Vec<T>, n: usize, score: impl Fn(&T) -> f64) -> Vec<T> {
    entries.sort_by(|a, b| score(b).total_cmp(&score(a)));
    entries.truncate(n);
    entries
}
