//! Month-based aggregates.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::dataset::RowSet;
use crate::model::column;
use crate::table::{Cell, Table, ToTable};

/// Label format of a month-year key, e.g. `2023 : Jan`.
pub const MONTH_LABEL_FORMAT: &str = "%Y : %b";

/// Summed sales for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub sales: f64,
}

/// Sales per month, in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeries {
    pub points: Vec<MonthlyPoint>,
}

impl ToTable for MonthlySeries {
    fn to_table(&self) -> Table {
        let mut table = Table::new(["month_year", column::SALES]);
        for p in &self.points {
            table.push(vec![p.label.as_str().into(), p.sales.into()]);
        }
        table
    }
}

/// Group by `(year, month)` so ordering follows the calendar, not the label text.
pub fn monthly_sales(rows: &RowSet<'_>) -> MonthlySeries {
    let mut months: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for row in rows.iter() {
        let key = (row.order_date.year(), row.order_date.month());
        *months.entry(key).or_insert(0.0) += row.sales;
    }

    let points = months
        .into_iter()
        .filter_map(|((year, month), sales)| {
            let first = NaiveDate::from_ymd_opt(year, month, 1)?;
            Some(MonthlyPoint {
                year,
                month,
                label: first.format(MONTH_LABEL_FORMAT).to_string(),
                sales,
            })
        })
        .collect();
    MonthlySeries { points }
}

/// One sub-category row of the month matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRow {
    pub sub_category: String,
    /// One cell per entry of [`SubCategoryPivot::months`]; `None` where no sales occurred.
    pub cells: Vec<Option<f64>>,
}

/// Sub-category by month-name matrix of summed sales across all years.
///
/// Rows and columns are sorted by their labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubCategoryPivot {
    pub months: Vec<String>,
    pub rows: Vec<PivotRow>,
}

impl SubCategoryPivot {
    /// Cell for a sub-category and month name.
    pub fn get(&self, sub_category: &str, month: &str) -> Option<f64> {
        let col = self.months.iter().position(|m| m == month)?;
        self.rows
            .iter()
            .find(|r| r.sub_category == sub_category)
            .and_then(|r| r.cells[col])
    }
}

impl ToTable for SubCategoryPivot {
    fn to_table(&self) -> Table {
        let mut table = Table::new(
            std::iter::once(column::SUB_CATEGORY.to_string()).chain(self.months.iter().cloned()),
        );
        for row in &self.rows {
            let mut cells = vec![Cell::from(row.sub_category.as_str())];
            cells.extend(row.cells.iter().map(|c| Cell::from(*c)));
            table.push(cells);
        }
        table
    }
}

pub fn sub_category_by_month(rows: &RowSet<'_>) -> SubCategoryPivot {
    let mut grid: BTreeMap<&str, BTreeMap<String, f64>> = BTreeMap::new();
    let mut months = BTreeSet::new();

    for row in rows.iter() {
        let month = row.order_date.format("%B").to_string();
        months.insert(month.clone());
        *grid
            .entry(row.sub_category.as_str())
            .or_default()
            .entry(month)
            .or_insert(0.0) += row.sales;
    }

    let months: Vec<String> = months.into_iter().collect();
    let rows = grid
        .into_iter()
        .map(|(sub_category, by_month)| PivotRow {
            sub_category: sub_category.to_string(),
            cells: months.iter().map(|m| by_month.get(m).copied()).collect(),
        })
        .collect();

    SubCategoryPivot { months, rows }
}
