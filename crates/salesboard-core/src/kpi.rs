//! Headline metrics for the filtered rows.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::dataset::RowSet;
use crate::ratio::{safe_percent, safe_ratio};

/// Scalar summary of a filtered row set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_sales: f64,
    pub total_profit: f64,
    pub total_quantity: u64,
    /// Number of filtered rows (order lines).
    pub row_count: usize,
    /// Total profit as a percentage of total sales; 0 when there are no sales.
    pub profit_margin_pct: f64,
    /// Mean sales per order when order ids exist, otherwise sales per row.
    pub avg_order_value: f64,
    /// Distinct customers when customer ids exist, otherwise the row count.
    pub unique_customers: usize,
}

impl Kpis {
    pub fn compute(rows: &RowSet<'_>) -> Self {
        // Fold from +0.0 so an empty selection reports 0 rather than -0.
        let total_sales = rows.iter().fold(0.0, |acc, r| acc + r.sales);
        let total_profit = rows.iter().fold(0.0, |acc, r| acc + r.profit);
        let total_quantity: u64 = rows.iter().map(|r| r.quantity).sum();
        let row_count = rows.len();
        let columns = rows.columns();

        let avg_order_value = if columns.order_id {
            let mut per_order: FxHashMap<&str, f64> = FxHashMap::default();
            for row in rows.iter() {
                *per_order.entry(id_key(&row.order_id)).or_default() += row.sales;
            }
            let order_sum = per_order.values().fold(0.0, |acc, s| acc + s);
            safe_ratio(order_sum, per_order.len() as f64)
        } else {
            safe_ratio(total_sales, row_count as f64)
        };

        let unique_customers = if columns.customer_id {
            rows.iter()
                .map(|r| id_key(&r.customer_id))
                .collect::<FxHashSet<_>>()
                .len()
        } else {
            row_count
        };

        Self {
            total_sales,
            total_profit,
            total_quantity,
            row_count,
            profit_margin_pct: safe_percent(total_profit, total_sales).unwrap_or(0.0),
            avg_order_value: avg_order_value.unwrap_or(0.0),
            unique_customers,
        }
    }
}

fn id_key(id: &Option<String>) -> &str {
    id.as_deref().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::{Columns, Row};

    fn row(order: &str, customer: &str, sales: f64, profit: f64, quantity: u64) -> Row {
        Row {
            order_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            region: "West".to_string(),
            state: "Utah".to_string(),
            city: "Provo".to_string(),
            category: "Technology".to_string(),
            sub_category: "Phones".to_string(),
            segment: "Consumer".to_string(),
            sales,
            profit,
            quantity,
            order_id: Some(order.to_string()),
            customer_id: Some(customer.to_string()),
            product_name: None,
        }
    }

    #[test]
    fn test_kpis_with_order_and_customer_ids() {
        let data = vec![
            row("O-1", "C-1", 100.0, 20.0, 2),
            row("O-1", "C-1", 50.0, -5.0, 1),
            row("O-2", "C-2", 30.0, 3.0, 3),
        ];
        let rows = RowSet::new(data.iter().collect(), Columns::all());
        let kpis = Kpis::compute(&rows);

        assert_eq!(kpis.total_sales, 180.0);
        assert_eq!(kpis.total_profit, 18.0);
        assert_eq!(kpis.total_quantity, 6);
        assert_eq!(kpis.row_count, 3);
        assert!((kpis.profit_margin_pct - 10.0).abs() < 1e-9);
        // Two orders: 150 and 30.
        assert_eq!(kpis.avg_order_value, 90.0);
        assert_eq!(kpis.unique_customers, 2);
    }

    #[test]
    fn test_kpis_without_optional_columns() {
        let data = vec![
            row("O-1", "C-1", 100.0, 20.0, 2),
            row("O-1", "C-1", 50.0, -5.0, 1),
        ];
        let rows = RowSet::new(data.iter().collect(), Columns::default());
        let kpis = Kpis::compute(&rows);

        assert_eq!(kpis.avg_order_value, 75.0);
        assert_eq!(kpis.unique_customers, 2);
    }

    #[test]
    fn test_kpis_empty() {
        let rows = RowSet::new(Vec::new(), Columns::all());
        let kpis = Kpis::compute(&rows);
        assert_eq!(kpis, Kpis::default());

        let rows = RowSet::new(Vec::new(), Columns::default());
        assert_eq!(Kpis::compute(&rows), Kpis::default());
    }

    #[test]
    fn test_margin_zero_when_sales_zero() {
        let data = vec![row("O-1", "C-1", 0.0, -12.0, 1)];
        let rows = RowSet::new(data.iter().collect(), Columns::all());
        let kpis = Kpis::compute(&rows);
        assert_eq!(kpis.profit_margin_pct, 0.0);
        assert_eq!(kpis.total_profit, -12.0);
    }
}
