//! One recomputation of every dashboard view.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::aggregate::{
    CategoryMargins, HierarchyNode, MonthlySeries, ProductRanking, RegionTable, SalesByKey,
    SalesShare, SubCategoryPivot, category_margin, category_sales, category_share,
    monthly_sales, region_performance, sales_hierarchy, segment_sales, sub_category_by_month,
    top_cities, top_products,
};
use crate::dataset::{Dataset, PreviewRow, RowSet};
use crate::error::{Error, Result};
use crate::export::{row_set_table, rows_table};
use crate::kpi::Kpis;
use crate::table::{Table, ToTable};

/// Sizes of the ranked and sampled views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub top_cities: usize,
    pub top_products: usize,
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_cities: 10,
            top_products: 10,
            preview_rows: 5,
        }
    }
}

/// KPIs plus every aggregate of a filtered row set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub kpis: Kpis,
    pub category_sales: SalesByKey,
    pub top_cities: SalesByKey,
    pub monthly_sales: MonthlySeries,
    pub segment_sales: SalesShare,
    pub category_share: SalesShare,
    pub region_performance: RegionTable,
    pub sub_category_pivot: SubCategoryPivot,
    /// `None` when the upload has no `Product Name` column.
    pub top_products: Option<ProductRanking>,
    pub category_margin: CategoryMargins,
    pub hierarchy: HierarchyNode,
}

impl Dashboard {
    pub fn compute(rows: &RowSet<'_>, config: &DashboardConfig) -> Self {
        Self {
            kpis: Kpis::compute(rows),
            category_sales: category_sales(rows),
            top_cities: top_cities(rows, config.top_cities),
            monthly_sales: monthly_sales(rows),
            segment_sales: segment_sales(rows),
            category_share: category_share(rows),
            region_performance: region_performance(rows),
            sub_category_pivot: sub_category_by_month(rows),
            top_products: top_products(rows, config.top_products),
            category_margin: category_margin(rows),
            hierarchy: sales_hierarchy(rows),
        }
    }

    /// The aggregate backing `table`, or `None` for row-level tables and a
    /// missing product ranking.
    pub fn table(&self, table: DashboardTable) -> Option<Table> {
        let table = match table {
            DashboardTable::Filtered | DashboardTable::Dataset => return None,
            DashboardTable::Category => self.category_sales.to_table(),
            DashboardTable::TopCities => self.top_cities.to_table(),
            DashboardTable::TimeSeries => self.monthly_sales.to_table(),
            DashboardTable::Segment => self.segment_sales.to_table(),
            DashboardTable::CategoryShare => self.category_share.to_table(),
            DashboardTable::Region => self.region_performance.to_table(),
            DashboardTable::SubCategoryMonth => self.sub_category_pivot.to_table(),
            DashboardTable::TopProducts => self.top_products.as_ref()?.to_table(),
            DashboardTable::CategoryMargin => self.category_margin.to_table(),
            DashboardTable::Hierarchy => self.hierarchy.to_table(),
        };
        Some(table)
    }
}

/// Dashboard plus the preview sample, as sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    #[serde(flatten)]
    pub dashboard: Dashboard,
    /// First rows of the date-sliced base, before location filters.
    pub preview: Vec<PreviewRow>,
}

impl DashboardView {
    pub fn compute(base: &RowSet<'_>, filtered: &RowSet<'_>, config: &DashboardConfig) -> Self {
        Self {
            dashboard: Dashboard::compute(filtered, config),
            preview: base.preview(config.preview_rows),
        }
    }
}

/// Every table that can be downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardTable {
    /// Filtered rows.
    Filtered,
    /// The full upload, unfiltered.
    Dataset,
    Category,
    TopCities,
    TimeSeries,
    Segment,
    CategoryShare,
    Region,
    SubCategoryMonth,
    TopProducts,
    CategoryMargin,
    Hierarchy,
}

impl DashboardTable {
    pub const ALL: [DashboardTable; 12] = [
        DashboardTable::Filtered,
        DashboardTable::Dataset,
        DashboardTable::Category,
        DashboardTable::TopCities,
        DashboardTable::TimeSeries,
        DashboardTable::Segment,
        DashboardTable::CategoryShare,
        DashboardTable::Region,
        DashboardTable::SubCategoryMonth,
        DashboardTable::TopProducts,
        DashboardTable::CategoryMargin,
        DashboardTable::Hierarchy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DashboardTable::Filtered => "filtered",
            DashboardTable::Dataset => "dataset",
            DashboardTable::Category => "category",
            DashboardTable::TopCities => "top_cities",
            DashboardTable::TimeSeries => "time_series",
            DashboardTable::Segment => "segment",
            DashboardTable::CategoryShare => "category_share",
            DashboardTable::Region => "region",
            DashboardTable::SubCategoryMonth => "sub_category_month",
            DashboardTable::TopProducts => "top_products",
            DashboardTable::CategoryMargin => "category_margin",
            DashboardTable::Hierarchy => "hierarchy",
        }
    }

    /// Heading for printed output.
    pub fn title(&self) -> &'static str {
        match self {
            DashboardTable::Filtered => "Filtered Data",
            DashboardTable::Dataset => "Full Dataset",
            DashboardTable::Category => "Category Wise Sales",
            DashboardTable::TopCities => "Top Cities by Sales",
            DashboardTable::TimeSeries => "Time Series Analysis",
            DashboardTable::Segment => "Segment Wise Sales",
            DashboardTable::CategoryShare => "Category Wise Sales Share",
            DashboardTable::Region => "Region Wise Performance",
            DashboardTable::SubCategoryMonth => "Month Wise Sub-Category Sales",
            DashboardTable::TopProducts => "Top Products by Profit",
            DashboardTable::CategoryMargin => "Profit Margin by Category",
            DashboardTable::Hierarchy => "Hierarchical View of Sales",
        }
    }

    /// Download file name.
    pub fn file_name(&self) -> &'static str {
        match self {
            DashboardTable::Filtered => "filtered_sales_data.csv",
            DashboardTable::Dataset => "superstore_full_dataset.csv",
            DashboardTable::Category => "category_sales_data.csv",
            DashboardTable::TopCities => "top_cities_sales_data.csv",
            DashboardTable::TimeSeries => "TimeSeries.csv",
            DashboardTable::Segment => "segment_sales_data.csv",
            DashboardTable::CategoryShare => "category_share_data.csv",
            DashboardTable::Region => "region_performance_data.csv",
            DashboardTable::SubCategoryMonth => "monthly_subcategory_sales.csv",
            DashboardTable::TopProducts => "top_products_profit_data.csv",
            DashboardTable::CategoryMargin => "category_margin_data.csv",
            DashboardTable::Hierarchy => "sales_hierarchy_data.csv",
        }
    }

    /// Materialise this table for `dataset` under the already-filtered `rows`.
    ///
    /// Fails with [`Error::UnknownTable`] when the upload cannot provide it.
    pub fn build(
        &self,
        dataset: &Dataset,
        rows: &RowSet<'_>,
        config: &DashboardConfig,
    ) -> Result<Table> {
        match self {
            DashboardTable::Filtered => Ok(row_set_table(rows)),
            DashboardTable::Dataset => Ok(rows_table(dataset.rows(), dataset.columns())),
            _ => Dashboard::compute(rows, config)
                .table(*self)
                .ok_or_else(|| Error::UnknownTable(self.name().to_string())),
        }
    }
}

impl fmt::Display for DashboardTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DashboardTable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DashboardTable::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::UnknownTable(s.to_string()))
    }
}
