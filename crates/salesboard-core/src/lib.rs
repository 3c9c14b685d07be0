//! Core pipeline for the Salesboard sales dashboard.
//!
//! This crate provides:
//! - Loading of delimited text and spreadsheet uploads
//! - Typed datasets with date-based slicing
//! - Cascading location filters
//! - KPIs and grouped aggregates
//! - CSV export and text/HTML rendering of result tables

pub mod aggregate;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod export;
pub mod filter;
pub mod kpi;
pub mod load;
pub mod model;
pub mod ratio;
pub mod render;
pub mod table;

pub use dashboard::{Dashboard, DashboardConfig, DashboardTable, DashboardView};
pub use dataset::{Dataset, PreviewRow, RowSet};
pub use error::{Error, Result};
pub use export::{row_set_table, rows_table, to_csv_string, write_csv};
pub use filter::{FilterOptions, apply, filter_dataset};
pub use kpi::Kpis;
pub use load::{FileFormat, LoadOptions, RawTable, TextEncoding, load_bytes, load_path};
pub use model::{Columns, FilterSelection, LocationField, Row};
pub use ratio::{safe_percent, safe_ratio};
pub use render::{Render, format_currency};
pub use table::{Cell, Table, ToTable};
