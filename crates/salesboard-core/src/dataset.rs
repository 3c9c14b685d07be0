//! Typed datasets and row views.
//!
//! A [`Dataset`] owns every row of one upload whose order date parsed. All
//! filtering produces a [`RowSet`], a borrowed view that keeps input order.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::load::{LoadOptions, RawTable, load_bytes, load_path};
use crate::model::{Columns, Row, column};
use crate::table::{Table, ToTable};

/// Rows of one upload, immutable after preprocessing.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<Row>,
    columns: Columns,
    dropped_rows: usize,
}

/// Positions of the resolved columns within a raw table.
struct ColumnMap {
    required: [usize; 10],
    order_id: Option<usize>,
    customer_id: Option<usize>,
    product_name: Option<usize>,
}

impl ColumnMap {
    fn resolve(raw: &RawTable) -> Result<Self> {
        let mut required = [0; 10];
        for (slot, name) in required.iter_mut().zip(column::REQUIRED) {
            *slot = raw
                .column_index(name)
                .ok_or_else(|| Error::MissingColumn(name.to_string()))?;
        }
        Ok(Self {
            required,
            order_id: raw.column_index(column::ORDER_ID),
            customer_id: raw.column_index(column::CUSTOMER_ID),
            product_name: raw.column_index(column::PRODUCT_NAME),
        })
    }

    fn columns(&self) -> Columns {
        Columns {
            order_id: self.order_id.is_some(),
            customer_id: self.customer_id.is_some(),
            product_name: self.product_name.is_some(),
        }
    }
}

impl Dataset {
    /// Build a dataset from already-typed rows.
    pub fn new(rows: Vec<Row>, columns: Columns) -> Self {
        Self {
            rows,
            columns,
            dropped_rows: 0,
        }
    }

    /// Read and preprocess a file from disk.
    pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self> {
        Self::from_raw(&load_path(path, options)?, options)
    }

    /// Read and preprocess an uploaded buffer; `name` selects the format.
    pub fn from_bytes(name: &str, bytes: &[u8], options: &LoadOptions) -> Result<Self> {
        Self::from_raw(&load_bytes(name, bytes, options)?, options)
    }

    /// Resolve the schema, parse every record and drop rows without a valid date.
    ///
    /// A missing required column or an unparseable numeric field fails the
    /// whole load; an unparseable date only drops its row.
    pub fn from_raw(raw: &RawTable, options: &LoadOptions) -> Result<Self> {
        let map = ColumnMap::resolve(raw)?;
        let mut rows = Vec::with_capacity(raw.records.len());
        let mut dropped_rows = 0;

        for (i, record) in raw.records.iter().enumerate() {
            let line = i + 1;
            let field = |idx: usize| record.get(idx).map(|s| s.trim()).unwrap_or("");
            let [date, region, state, city, category, sub_category, segment, sales, profit, quantity] =
                map.required;

            let Some(order_date) = parse_date(field(date), &options.date_formats) else {
                dropped_rows += 1;
                continue;
            };

            rows.push(Row {
                order_date,
                region: field(region).to_string(),
                state: field(state).to_string(),
                city: field(city).to_string(),
                category: field(category).to_string(),
                sub_category: field(sub_category).to_string(),
                segment: field(segment).to_string(),
                sales: parse_decimal(field(sales), line, column::SALES)?,
                profit: parse_decimal(field(profit), line, column::PROFIT)?,
                quantity: parse_quantity(field(quantity), line)?,
                order_id: map.order_id.map(|idx| field(idx).to_string()),
                customer_id: map.customer_id.map(|idx| field(idx).to_string()),
                product_name: map.product_name.map(|idx| field(idx).to_string()),
            });
        }

        if dropped_rows > 0 {
            tracing::warn!("Dropped {} rows with unparseable order dates", dropped_rows);
        }
        tracing::info!("Loaded {} rows", rows.len());

        Ok(Self {
            rows,
            columns: map.columns(),
            dropped_rows,
        })
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn columns(&self) -> Columns {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows removed during preprocessing because their date did not parse.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Earliest and latest order dates, or `None` for an empty dataset.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.rows.iter().map(|r| r.order_date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Every row, as a view.
    pub fn all(&self) -> RowSet<'_> {
        RowSet {
            rows: self.rows.iter().collect(),
            columns: self.columns,
        }
    }

    /// Rows with `lower <= order_date <= upper`.
    pub fn slice_dates(&self, lower: NaiveDate, upper: NaiveDate) -> RowSet<'_> {
        self.all()
            .retain(|row| lower <= row.order_date && row.order_date <= upper)
    }
}

/// A borrowed, ordered subset of a dataset's rows.
#[derive(Debug, Clone)]
pub struct RowSet<'a> {
    rows: Vec<&'a Row>,
    columns: Columns,
}

impl<'a> RowSet<'a> {
    pub fn new(rows: Vec<&'a Row>, columns: Columns) -> Self {
        Self { rows, columns }
    }

    pub fn rows(&self) -> &[&'a Row] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Row> + '_ {
        self.rows.iter().copied()
    }

    pub fn columns(&self) -> Columns {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep only rows matching `predicate`, preserving order.
    pub fn retain(&self, mut predicate: impl FnMut(&Row) -> bool) -> RowSet<'a> {
        RowSet {
            rows: self.rows.iter().copied().filter(|row| predicate(row)).collect(),
            columns: self.columns,
        }
    }

    /// First `n` rows projected to the preview columns.
    pub fn preview(&self, n: usize) -> Vec<PreviewRow> {
        self.rows
            .iter()
            .take(n)
            .map(|row| PreviewRow {
                region: row.region.clone(),
                state: row.state.clone(),
                city: row.city.clone(),
                category: row.category.clone(),
                sales: row.sales,
                profit: row.profit,
                quantity: row.quantity,
            })
            .collect()
    }
}

/// Sample row shown above the sub-category matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewRow {
    pub region: String,
    pub state: String,
    pub city: String,
    pub category: String,
    pub sales: f64,
    pub profit: f64,
    pub quantity: u64,
}

impl ToTable for [PreviewRow] {
    fn to_table(&self) -> Table {
        let mut table = Table::new([
            column::REGION,
            column::STATE,
            column::CITY,
            column::CATEGORY,
            column::SALES,
            column::PROFIT,
            column::QUANTITY,
        ]);
        for row in self {
            table.push(vec![
                row.region.as_str().into(),
                row.state.as_str().into(),
                row.city.as_str().into(),
                row.category.as_str().into(),
                row.sales.into(),
                row.profit.into(),
                row.quantity.into(),
            ]);
        }
        table
    }
}

/// Parse a date with the first matching format; datetime formats keep the date part.
pub fn parse_date(value: &str, formats: &[String]) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    formats.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(value, fmt)
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(value, fmt).ok().map(|dt| dt.date()))
    })
}

fn parse_decimal(value: &str, row: usize, column: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::InvalidValue {
            row,
            column: column.to_string(),
            value: value.to_string(),
        })
}

/// Quantities are whole and non-negative; spreadsheets may store them as `3.0`.
fn parse_quantity(value: &str, row: usize) -> Result<u64> {
    if let Ok(q) = value.parse::<u64>() {
        return Ok(q);
    }
    match value.parse::<f64>() {
        Ok(q) if q >= 0.0 && q.fract() == 0.0 && q <= u64::MAX as f64 => Ok(q as u64),
        _ => Err(Error::InvalidValue {
            row,
            column: column::QUANTITY.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::read_delimited;

    const HEADER: &str =
        "Order ID,Order Date,Customer ID,Segment,City,State,Region,Product Name,Category,Sub-Category,Sales,Quantity,Profit";

    fn load(body: &str) -> Result<Dataset> {
        let input = format!("{}\n{}", HEADER, body);
        let options = LoadOptions::default();
        let raw = read_delimited(input.as_bytes(), &options)?;
        Dataset::from_raw(&raw, &options)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rows_with_bad_dates_are_dropped() {
        let dataset = load(
            "O-1,11/8/2016,C-1,Consumer,Henderson,Kentucky,South,Chair,Furniture,Chairs,261.96,2,41.91\n\
             O-2,not a date,C-2,Consumer,Henderson,Kentucky,South,Table,Furniture,Tables,10,1,1\n\
             O-3,2017-06-12,C-3,Corporate,Los Angeles,California,West,Labels,Office Supplies,Labels,14.62,2,6.87\n",
        )
        .unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.dropped_rows(), 1);
        assert_eq!(dataset.rows()[0].order_date, date(2016, 11, 8));
        assert_eq!(dataset.rows()[1].order_date, date(2017, 6, 12));
        assert_eq!(dataset.date_bounds(), Some((date(2016, 11, 8), date(2017, 6, 12))));
        assert_eq!(dataset.columns(), Columns::all());
    }

    #[test]
    fn test_missing_required_column() {
        let input = "Order Date,Region,State,City,Category,Sub-Category,Sales,Profit,Quantity\n";
        let options = LoadOptions::default();
        let raw = read_delimited(input.as_bytes(), &options).unwrap();
        let err = Dataset::from_raw(&raw, &options).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == "Segment"));
    }

    #[test]
    fn test_optional_columns_absent() {
        let input = "Order Date,Region,State,City,Category,Sub-Category,Segment,Sales,Profit,Quantity\n\
                     2023-01-02,West,Utah,Provo,Technology,Phones,Consumer,5,1,1\n";
        let options = LoadOptions::default();
        let raw = read_delimited(input.as_bytes(), &options).unwrap();
        let dataset = Dataset::from_raw(&raw, &options).unwrap();

        assert_eq!(dataset.columns(), Columns::default());
        assert_eq!(dataset.rows()[0].order_id, None);
        assert_eq!(dataset.rows()[0].product_name, None);
    }

    #[test]
    fn test_invalid_sales_fails_load() {
        let err = load("O-1,1/2/2023,C-1,Consumer,Provo,Utah,West,Pen,Office Supplies,Art,abc,1,1\n")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { row: 1, ref column, .. } if column == "Sales"));
    }

    #[test]
    fn test_quantity_accepts_integral_float() {
        let dataset =
            load("O-1,1/2/2023,C-1,Consumer,Provo,Utah,West,Pen,Office Supplies,Art,5,3.0,1\n").unwrap();
        assert_eq!(dataset.rows()[0].quantity, 3);

        let err = load("O-1,1/2/2023,C-1,Consumer,Provo,Utah,West,Pen,Office Supplies,Art,5,-1,1\n")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { ref column, .. } if column == "Quantity"));
    }

    #[test]
    fn test_slice_dates_inclusive_and_inverted() {
        let dataset = load(
            "O-1,1/1/2023,C-1,Consumer,Provo,Utah,West,Pen,Office Supplies,Art,1,1,1\n\
             O-2,1/15/2023,C-1,Consumer,Provo,Utah,West,Pen,Office Supplies,Art,2,1,1\n\
             O-3,1/31/2023,C-1,Consumer,Provo,Utah,West,Pen,Office Supplies,Art,3,1,1\n",
        )
        .unwrap();

        let slice = dataset.slice_dates(date(2023, 1, 1), date(2023, 1, 15));
        assert_eq!(slice.len(), 2);

        let inverted = dataset.slice_dates(date(2023, 1, 31), date(2023, 1, 1));
        assert!(inverted.is_empty());
    }

    #[test]
    fn test_empty_dataset_has_no_bounds() {
        assert_eq!(Dataset::default().date_bounds(), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let formats = LoadOptions::default().date_formats;
        assert_eq!(parse_date("11/8/2016", &formats), Some(date(2016, 11, 8)));
        assert_eq!(parse_date("2016-11-08", &formats), Some(date(2016, 11, 8)));
        assert_eq!(parse_date("08-11-2016", &formats), Some(date(2016, 11, 8)));
        assert_eq!(parse_date("2016-11-08 13:45:00", &formats), Some(date(2016, 11, 8)));
        assert_eq!(parse_date("", &formats), None);
        assert_eq!(parse_date("13/45/2016", &formats), None);
    }

    #[test]
    fn test_preview_takes_first_rows() {
        let dataset = load(
            "O-1,1/1/2023,C-1,Consumer,Provo,Utah,West,Pen,Office Supplies,Art,1,1,1\n\
             O-2,1/2/2023,C-1,Consumer,Ogden,Utah,West,Pen,Office Supplies,Art,2,1,1\n",
        )
        .unwrap();
        let preview = dataset.all().preview(1);
        assert_eq!(preview.len(), 1);
        assert_eq!(preview[0].city, "Provo");

        let table = preview.to_table();
        assert_eq!(table.columns[0], "Region");
        assert_eq!(table.rows[0][2].to_field(), "Provo");
    }
}
