//! CSV output of tables and row sets.

use std::io::Write;

use crate::dataset::RowSet;
use crate::error::Result;
use crate::model::{Columns, Row, column};
use crate::table::{Cell, Table};

/// Date format used for `Order Date` in exported rows.
pub const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Write `table` as comma-separated UTF-8 with a header row.
///
/// Numbers are written raw; `Null` cells become empty fields.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&table.columns)?;
    for row in &table.rows {
        out.write_record(row.iter().map(Cell::to_field))?;
    }
    out.flush()?;
    Ok(())
}

/// [`write_csv`] into a string.
pub fn to_csv_string(table: &Table) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Rows as a table with canonical headers; optional columns only when present.
pub fn rows_table<'a>(rows: impl IntoIterator<Item = &'a Row>, columns: Columns) -> Table {
    let mut headers = Vec::with_capacity(13);
    if columns.order_id {
        headers.push(column::ORDER_ID);
    }
    headers.push(column::ORDER_DATE);
    if columns.customer_id {
        headers.push(column::CUSTOMER_ID);
    }
    headers.extend([
        column::SEGMENT,
        column::CITY,
        column::STATE,
        column::REGION,
    ]);
    if columns.product_name {
        headers.push(column::PRODUCT_NAME);
    }
    headers.extend([
        column::CATEGORY,
        column::SUB_CATEGORY,
        column::SALES,
        column::QUANTITY,
        column::PROFIT,
    ]);

    let mut table = Table::new(headers);
    for row in rows {
        let mut cells: Vec<Cell> = Vec::with_capacity(table.columns.len());
        if columns.order_id {
            cells.push(optional(&row.order_id));
        }
        cells.push(row.order_date.format(EXPORT_DATE_FORMAT).to_string().into());
        if columns.customer_id {
            cells.push(optional(&row.customer_id));
        }
        cells.extend([
            Cell::from(row.segment.as_str()),
            row.city.as_str().into(),
            row.state.as_str().into(),
            row.region.as_str().into(),
        ]);
        if columns.product_name {
            cells.push(optional(&row.product_name));
        }
        cells.extend([
            Cell::from(row.category.as_str()),
            row.sub_category.as_str().into(),
            row.sales.into(),
            row.quantity.into(),
            row.profit.into(),
        ]);
        table.push(cells);
    }
    table
}

/// [`rows_table`] over a filtered view.
pub fn row_set_table(rows: &RowSet<'_>) -> Table {
    rows_table(rows.iter(), rows.columns())
}

fn optional(value: &Option<String>) -> Cell {
    value.as_deref().map(Cell::from).unwrap_or(Cell::Null)
}
