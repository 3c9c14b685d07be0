//! Export command implementation.
//!
//! Writes one dashboard table as CSV.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use salesboard_core::{DashboardConfig, DashboardTable, filter_dataset, write_csv};

use crate::colors;
use crate::dataset_args::DatasetArgs;

/// Export `table` under the selection; the default output is the table's download name.
pub fn execute(
    args: &DatasetArgs,
    table: &str,
    output: Option<PathBuf>,
    config: &DashboardConfig,
) -> anyhow::Result<()> {
    let table: DashboardTable = table.parse()?;
    let dataset = args.load()?;
    let selection = args.selection(&dataset)?;
    let rows = filter_dataset(&dataset, &selection);

    let data = table
        .build(&dataset, &rows, config)
        .with_context(|| format!("Cannot export {}", table))?;

    let path = output.unwrap_or_else(|| PathBuf::from(table.file_name()));
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(&data, BufWriter::new(file))?;

    println!(
        "{}Wrote{} {} rows to {}",
        colors::GREEN,
        colors::RESET,
        data.len(),
        path.display()
    );
    Ok(())
}
