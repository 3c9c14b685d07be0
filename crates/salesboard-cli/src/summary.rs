//! Summary command implementation.
//!
//! Prints the KPIs and every aggregate table for the filtered rows.

use salesboard_core::{Dashboard, DashboardConfig, DashboardTable, Render, ToTable, filter};

use crate::colors;
use crate::dataset_args::DatasetArgs;

/// Print the dashboard for a file.
pub fn execute(args: &DatasetArgs, config: &DashboardConfig) -> anyhow::Result<()> {
    let dataset = args.load()?;
    let selection = args.selection(&dataset)?;

    let base = dataset.slice_dates(selection.date_lower, selection.date_upper);
    let rows = filter::apply(&base, &selection);
    let dashboard = Dashboard::compute(&rows, config);

    println!(
        "\n{}Salesboard{} - {}",
        colors::BOLD,
        colors::RESET,
        args.file.display()
    );
    println!("{}", "─".repeat(50));
    println!(
        "{}  ◆ Rows:{} {} loaded, {} dropped for invalid dates",
        colors::CYAN,
        colors::RESET,
        dataset.len(),
        dataset.dropped_rows()
    );
    println!(
        "{}  ◆ Dates:{} {} to {}",
        colors::CYAN,
        colors::RESET,
        selection.date_lower,
        selection.date_upper
    );
    println!(
        "{}  ◆ Filtered:{} {} of {} rows in range",
        colors::CYAN,
        colors::RESET,
        rows.len(),
        base.len()
    );
    println!("{}", "─".repeat(50));
    print!("{}", dashboard.kpis.render_text());

    print_section("Preview", &base.preview(config.preview_rows).to_table().render_text());

    for table in DashboardTable::ALL {
        if matches!(table, DashboardTable::Filtered | DashboardTable::Dataset) {
            continue;
        }
        match dashboard.table(table) {
            Some(data) if !data.is_empty() => print_section(table.title(), &data.render_text()),
            Some(_) => print_note(table.title(), "no rows match the current filters"),
            None => print_note(table.title(), "the file has no Product Name column"),
        }
    }

    Ok(())
}

fn print_section(title: &str, body: &str) {
    println!("\n{}{}{}", colors::BOLD, title, colors::RESET);
    print!("{}", body);
}

fn print_note(title: &str, note: &str) {
    println!("\n{}{}{}", colors::BOLD, title, colors::RESET);
    println!("{}({}){}", colors::DIM, note, colors::RESET);
}
