//! Options command implementation.

use salesboard_core::FilterOptions;

use crate::colors;
use crate::dataset_args::DatasetArgs;

/// Print the location choices for the current selection.
pub fn execute(args: &DatasetArgs) -> anyhow::Result<()> {
    let dataset = args.load()?;
    let selection = args.selection(&dataset)?;
    let base = dataset.slice_dates(selection.date_lower, selection.date_upper);
    let options = FilterOptions::derive(&base, &selection);

    if let Some((min, max)) = dataset.date_bounds() {
        println!("{}Dates:{} {} to {}", colors::BOLD, colors::RESET, min, max);
    }
    print_list("Regions", &options.regions);
    print_list("States", &options.states);
    print_list("Cities", &options.cities);
    Ok(())
}

fn print_list(title: &str, values: &[String]) {
    println!("{}{} ({}):{}", colors::BOLD, title, values.len(), colors::RESET);
    for value in values {
        println!("  {}", value);
    }
}
