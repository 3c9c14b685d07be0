//! Arguments shared by commands that read a dataset.

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;
use salesboard_core::{Dataset, FilterSelection, LoadOptions};

/// Input file, parsing options and the filter selection.
#[derive(Debug, Clone, Args)]
pub struct DatasetArgs {
    /// Sales file (.csv, .txt, .xlsx, .xls, .xlsm, .xlsb, .ods)
    pub file: PathBuf,

    /// Field delimiter for delimited text
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    /// First order date to include (YYYY-MM-DD, default: earliest in file)
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Last order date to include (YYYY-MM-DD, default: latest in file)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Keep only this region (repeatable)
    #[arg(long = "region", value_name = "REGION")]
    pub regions: Vec<String>,

    /// Keep only this state (repeatable)
    #[arg(long = "state", value_name = "STATE")]
    pub states: Vec<String>,

    /// Keep only this city (repeatable)
    #[arg(long = "city", value_name = "CITY")]
    pub cities: Vec<String>,
}

impl DatasetArgs {
    pub fn load_options(&self) -> anyhow::Result<LoadOptions> {
        if !self.delimiter.is_ascii() {
            anyhow::bail!("Delimiter must be a single ASCII character: {:?}", self.delimiter);
        }
        Ok(LoadOptions {
            delimiter: self.delimiter as u8,
            ..LoadOptions::default()
        })
    }

    /// Read and preprocess the input file.
    pub fn load(&self) -> anyhow::Result<Dataset> {
        if !self.file.exists() {
            anyhow::bail!("File not found: {}", self.file.display());
        }
        let dataset = Dataset::load(&self.file, &self.load_options()?)
            .with_context(|| format!("Failed to load {}", self.file.display()))?;
        Ok(dataset)
    }

    /// Selection from the flags, with missing dates taken from the dataset bounds.
    pub fn selection(&self, dataset: &Dataset) -> anyhow::Result<FilterSelection> {
        let bounds = dataset.date_bounds();
        let lower = self.from.or(bounds.map(|(lower, _)| lower));
        let upper = self.to.or(bounds.map(|(_, upper)| upper));
        let (Some(lower), Some(upper)) = (lower, upper) else {
            anyhow::bail!("No rows with a valid order date; pass --from and --to");
        };

        Ok(FilterSelection::new(lower, upper)
            .with_regions(self.regions.iter().cloned())
            .with_states(self.states.iter().cloned())
            .with_cities(self.cities.iter().cloned()))
    }
}
