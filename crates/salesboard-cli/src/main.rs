//! Salesboard CLI - cascading filters and sales aggregates from the terminal.

mod colors;
mod dataset_args;
mod export;
mod options;
mod serve;
mod summary;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use salesboard_core::DashboardConfig;

use crate::dataset_args::DatasetArgs;

#[derive(Parser)]
#[command(name = "salesboard")]
#[command(about = "Interactive sales dashboard engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print KPIs and every aggregate table
    Summary {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Number of cities and products in the rankings
        #[arg(long, default_value = "10")]
        top: usize,

        /// Number of preview rows
        #[arg(long, default_value = "5")]
        preview: usize,
    },

    /// Print the cascading region, state and city choices
    Options {
        #[command(flatten)]
        dataset: DatasetArgs,
    },

    /// Write one table as CSV
    Export {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Table to export (filtered, dataset, category, top_cities, time_series,
        /// segment, category_share, region, sub_category_month, top_products,
        /// category_margin, hierarchy)
        #[arg(short, long)]
        table: String,

        /// Output path (default: the table's download file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start the dashboard server
    Serve {
        /// Host address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Largest accepted upload in MiB
        #[arg(long, default_value = "64")]
        max_upload_mb: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Summary {
            dataset,
            top,
            preview,
        } => {
            let config = DashboardConfig {
                top_cities: top,
                top_products: top,
                preview_rows: preview,
            };
            summary::execute(&dataset, &config)?;
        }

        Commands::Options { dataset } => options::execute(&dataset)?,

        Commands::Export {
            dataset,
            table,
            output,
        } => {
            export::execute(&dataset, &table, output, &DashboardConfig::default())?;
        }

        Commands::Serve {
            host,
            port,
            max_upload_mb,
        } => {
            serve::execute(host, port, max_upload_mb, DashboardConfig::default()).await?;
        }
    }

    Ok(())
}
