use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

/// Command line of the dashboard.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "air-quality-dashboard")]
#[command(about = "Station averages and monthly pollutant trends for an air quality dataset", long_about = None)]
pub struct Cli {
    /// Dataset to load at startup (.csv, .json or .parquet)
    #[arg(value_name = "DATA_FILE")]
    pub data: Option<PathBuf>,

    /// Station to select initially (default: first station in the file)
    #[arg(short, long)]
    pub station: Option<String>,

    /// First day of the range, YYYY-MM-DD (default: earliest date in the file)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day of the range, YYYY-MM-DD (default: latest date in the file)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Print the summary for the selection as JSON and exit without a window
    #[arg(long, requires = "data")]
    pub print_summary: bool,
}

impl Cli {
    pub fn launch_config(&self) -> LaunchConfig {
        LaunchConfig {
            station: self.station.clone(),
            start: self.start,
            end: self.end,
        }
    }
}

/// Initial selection overrides applied when a dataset is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchConfig {
    pub station: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}
