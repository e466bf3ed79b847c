mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use anyhow::{anyhow, Context, Result};
use app::DashboardApp;
use clap::Parser;
use config::Cli;
use eframe::egui;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut state = AppState::with_launch_config(cli.launch_config());

    // A file named on the command line must load; failure ends the process.
    if let Some(path) = &cli.data {
        let dataset = data::loader::load_file(path)?;
        state.set_dataset(dataset);
    }

    if cli.print_summary {
        let summary = state
            .summary
            .as_ref()
            .context("dataset has no records to summarize")?;
        println!("{}", summary.to_json()?);
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Air Quality Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow!("dashboard window failed: {e}"))
}
