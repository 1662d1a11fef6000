mod analysis;
mod app;
mod color;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use app::MeatDashApp;
use clap::Parser;
use eframe::egui;
use state::AppState;

/// Farm meat production time-series dashboard.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Production records (.csv, .json or .parquet)
    #[arg(long, env = "MEAT_DASH_DATA", default_value = "df_combined_sorted_nonzero.csv")]
    data: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let dataset = data::cache::load_cached(&args.data)
        .with_context(|| format!("loading {}", args.data.display()))
        .inspect_err(|e| log::error!("{e:#}"))?;
    let state = AppState::new(dataset, args.data);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Farm Meat Production",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::light());
            Ok(Box::new(MeatDashApp::new(state)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("UI error: {e}"))
}
