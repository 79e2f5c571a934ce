//! Space Mining Visualization - Mining site dashboard
//!
//! Loads a table of simulated mining sites and draws exploratory charts for a
//! chosen set of numeric columns.

mod charts;
mod config;
mod data;
mod gui;
mod page;
mod report;
mod stats;

use anyhow::Context;
use config::DashboardConfig;
use eframe::egui;
use gui::MiningDashboardApp;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::load().context("Failed to load dashboard configuration")?;
    log::info!("Starting dashboard with dataset {}", config.dataset_path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 700.0])
            .with_title("Mining Site Visualization"),
        ..Default::default()
    };

    eframe::run_native(
        "Space Mining Visualization",
        options,
        Box::new(|cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(MiningDashboardApp::new(cc, config)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("GUI failed: {e}"))
}
