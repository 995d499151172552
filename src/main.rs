//! Cartera Riesgo - Credit-Risk Dashboard
//!
//! Native window with four cross-filtered risk panels.

use cartera_riesgo::config::{DashboardConfig, CONFIG_FILE};
use cartera_riesgo::gui::DashboardApp;
use eframe::egui;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    info!("Cartera Riesgo v{}", env!("CARGO_PKG_VERSION"));

    let config = DashboardConfig::load_or_default(Path::new(CONFIG_FILE));

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([1000.0, 650.0])
            .with_title("Análisis de Riesgo Crediticio"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Cartera Riesgo",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to start dashboard: {e}"))
}
