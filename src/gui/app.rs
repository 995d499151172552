//! Dashboard Main Application
//! Main window with control panel and the four risk panels.

use crate::charts::StaticChartRenderer;
use crate::config::DashboardConfig;
use crate::data::{DataLoader, Dataset, FilterOptions};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::metrics::DashboardView;
use egui::SidePanel;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use tracing::{error, info, warn};

/// CSV loading result from background thread
enum LoadResult {
    Progress(String),
    Complete { path: PathBuf, dataset: Dataset },
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    config: DashboardConfig,
    dataset: Option<Dataset>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let mut app = Self::from_config(config);

        let initial = app.config.dataset_path.clone();
        if initial.exists() {
            app.start_load(initial);
        } else {
            warn!(path = %initial.display(), "default dataset not found");
            app.control_panel
                .set_status("Browse for a dataset to begin");
        }
        app
    }

    fn from_config(config: DashboardConfig) -> Self {
        Self {
            chart_viewer: ChartViewer::new(config.panel_height),
            config,
            dataset: None,
            control_panel: ControlPanel::new(),
            load_rx: None,
            is_loading: false,
        }
    }

    /// Handle CSV file selection.
    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return; // Already loading
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv", "txt"])
            .pick_file()
        {
            self.start_load(path);
        }
    }

    /// Load a dataset on a background thread. Only a successful load
    /// replaces the current dataset, path and view; a failed one leaves
    /// them as they were.
    fn start_load(&mut self, path: PathBuf) {
        let separator = match self.config.separator_byte() {
            Ok(b) => b,
            Err(e) => {
                error!("{}", e);
                self.control_panel.set_status(&format!("Error: {}", e));
                return;
            }
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.control_panel.set_status(&format!("Loading {}...", name));
        self.set_loading(true);

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let _ = tx.send(LoadResult::Progress("Reading CSV file...".to_string()));

            let loader = DataLoader::new(separator);
            match loader.load_csv(&path) {
                Ok(dataset) => {
                    let _ = tx.send(LoadResult::Complete { path, dataset });
                }
                Err(e) => {
                    let _ = tx.send(LoadResult::Error(e.to_string()));
                }
            }
        });
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                if self.handle_load_result(result) {
                    should_keep_receiver = false;
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Apply one message from the loader. Returns true once the load is
    /// finished, successfully or not.
    fn handle_load_result(&mut self, result: LoadResult) -> bool {
        match result {
            LoadResult::Progress(status) => {
                self.control_panel.set_status(&status);
                false
            }
            LoadResult::Complete { path, dataset } => {
                let mut status = format!("Loaded {} rows", dataset.len());
                if dataset.skipped_rows() > 0 {
                    status.push_str(&format!(" ({} skipped)", dataset.skipped_rows()));
                }
                self.control_panel.csv_path = Some(path);
                self.control_panel
                    .update_options(FilterOptions::from_records(dataset.records()));
                self.dataset = Some(dataset);
                self.refresh_view();
                self.control_panel.set_status(&status);
                self.set_loading(false);
                true
            }
            LoadResult::Error(e) => {
                error!("dataset load failed: {}", e);
                self.control_panel.set_status(&format!("Error: {}", e));
                self.set_loading(false);
                true
            }
        }
    }

    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
        self.control_panel.busy = loading;
    }

    fn handle_action(&mut self, action: ControlPanelAction) {
        match action {
            ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
            // Filters stay locked until the running load settles.
            ControlPanelAction::FiltersChanged if self.is_loading => {}
            ControlPanelAction::FiltersChanged => self.refresh_view(),
            ControlPanelAction::ExportPng => self.handle_export_png(),
            ControlPanelAction::ExportSvg => self.handle_export_svg(),
            ControlPanelAction::None => {}
        }
    }

    /// Recompute every panel from the dataset and the current filters.
    fn refresh_view(&mut self) {
        let Some(dataset) = &self.dataset else {
            return;
        };
        let view = DashboardView::build(dataset, &self.control_panel.filters);
        info!(
            filters = ?view.filters,
            rows = view.row_count,
            "filters applied"
        );
        self.control_panel.row_count = view.row_count;
        self.chart_viewer.set_view(view);
    }

    fn current_view(&mut self) -> Option<DashboardView> {
        let view = self.chart_viewer.view.clone();
        if view.is_none() {
            self.control_panel.set_status("No charts to export");
        }
        view
    }

    /// Export the 2x2 dashboard as a bitmap image.
    fn handle_export_png(&mut self) {
        let Some(view) = self.current_view() else {
            return;
        };

        // Ask user for output location
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name("dashboard_riesgo.png")
            .save_file()
        else {
            return; // User cancelled
        };

        match StaticChartRenderer::save_dashboard_image(
            &view,
            self.config.export_dimensions(),
            &path,
        ) {
            Ok(()) => {
                self.control_panel
                    .set_status(&format!("Exported {}", path.display()));
                self.open_export(&path);
            }
            Err(e) => {
                error!("PNG export failed: {}", e);
                self.control_panel.set_status(&format!("Error: {}", e));
            }
        }
    }

    /// Export one SVG per panel into a chosen folder.
    fn handle_export_svg(&mut self) {
        let Some(view) = self.current_view() else {
            return;
        };

        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };

        match StaticChartRenderer::export_panels_svg(&view, self.config.panel_dimensions(), &dir)
        {
            Ok(paths) => {
                self.control_panel.set_status(&format!(
                    "Exported {} panels to {}",
                    paths.len(),
                    dir.display()
                ));
                self.open_export(&dir);
            }
            Err(e) => {
                error!("SVG export failed: {}", e);
                self.control_panel.set_status(&format!("Error: {}", e));
            }
        }
    }

    fn open_export(&self, path: &Path) {
        if !self.config.open_after_export {
            return;
        }
        if let Err(e) = open::that(path) {
            warn!(path = %path.display(), "could not open export: {}", e);
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);
                    self.handle_action(action);
                });
            });

        // Central panel - Dashboard
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        DelinquencyBucket, FilterState, LoanRecord, MonthName, RiskLevel, Selection,
    };
    use chrono::NaiveDate;

    fn dataset(regions: &[&str]) -> Dataset {
        let control_date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let records = regions
            .iter()
            .map(|region| LoanRecord {
                control_date,
                month: MonthName::from_date(control_date),
                region: region.to_string(),
                credit_type: "Consumo".to_string(),
                risk_level: RiskLevel::parse("A. Bajo"),
                bucket: DelinquencyBucket::new("A. Al dia"),
                delinquency_days: 0,
                balance: 100.0,
                standing: "Buenos".to_string(),
            })
            .collect();
        Dataset::new(records, 0)
    }

    fn loaded_app() -> DashboardApp {
        let mut app = DashboardApp::from_config(DashboardConfig::default());
        let done = app.handle_load_result(LoadResult::Complete {
            path: PathBuf::from("cartera_a.csv"),
            dataset: dataset(&["Antioquia", "Cundinamarca"]),
        });
        assert!(done);
        app
    }

    #[test]
    fn failed_reload_keeps_previous_dataset() {
        let mut app = loaded_app();
        let before = app.chart_viewer.view.clone();
        assert!(before.is_some());

        app.set_loading(true);
        let done = app.handle_load_result(LoadResult::Error("bad file".to_string()));

        assert!(done);
        assert!(!app.is_loading);
        assert!(!app.control_panel.busy);
        assert_eq!(app.control_panel.csv_path, Some(PathBuf::from("cartera_a.csv")));
        assert_eq!(app.chart_viewer.view, before);
        assert_eq!(app.dataset.as_ref().map(Dataset::len), Some(2));
        assert!(app.control_panel.status.contains("Error"));
    }

    #[test]
    fn successful_reload_replaces_everything() {
        let mut app = loaded_app();
        app.control_panel.filters.region = Selection::Only("Antioquia".to_string());
        app.handle_action(ControlPanelAction::FiltersChanged);

        app.set_loading(true);
        app.handle_load_result(LoadResult::Complete {
            path: PathBuf::from("cartera_b.csv"),
            dataset: dataset(&["Valle", "Valle", "Huila"]),
        });

        assert_eq!(app.control_panel.csv_path, Some(PathBuf::from("cartera_b.csv")));
        assert_eq!(app.control_panel.filters, FilterState::all());
        assert_eq!(app.control_panel.options.regions, vec!["Huila", "Valle"]);
        assert_eq!(app.chart_viewer.view.as_ref().map(|v| v.row_count), Some(3));
    }

    #[test]
    fn filter_changes_wait_for_load() {
        let mut app = loaded_app();
        app.set_loading(true);
        app.control_panel.filters.region = Selection::Only("Antioquia".to_string());
        app.handle_action(ControlPanelAction::FiltersChanged);

        let view = app.chart_viewer.view.as_ref().unwrap();
        assert_eq!(view.row_count, 2);
        assert_eq!(view.filters, FilterState::all());

        app.set_loading(false);
        app.handle_action(ControlPanelAction::FiltersChanged);
        assert_eq!(app.chart_viewer.view.as_ref().map(|v| v.row_count), Some(1));
    }
}
