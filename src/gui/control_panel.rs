//! Control Panel Widget
//! Left side panel with the data source, the three filters and exports.

use crate::data::{FilterOptions, FilterState, MonthName, Selection, ALL_LABEL};
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// Left side control panel with file selection and filter controls.
pub struct ControlPanel {
    pub csv_path: Option<PathBuf>,
    pub filters: FilterState,
    pub options: FilterOptions,
    pub row_count: usize,
    pub status: String,
    pub export_enabled: bool,
    /// Set while a dataset is loading; locks the source and filters.
    pub busy: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            csv_path: None,
            filters: FilterState::all(),
            options: FilterOptions::default(),
            row_count: 0,
            status: "Ready".to_string(),
            export_enabled: false,
            busy: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the drop-down values after a load and reset every filter.
    pub fn update_options(&mut self, options: FilterOptions) {
        self.options = options;
        self.filters = FilterState::all();
        self.export_enabled = true;
    }

    /// One filter drop-down with "Todos" first. Returns true on change.
    fn filter_combo<T: Clone + PartialEq + ToString>(
        ui: &mut egui::Ui,
        id: &str,
        label: &str,
        selection: &mut Selection<T>,
        values: &[T],
    ) -> bool {
        let mut changed = false;
        ui.horizontal(|ui| {
            ui.add_sized([110.0, 20.0], egui::Label::new(label));
            ComboBox::from_id_salt(id)
                .width(160.0)
                .selected_text(match selection {
                    Selection::All => ALL_LABEL.to_string(),
                    Selection::Only(v) => v.to_string(),
                })
                .show_ui(ui, |ui| {
                    if ui.selectable_label(selection.is_all(), ALL_LABEL).clicked()
                        && !selection.is_all()
                    {
                        *selection = Selection::All;
                        changed = true;
                    }
                    for value in values {
                        let selected = matches!(selection, Selection::Only(v) if v == value);
                        if ui.selectable_label(selected, value.to_string()).clicked() && !selected
                        {
                            *selection = Selection::Only(value.clone());
                            changed = true;
                        }
                    }
                });
        });
        changed
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📊 Riesgo Crediticio")
                    .size(22.0)
                    .color(Color32::from_rgb(94, 129, 172)),
            );
            ui.label(
                RichText::new("Mora, deterioro e ICV")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Datos").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    let path_color = if self.csv_path.is_some() {
                        ui.visuals().text_color()
                    } else {
                        Color32::GRAY
                    };
                    ui.label(RichText::new(&path_text).size(12.0).color(path_color));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.add_enabled(!self.busy, egui::Button::new("📂 Browse")).clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filters Section =====
        ui.label(RichText::new("🔧 Filtros").size(14.0).strong());
        ui.add_space(8.0);

        let mut changed = false;
        ui.add_enabled_ui(!self.busy, |ui| {
            changed |= Self::filter_combo::<MonthName>(
                ui,
                "sel-mes",
                "Mes:",
                &mut self.filters.month,
                &self.options.months,
            );
            ui.add_space(5.0);
            changed |= Self::filter_combo(
                ui,
                "sel-depto",
                "Departamento:",
                &mut self.filters.region,
                &self.options.regions,
            );
            ui.add_space(5.0);
            changed |= Self::filter_combo(
                ui,
                "sel-tipo",
                "Tipo de crédito:",
                &mut self.filters.credit_type,
                &self.options.credit_types,
            );

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.small_button("Limpiar filtros").clicked()
                    && self.filters != FilterState::all()
                {
                    self.filters = FilterState::all();
                    changed = true;
                }
                ui.label(
                    RichText::new(format!("{} registros", self.row_count))
                        .size(11.0)
                        .color(Color32::GRAY),
                );
            });
        });

        if changed {
            action = ControlPanelAction::FiltersChanged;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled, |ui| {
                let png_button = egui::Button::new(RichText::new("🖼 Export PNG").size(14.0))
                    .min_size(egui::vec2(180.0, 30.0));
                if ui.add(png_button).clicked() {
                    action = ControlPanelAction::ExportPng;
                }

                ui.add_space(8.0);

                let svg_button = egui::Button::new(RichText::new("📄 Export SVG").size(14.0))
                    .min_size(egui::vec2(180.0, 30.0));
                if ui.add(svg_button).clicked() {
                    action = ControlPanelAction::ExportSvg;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.starts_with("Loaded") || self.status.starts_with("Exported") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    FiltersChanged,
    ExportPng,
    ExportSvg,
}
