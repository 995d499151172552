//! Chart Viewer Widget
//! Central scrollable area laying the four panels out in a 2x2 grid.

use crate::charts::{ChartPlotter, PanelId};
use crate::metrics::DashboardView;
use egui::{RichText, ScrollArea};

const CHART_SPACING: f32 = 15.0;

/// Scrollable dashboard area holding the current aggregated view.
#[derive(Default)]
pub struct ChartViewer {
    pub view: Option<DashboardView>,
    pub panel_height: f32,
}

impl ChartViewer {
    pub fn new(panel_height: f32) -> Self {
        Self {
            view: None,
            panel_height,
        }
    }

    pub fn set_view(&mut self, view: DashboardView) {
        self.view = Some(view);
    }

    /// Draw every panel from the current view, two per row.
    pub fn show(&self, ui: &mut egui::Ui) {
        let Some(view) = &self.view else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        if view.row_count == 0 {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("Sin registros para los filtros seleccionados").size(18.0));
            });
            return;
        }

        let height = self.panel_height;
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for row in PanelId::ALL.chunks(2) {
                    ui.columns(row.len(), |columns| {
                        for (col, &panel) in columns.iter_mut().zip(row) {
                            Self::draw_panel_card(col, panel, view, height);
                        }
                    });
                    ui.add_space(CHART_SPACING);
                }
            });
    }

    /// Draw a single panel card with its title.
    fn draw_panel_card(ui: &mut egui::Ui, panel: PanelId, view: &DashboardView, height: f32) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.label(RichText::new(panel.title()).size(16.0).strong());
                    ui.add_space(8.0);
                    ChartPlotter::draw_panel(ui, panel, view, height);
                });
            });
    }
}
