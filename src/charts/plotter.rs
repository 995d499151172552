//! Chart Plotter Module
//! Creates the four interactive dashboard panels using egui_plot.

use crate::charts::style::{self, PanelId};
use crate::metrics::format::{format_cop, format_date, format_icv, format_month_year, format_percent};
use crate::metrics::{
    BucketShareByMonth, DashboardView, DeteriorationByBucket, IcvByRiskLevel, IcvTimeline,
    StackedPanel,
};
use chrono::{Datelike, NaiveDate};
use egui::Color32;
use egui_plot::{
    Bar, BarChart, GridMark, Legend, Line, LineStyle, Plot, PlotPoint, PlotPoints, Points, Text,
};
use std::fmt::Display;

/// Item name carried by the ICV timeline markers, used to scope tooltips.
const TIMELINE_ITEM: &str = "ICV";

/// Creates the dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw one panel from the current view. Each call rebuilds the panel
    /// entirely; the plot id is the panel key so zoom state is per panel.
    pub fn draw_panel(ui: &mut egui::Ui, panel: PanelId, view: &DashboardView, height: f32) {
        match panel {
            PanelId::BucketShare => Self::draw_bucket_share_chart(ui, &view.bucket_share, height),
            PanelId::Deterioration => {
                Self::draw_deterioration_chart(ui, &view.deterioration, height)
            }
            PanelId::IcvByRisk => Self::draw_icv_by_risk_chart(ui, &view.icv_by_risk, height),
            PanelId::IcvTimeline => Self::draw_icv_timeline_chart(ui, &view.icv_timeline, height),
        }
    }

    /// Build one bar chart per category, each stacked on the previous ones.
    fn stacked_bar_charts<K, C: Display>(
        panel: &StackedPanel<K, C>,
        color_for: impl Fn(usize, &C) -> Color32,
        horizontal: bool,
    ) -> Vec<BarChart> {
        let mut charts: Vec<BarChart> = Vec::with_capacity(panel.categories.len());
        let row_count = panel.rows.len();

        for (c_idx, category) in panel.categories.iter().enumerate() {
            let label = category.to_string();
            let color = color_for(c_idx, category);

            let bars: Vec<Bar> = panel
                .rows
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    let fraction = row.shares.get(c_idx).map(|s| s.fraction).unwrap_or(0.0);
                    let slot = style::category_slot(i, row_count, horizontal);
                    Bar::new(slot as f64, fraction).width(0.8).name(&label)
                })
                .collect();

            let tooltip_label = label.clone();
            let mut chart = BarChart::new(bars)
                .name(&label)
                .color(color)
                .element_formatter(Box::new(move |bar, _chart| {
                    format!("{}\n{}", tooltip_label, format_percent(bar.value))
                }));
            if horizontal {
                chart = chart.horizontal();
            }

            let below: Vec<&BarChart> = charts.iter().collect();
            let chart = chart.stack_on(&below);
            charts.push(chart);
        }

        charts
    }

    /// Category label for an integer axis mark, empty between categories.
    fn category_label(labels: &[String], value: f64) -> String {
        let idx = value.round();
        if (value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }

    /// Panel 1: horizontal 100% bars, one per month.
    pub fn draw_bucket_share_chart(ui: &mut egui::Ui, panel: &BucketShareByMonth, height: f32) {
        let months = style::slot_labels(
            panel.rows.iter().map(|r| r.key.to_string()).collect(),
            true,
        );
        let charts = Self::stacked_bar_charts(
            panel,
            |idx, _| style::bucket_color(idx).to_color32(),
            true,
        );

        Plot::new(PanelId::BucketShare.key())
            .height(height)
            .legend(Legend::default())
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .show_x(false)
            .show_y(false)
            .include_x(0.0)
            .include_x(1.0)
            .x_axis_label("% Cantidad - Edad de Mora")
            .x_axis_formatter(|mark, _range| format_percent(mark.value))
            .y_axis_formatter(move |mark, _range| Self::category_label(&months, mark.value))
            .show(ui, |plot_ui| {
                for chart in charts {
                    plot_ui.bar_chart(chart);
                }
            });
    }

    /// Panel 2: vertical 100% bars, good vs bad per bucket.
    pub fn draw_deterioration_chart(
        ui: &mut egui::Ui,
        panel: &DeteriorationByBucket,
        height: f32,
    ) {
        let buckets: Vec<String> = panel.rows.iter().map(|r| r.key.to_string()).collect();
        let charts = Self::stacked_bar_charts(
            panel,
            |idx, standing| style::standing_color(standing, idx).to_color32(),
            false,
        );

        Plot::new(PanelId::Deterioration.key())
            .height(height)
            .legend(Legend::default())
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .show_x(false)
            .show_y(false)
            .include_y(0.0)
            .include_y(1.0)
            .y_axis_formatter(|mark, _range| format_percent(mark.value))
            .x_axis_formatter(move |mark, _range| Self::category_label(&buckets, mark.value))
            .show(ui, |plot_ui| {
                for chart in charts {
                    plot_ui.bar_chart(chart);
                }
            });
    }

    /// Panel 3: one ICV line per risk level across calendar months.
    pub fn draw_icv_by_risk_chart(ui: &mut egui::Ui, data: &IcvByRiskLevel, height: f32) {
        let months: Vec<String> = data.months.iter().map(|m| m.to_string()).collect();
        let tooltip_months = months.clone();

        let series: Vec<(String, Color32, Vec<[f64; 2]>)> = data
            .series
            .iter()
            .enumerate()
            .map(|(idx, s)| {
                let points = s
                    .points
                    .iter()
                    .filter_map(|p| data.month_index(p.month).map(|i| [i as f64, p.icv]))
                    .collect();
                (
                    s.level.label().to_string(),
                    style::risk_color(idx).to_color32(),
                    points,
                )
            })
            .collect();

        Plot::new(PanelId::IcvByRisk.key())
            .height(height)
            .legend(Legend::default())
            .allow_scroll(false)
            .include_y(0.0)
            .include_y(data.max_icv() * 1.1)
            .y_axis_label("ICV (%)")
            .x_axis_formatter(move |mark, _range| Self::category_label(&months, mark.value))
            .label_formatter(move |name, value| {
                if name.is_empty() {
                    return String::new();
                }
                let month = Self::category_label(&tooltip_months, value.x.round());
                format!("Nivel: {}\nMes: {}\nICV: {}", name, month, format_icv(value.y))
            })
            .show(ui, |plot_ui| {
                for (name, color, points) in series {
                    plot_ui.line(
                        Line::new(points.iter().copied().collect::<PlotPoints>())
                            .color(color)
                            .width(2.0)
                            .name(&name),
                    );
                    plot_ui.points(
                        Points::new(points.into_iter().collect::<PlotPoints>())
                            .radius(4.0)
                            .filled(false)
                            .color(color)
                            .name(&name),
                    );
                }
            });
    }

    fn date_to_x(date: NaiveDate) -> f64 {
        date.num_days_from_ce() as f64
    }

    fn x_to_date(x: f64) -> Option<NaiveDate> {
        NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
    }

    /// Panel 4: ICV over control dates with scaled, coloured markers.
    pub fn draw_icv_timeline_chart(ui: &mut egui::Ui, data: &IcvTimeline, height: f32) {
        let max_icv = data.max_icv();
        let label_offset = (max_icv * 0.06).max(0.5);
        let tick_values: Vec<f64> = data.points.iter().map(|p| Self::date_to_x(p.date)).collect();
        let tooltip_points = data.points.clone();
        let points = data.points.clone();

        Plot::new(PanelId::IcvTimeline.key())
            .height(height)
            .allow_scroll(false)
            .include_y(0.0)
            .include_y(max_icv * 1.15)
            .y_axis_label("ICV (%)")
            .x_grid_spacer(move |_input| {
                tick_values
                    .iter()
                    .map(|&value| GridMark {
                        value,
                        step_size: 30.0,
                    })
                    .collect()
            })
            .x_axis_formatter(|mark, _range| {
                Self::x_to_date(mark.value)
                    .map(format_month_year)
                    .unwrap_or_default()
            })
            .label_formatter(move |name, value| {
                if name != TIMELINE_ITEM {
                    return String::new();
                }
                let nearest = tooltip_points.iter().min_by(|a, b| {
                    let da = (Self::date_to_x(a.date) - value.x).abs();
                    let db = (Self::date_to_x(b.date) - value.x).abs();
                    da.total_cmp(&db)
                });
                match nearest {
                    Some(p) => format!(
                        "Fecha: {}\nICV: {}\nSaldo Total en Mora: {}\nSaldo Total Mensual: {}",
                        format_date(p.date),
                        format_icv(p.icv),
                        format_cop(p.delinquent_balance),
                        format_cop(p.total_balance)
                    ),
                    None => String::new(),
                }
            })
            .show(ui, |plot_ui| {
                let guide = style::GUIDE_LINE.to_color32();
                for p in &points {
                    let x = Self::date_to_x(p.date);
                    plot_ui.line(
                        Line::new(PlotPoints::from(vec![[x, 0.0], [x, p.icv]]))
                            .color(guide)
                            .width(1.0)
                            .style(LineStyle::dashed_dense()),
                    );
                }

                let line: PlotPoints = points
                    .iter()
                    .map(|p| [Self::date_to_x(p.date), p.icv])
                    .collect();
                plot_ui.line(
                    Line::new(line)
                        .color(style::TIMELINE_LINE.to_color32())
                        .width(2.0)
                        .name(TIMELINE_ITEM),
                );

                for p in &points {
                    let x = Self::date_to_x(p.date);
                    plot_ui.points(
                        Points::new(PlotPoints::from(vec![[x, p.icv]]))
                            .radius(style::icv_radius(p.icv, max_icv) as f32)
                            .filled(true)
                            .color(style::icv_color(p.icv).to_color32())
                            .name(TIMELINE_ITEM),
                    );
                    plot_ui.text(
                        Text::new(PlotPoint::new(x, p.icv + label_offset), format_icv(p.icv))
                            .color(Color32::BLACK),
                    );
                }
            });
    }
}
