//! Static Chart Renderer
//! Draws the dashboard panels with plotters for SVG and PNG export.
//!
//! Layout of a full dashboard export is a 2x2 grid:
//! 1. Delinquency distribution per month | 2. Deterioration per bucket
//! 3. ICV per risk level                 | 4. ICV timeline

use crate::charts::style::{self, PanelId};
use crate::metrics::format::{format_icv, format_month_year, format_percent};
use crate::metrics::{DashboardView, IcvByRiskLevel, IcvTimeline, StackedPanel};
use chrono::{Duration, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const FONT: &str = "sans-serif";
const TITLE_SIZE: u32 = 16;
const LABEL_SIZE: u32 = 12;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Invalid image size {0}x{1}")]
    InvalidSize(u32, u32),
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn draw_err<E: Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

/// Label of a segmented axis position, empty outside the categories.
fn segment_label(labels: &[String], value: &SegmentValue<i32>) -> String {
    match value {
        SegmentValue::CenterOf(idx) | SegmentValue::Exact(idx) => usize::try_from(*idx)
            .ok()
            .and_then(|i| labels.get(i).cloned())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render a single panel to an SVG document.
    pub fn render_panel_svg(
        panel: PanelId,
        view: &DashboardView,
        size: (u32, u32),
    ) -> Result<String, RenderError> {
        Self::check_size(size)?;
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
            Self::draw_panel(&root, panel, view)?;
            root.present().map_err(draw_err)?;
        }
        Ok(svg)
    }

    /// Render all four panels into one 2x2 SVG document.
    pub fn render_dashboard_svg(
        view: &DashboardView,
        size: (u32, u32),
    ) -> Result<String, RenderError> {
        Self::check_size(size)?;
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
            Self::draw_dashboard(&root, view)?;
            root.present().map_err(draw_err)?;
        }
        Ok(svg)
    }

    /// Render all four panels into an RGB image.
    pub fn render_dashboard_image(
        view: &DashboardView,
        size: (u32, u32),
    ) -> Result<image::RgbImage, RenderError> {
        Self::check_size(size)?;
        let (width, height) = size;
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
            Self::draw_dashboard(&root, view)?;
            root.present().map_err(draw_err)?;
        }
        image::RgbImage::from_raw(width, height, buffer)
            .ok_or(RenderError::InvalidSize(width, height))
    }

    /// Render the dashboard and save it; the format follows the extension.
    pub fn save_dashboard_image(
        view: &DashboardView,
        size: (u32, u32),
        path: &Path,
    ) -> Result<(), RenderError> {
        let img = Self::render_dashboard_image(view, size)?;
        img.save(path)?;
        info!(path = %path.display(), "dashboard image exported");
        Ok(())
    }

    /// Write one `<panel key>.svg` per panel into `dir`.
    pub fn export_panels_svg(
        view: &DashboardView,
        panel_size: (u32, u32),
        dir: &Path,
    ) -> Result<Vec<PathBuf>, RenderError> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(PanelId::ALL.len());
        for panel in PanelId::ALL {
            let svg = Self::render_panel_svg(panel, view, panel_size)?;
            let path = dir.join(format!("{}.svg", panel.key()));
            fs::write(&path, svg)?;
            debug!(path = %path.display(), "panel exported");
            written.push(path);
        }
        info!(count = written.len(), dir = %dir.display(), "panels exported");
        Ok(written)
    }

    fn check_size((width, height): (u32, u32)) -> Result<(), RenderError> {
        if width < 100 || height < 100 {
            return Err(RenderError::InvalidSize(width, height));
        }
        Ok(())
    }

    fn draw_dashboard<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        view: &DashboardView,
    ) -> Result<(), RenderError> {
        root.fill(&WHITE).map_err(draw_err)?;
        let areas = root.split_evenly((2, 2));
        for (area, panel) in areas.iter().zip(PanelId::ALL) {
            Self::draw_panel(area, panel, view)?;
        }
        Ok(())
    }

    /// Draw one panel onto an area, replacing whatever was there.
    pub fn draw_panel<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        panel: PanelId,
        view: &DashboardView,
    ) -> Result<(), RenderError> {
        area.fill(&WHITE).map_err(draw_err)?;
        match panel {
            PanelId::BucketShare => Self::draw_stacked(
                area,
                panel,
                &view.bucket_share,
                |idx, _| style::bucket_color(idx),
                true,
            ),
            PanelId::Deterioration => Self::draw_stacked(
                area,
                panel,
                &view.deterioration,
                |idx, standing: &String| style::standing_color(standing, idx),
                false,
            ),
            PanelId::IcvByRisk => Self::draw_icv_by_risk(area, &view.icv_by_risk),
            PanelId::IcvTimeline => Self::draw_icv_timeline(area, &view.icv_timeline),
        }
    }

    fn draw_empty<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        panel: PanelId,
    ) -> Result<(), RenderError> {
        let body = area
            .titled(panel.title(), (FONT, TITLE_SIZE))
            .map_err(draw_err)?;
        let (w, h) = body.dim_in_pixel();
        body.draw(&Text::new(
            "Sin datos",
            (w as i32 / 2 - 25, h as i32 / 2),
            (FONT, LABEL_SIZE),
        ))
        .map_err(draw_err)?;
        Ok(())
    }

    /// 100% stacked bars; horizontal bars put the keys on the y axis.
    fn draw_stacked<DB: DrawingBackend, K: Display, C: Display>(
        area: &DrawingArea<DB, Shift>,
        panel: PanelId,
        data: &StackedPanel<K, C>,
        color_for: impl Fn(usize, &C) -> style::Rgb,
        horizontal: bool,
    ) -> Result<(), RenderError> {
        if data.rows.is_empty() {
            return Self::draw_empty(area, panel);
        }

        let row_count = data.rows.len();
        let labels = style::slot_labels(
            data.rows.iter().map(|r| r.key.to_string()).collect(),
            horizontal,
        );
        let n = row_count as i32;
        let slot = |i: usize| style::category_slot(i, row_count, horizontal) as i32;
        let percent = |v: &f64| format_percent(*v);
        let category = |v: &SegmentValue<i32>| segment_label(&labels, v);

        let mut builder = ChartBuilder::on(area);
        builder
            .caption(panel.title(), (FONT, TITLE_SIZE))
            .margin(10)
            .x_label_area_size(35);

        if horizontal {
            let mut chart = builder
                .y_label_area_size(90)
                .build_cartesian_2d(0f64..1f64, (0..n).into_segmented())
                .map_err(draw_err)?;
            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(6)
                .x_label_formatter(&percent)
                .y_label_formatter(&category)
                .x_desc("% Cantidad - Edad de Mora")
                .draw()
                .map_err(draw_err)?;

            for (c_idx, cat) in data.categories.iter().enumerate() {
                let color = color_for(c_idx, cat).to_plotters();
                chart
                    .draw_series(data.rows.iter().enumerate().filter_map(|(i, row)| {
                        let (_, start, end) = row.segments().get(c_idx).copied()?;
                        let mut bar = Rectangle::new(
                            [
                                (start, SegmentValue::Exact(slot(i))),
                                (end, SegmentValue::Exact(slot(i) + 1)),
                            ],
                            color.filled(),
                        );
                        bar.set_margin(4, 4, 0, 0);
                        Some(bar)
                    }))
                    .map_err(draw_err)?
                    .label(cat.to_string())
                    .legend(move |(x, y)| {
                        Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                    });
            }

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .position(SeriesLabelPosition::LowerRight)
                .draw()
                .map_err(draw_err)?;
        } else {
            let mut chart = builder
                .y_label_area_size(50)
                .build_cartesian_2d((0..n).into_segmented(), 0f64..1f64)
                .map_err(draw_err)?;
            chart
                .configure_mesh()
                .disable_mesh()
                .y_labels(6)
                .y_label_formatter(&percent)
                .x_label_formatter(&category)
                .draw()
                .map_err(draw_err)?;

            for (c_idx, cat) in data.categories.iter().enumerate() {
                let color = color_for(c_idx, cat).to_plotters();
                chart
                    .draw_series(data.rows.iter().enumerate().filter_map(|(i, row)| {
                        let (_, start, end) = row.segments().get(c_idx).copied()?;
                        let mut bar = Rectangle::new(
                            [
                                (SegmentValue::Exact(slot(i)), end),
                                (SegmentValue::Exact(slot(i) + 1), start),
                            ],
                            color.filled(),
                        );
                        bar.set_margin(0, 0, 6, 6);
                        Some(bar)
                    }))
                    .map_err(draw_err)?
                    .label(cat.to_string())
                    .legend(move |(x, y)| {
                        Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                    });
            }

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .position(SeriesLabelPosition::UpperRight)
                .draw()
                .map_err(draw_err)?;
        }

        Ok(())
    }

    fn draw_icv_by_risk<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        data: &IcvByRiskLevel,
    ) -> Result<(), RenderError> {
        if data.series.is_empty() {
            return Self::draw_empty(area, PanelId::IcvByRisk);
        }

        let months: Vec<String> = data.months.iter().map(|m| m.to_string()).collect();
        let n = months.len() as i32;
        let y_max = Self::nice_max(data.max_icv());
        let category = |v: &SegmentValue<i32>| segment_label(&months, v);

        let mut chart = ChartBuilder::on(area)
            .caption(PanelId::IcvByRisk.title(), (FONT, TITLE_SIZE))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(50)
            .build_cartesian_2d((0..n).into_segmented(), 0f64..y_max)
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&category)
            .y_desc("ICV (%)")
            .draw()
            .map_err(draw_err)?;

        for (idx, series) in data.series.iter().enumerate() {
            let color = style::risk_color(idx).to_plotters();
            let points: Vec<(SegmentValue<i32>, f64)> = series
                .points
                .iter()
                .filter_map(|p| {
                    data.month_index(p.month)
                        .map(|i| (SegmentValue::CenterOf(i as i32), p.icv))
                })
                .collect();

            chart
                .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
                .map_err(draw_err)?
                .label(series.level.label())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
            chart
                .draw_series(points.into_iter().map(|p| {
                    EmptyElement::at(p)
                        + Circle::new((0, 0), 4, WHITE.filled())
                        + Circle::new((0, 0), 4, color.stroke_width(2))
                }))
                .map_err(draw_err)?;
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperRight)
            .draw()
            .map_err(draw_err)?;
        Ok(())
    }

    fn draw_icv_timeline<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        data: &IcvTimeline,
    ) -> Result<(), RenderError> {
        let (Some(first), Some(last)) = (data.points.first(), data.points.last()) else {
            return Self::draw_empty(area, PanelId::IcvTimeline);
        };

        let max_icv = data.max_icv();
        let y_max = Self::nice_max(max_icv * 1.1);
        let x_range: std::ops::Range<NaiveDate> =
            (first.date - Duration::days(15))..(last.date + Duration::days(15));
        let date_label = |d: &NaiveDate| format_month_year(*d);

        let mut chart = ChartBuilder::on(area)
            .caption(PanelId::IcvTimeline.title(), (FONT, TITLE_SIZE))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range, 0f64..y_max)
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(data.points.len().clamp(2, 12))
            .x_label_formatter(&date_label)
            .y_desc("ICV (%)")
            .draw()
            .map_err(draw_err)?;

        let guide = style::GUIDE_LINE.to_plotters();
        chart
            .draw_series(
                data.points
                    .iter()
                    .map(|p| PathElement::new(vec![(p.date, 0.0), (p.date, p.icv)], guide)),
            )
            .map_err(draw_err)?;

        chart
            .draw_series(LineSeries::new(
                data.points.iter().map(|p| (p.date, p.icv)),
                style::TIMELINE_LINE.to_plotters().stroke_width(2),
            ))
            .map_err(draw_err)?;

        chart
            .draw_series(data.points.iter().map(|p| {
                let radius = style::icv_radius(p.icv, max_icv).round() as i32;
                let color = style::icv_color(p.icv).to_plotters();
                EmptyElement::at((p.date, p.icv))
                    + Circle::new((0, 0), radius.max(1), color.filled())
                    + Text::new(format_icv(p.icv), (-18, -18), (FONT, LABEL_SIZE))
            }))
            .map_err(draw_err)?;

        Ok(())
    }

    /// Round an axis maximum up to 1, 2, 5 or 10 times a power of ten.
    fn nice_max(value: f64) -> f64 {
        if value <= 0.0 || !value.is_finite() {
            return 1.0;
        }
        let magnitude = 10f64.powf(value.log10().floor());
        let normalized = value / magnitude;

        let nice = if normalized <= 1.0 {
            1.0
        } else if normalized <= 2.0 {
            2.0
        } else if normalized <= 5.0 {
            5.0
        } else {
            10.0
        };

        nice * magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, DelinquencyBucket, FilterState, LoanRecord, MonthName, RiskLevel};

    fn sample_view() -> DashboardView {
        let loan = |month: u32, risk: &str, bucket: &str, days: i64, balance: f64| {
            let control_date = NaiveDate::from_ymd_opt(2024, month, 28).unwrap();
            LoanRecord {
                control_date,
                month: MonthName::from_date(control_date),
                region: "Antioquia".to_string(),
                credit_type: "Consumo".to_string(),
                risk_level: RiskLevel::parse(risk),
                bucket: DelinquencyBucket::new(bucket),
                delinquency_days: days,
                balance,
                standing: if days > 30 { "Malos" } else { "Buenos" }.to_string(),
            }
        };
        let dataset = Dataset::new(
            vec![
                loan(1, "A. Bajo", "A. Al dia", 0, 1_000_000.0),
                loan(1, "B. Medio", "B. 1 - 30 dias", 12, 250_000.0),
                loan(2, "A. Bajo", "A. Al dia", 0, 800_000.0),
                loan(2, "C. Alto", "C. 31 - 60 dias", 45, 400_000.0),
                loan(3, "B. Medio", "A. Al dia", 0, 600_000.0),
            ],
            0,
        );
        DashboardView::build(&dataset, &FilterState::all())
    }

    #[test]
    fn nice_max_rounds_up() {
        assert_eq!(StaticChartRenderer::nice_max(0.0), 1.0);
        assert_eq!(StaticChartRenderer::nice_max(7.3), 10.0);
        assert_eq!(StaticChartRenderer::nice_max(42.0), 50.0);
        assert_eq!(StaticChartRenderer::nice_max(100.0), 100.0);
    }

    #[test]
    fn segment_labels() {
        let labels = vec!["Enero".to_string(), "Febrero".to_string()];
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(1)), "Febrero");
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(5)), "");
        assert_eq!(segment_label(&labels, &SegmentValue::Last), "");
    }

    #[test]
    fn dashboard_svg_is_repeatable_and_titled() {
        let view = sample_view();
        let first = StaticChartRenderer::render_dashboard_svg(&view, (1200, 800)).unwrap();
        let second = StaticChartRenderer::render_dashboard_svg(&view, (1200, 800)).unwrap();

        assert_eq!(first, second);
        for panel in PanelId::ALL {
            assert!(first.contains(panel.title()), "missing title {}", panel.title());
        }
    }

    #[test]
    fn panel_svgs_written_per_key() {
        let view = sample_view();
        let dir = tempfile::TempDir::new().unwrap();

        let written = StaticChartRenderer::export_panels_svg(&view, (600, 400), dir.path()).unwrap();
        assert_eq!(written.len(), PanelId::ALL.len());
        for panel in PanelId::ALL {
            let path = dir.path().join(format!("{}.svg", panel.key()));
            assert!(written.contains(&path));
            let svg = fs::read_to_string(&path).unwrap();
            assert!(svg.contains("<svg"));
        }
    }

    #[test]
    fn dashboard_image_has_requested_size() {
        let view = sample_view();
        let img = StaticChartRenderer::render_dashboard_image(&view, (640, 480)).unwrap();
        assert_eq!(img.dimensions(), (640, 480));

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dashboard.png");
        StaticChartRenderer::save_dashboard_image(&view, (640, 480), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn rejects_tiny_canvas() {
        let view = DashboardView::default();
        let err = StaticChartRenderer::render_panel_svg(PanelId::BucketShare, &view, (10, 10))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidSize(10, 10)));
    }
}
