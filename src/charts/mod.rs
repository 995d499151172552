//! Charts module - Interactive panels and static export

mod plotter;
mod renderer;
pub mod style;

pub use plotter::ChartPlotter;
pub use renderer::{RenderError, StaticChartRenderer};
pub use style::PanelId;
