//! Charts module - plot models and static PNG rendering

mod plotter;
mod renderer;

pub use plotter::ChartSpec;
pub use renderer::{RenderError, RenderedChart, StaticChartRenderer};
