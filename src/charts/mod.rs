//! Charts module - Page planning and SVG chart rendering

mod plan;
mod renderer;
pub mod theme;

pub use plan::{charts_of, ChartPlanner, PlanStep};
#[cfg(test)]
pub use plan::{ChartKind, EMPTY_SELECTION_WARNING, NO_NUMERIC_HEATMAP_WARNING};
pub use renderer::{ChartArtifact, ChartRenderer, RenderError};
