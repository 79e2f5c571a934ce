//! Dashboard Page
//! Runs the chart plan for a selection and streams the page to a sink.

use crate::charts::{ChartArtifact, ChartPlanner, ChartRenderer, PlanStep, RenderError};
use crate::config::DashboardConfig;
use crate::data::{ColumnSelection, DataLoader, LoaderError, TableSchema};
use polars::prelude::DataFrame;
use thiserror::Error;

pub const PAGE_TITLE: &str = "Mining Site Visualization";
pub const PAGE_INTRO: &str = "Visualize mining site data to gain insights.";

#[derive(Error, Debug)]
pub enum PageError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error("Failed to render {chart}: {source}")]
    Render {
        chart: &'static str,
        source: RenderError,
    },
}

/// One item of the page output stream.
#[derive(Debug, Clone)]
pub enum PageElement {
    Title(String),
    Text(String),
    Heading(String),
    Warning(String),
    Chart(ChartArtifact),
}

/// Destination of page elements.
pub trait PageSink {
    fn emit(&mut self, element: PageElement);
}

/// Collects the page in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySink {
    pub elements: Vec<PageElement>,
}

#[cfg(test)]
impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn charts(&self) -> impl Iterator<Item = &ChartArtifact> {
        self.elements.iter().filter_map(|e| match e {
            PageElement::Chart(chart) => Some(chart),
            _ => None,
        })
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            PageElement::Warning(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
impl PageSink for MemorySink {
    fn emit(&mut self, element: PageElement) {
        self.elements.push(element);
    }
}

/// What a render produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageSummary {
    pub charts: usize,
    pub warnings: usize,
}

/// Renders the mining-site page.
pub struct DashboardPage<'a> {
    config: &'a DashboardConfig,
}

impl<'a> DashboardPage<'a> {
    pub fn new(config: &'a DashboardConfig) -> Self {
        Self { config }
    }

    /// Load the configured dataset and render the page for `selection`.
    pub fn render(
        &self,
        selection: &ColumnSelection,
        sink: &mut dyn PageSink,
    ) -> Result<PageSummary, PageError> {
        sink.emit(PageElement::Title(PAGE_TITLE.to_string()));
        sink.emit(PageElement::Text(PAGE_INTRO.to_string()));
        let df = DataLoader::load_csv(&self.config.dataset_path)?;
        self.render_charts(&df, selection, sink)
    }

    /// Render the page from an already loaded table.
    #[cfg(test)]
    pub fn render_frame(
        &self,
        df: &DataFrame,
        selection: &ColumnSelection,
        sink: &mut dyn PageSink,
    ) -> Result<PageSummary, PageError> {
        sink.emit(PageElement::Title(PAGE_TITLE.to_string()));
        sink.emit(PageElement::Text(PAGE_INTRO.to_string()));
        self.render_charts(df, selection, sink)
    }

    fn render_charts(
        &self,
        df: &DataFrame,
        selection: &ColumnSelection,
        sink: &mut dyn PageSink,
    ) -> Result<PageSummary, PageError> {
        let schema = TableSchema::of(df);
        let planner = ChartPlanner::new(
            &self.config.category_column,
            &self.config.regression_x,
            &self.config.regression_y,
        );
        let steps = planner.plan(&schema, selection);
        log::info!(
            "Rendering page for {:?} ({} steps)",
            selection.columns(),
            steps.len()
        );

        let renderer = ChartRenderer::new(self.config);
        let mut summary = PageSummary::default();
        for step in steps {
            match step {
                PlanStep::Heading(text) => sink.emit(PageElement::Heading(text)),
                PlanStep::Warning(text) => {
                    log::warn!("{}", text);
                    summary.warnings += 1;
                    sink.emit(PageElement::Warning(text));
                }
                PlanStep::Chart(kind) => {
                    let chart = renderer.render(df, &kind).map_err(|source| {
                        log::error!("Chart {} failed: {}", kind.slug(), source);
                        PageError::Render {
                            chart: kind.slug(),
                            source,
                        }
                    })?;
                    log::debug!("{}: {} marks", chart.title, chart.marks);
                    summary.charts += 1;
                    sink.emit(PageElement::Chart(chart));
                }
            }
        }

        log::info!(
            "Page rendered: {} charts, {} warnings",
            summary.charts,
            summary.warnings
        );
        Ok(summary)
    }
}
