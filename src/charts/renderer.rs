//! Static Chart Renderer
//! Draws every dashboard chart kind to an SVG document with plotters.
//!
//! Canvas sizes follow the page's figure sizes at 100 px per inch. Each
//! artifact records how many primary marks it drew (points, bars, slices,
//! cells, hexagons, violins, boxes, panels).

use crate::charts::plan::{capitalize, ChartKind};
use crate::charts::theme::{self, Palette};
use crate::config::DashboardConfig;
use crate::data::{DataProcessor, ProcessorError};
use crate::stats::{DensityEstimator, StatsCalculator, KDE_CUT};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use polars::prelude::DataFrame;
use std::ops::Range;
use thiserror::Error;

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;
type Chart<'a, 'b> = ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const WIDE: (u32, u32) = (1000, 600);
const EXTRA_WIDE: (u32, u32) = (1200, 600);
const PIE_SIZE: (u32, u32) = (800, 800);
const HEATMAP_SIZE: (u32, u32) = (1000, 800);
const FACET_PANEL: (u32, u32) = (480, 400);
const PAIR_CELL: u32 = 250;
const SUPTITLE_HEIGHT: u32 = 50;
const COLORBAR_WIDTH: i32 = 120;

/// Violin KDE extends this many bandwidths past the data.
const VIOLIN_CUT: f64 = 2.0;
const VIOLIN_POINTS: usize = 100;
const VIOLIN_HALF_WIDTH: f64 = 0.4;
const BOX_HALF_WIDTH: f64 = 0.4;
const STRIP_JITTER: f64 = 0.4;
const PIE_START_DEG: f64 = 140.0;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Data(#[from] ProcessorError),
    #[error("Drawing failed: {0}")]
    Drawing(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Drawing(err.to_string())
    }
}

/// One rendered chart.
#[derive(Debug, Clone)]
pub struct ChartArtifact {
    pub kind: ChartKind,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub svg: String,
    pub marks: usize,
}

/// Margins and label areas for one chart panel.
#[derive(Clone, Copy)]
struct PanelLayout {
    caption_size: f64,
    margin: u32,
    x_label_area: u32,
    y_label_area: u32,
}

const FULL_PANEL: PanelLayout = PanelLayout {
    caption_size: 22.0,
    margin: 15,
    x_label_area: 45,
    y_label_area: 65,
};

const FACET_LAYOUT: PanelLayout = PanelLayout {
    caption_size: 16.0,
    margin: 10,
    x_label_area: 40,
    y_label_area: 55,
};

const PAIR_LAYOUT: PanelLayout = PanelLayout {
    caption_size: 0.0,
    margin: 6,
    x_label_area: 35,
    y_label_area: 50,
};

fn font(size: f64) -> TextStyle<'static> {
    ("sans-serif", size).into_font().color(&theme::TEXT)
}

fn centered(size: f64) -> TextStyle<'static> {
    font(size).pos(Pos::new(HPos::Center, VPos::Center))
}

/// Axis range around `[lo, hi]` with 5% padding; degenerate spans widen by 0.5.
fn padded(lo: f64, hi: f64) -> Range<f64> {
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if lo == hi {
        return (lo - 0.5)..(hi + 0.5);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

fn padded_extent(values: impl Iterator<Item = f64>) -> Range<f64> {
    let values: Vec<f64> = values.collect();
    match StatsCalculator::extent(&values) {
        Some((lo, hi)) => padded(lo, hi),
        None => 0.0..1.0,
    }
}

/// Render into an in-memory SVG; `draw` returns the mark count.
fn draw_svg<F>(size: (u32, u32), draw: F) -> Result<(String, usize), RenderError>
where
    F: FnOnce(&Area<'_>) -> Result<usize, RenderError>,
{
    let mut svg = String::new();
    let marks = {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE)?;
        let marks = draw(&root)?;
        root.present()?;
        marks
    };
    Ok((svg, marks))
}

fn build_chart<'a, 'b>(
    area: &'a Area<'b>,
    caption: &str,
    layout: PanelLayout,
    x: Range<f64>,
    y: Range<f64>,
) -> Result<Chart<'a, 'b>, RenderError> {
    let mut builder = ChartBuilder::on(area);
    builder
        .margin(layout.margin)
        .x_label_area_size(layout.x_label_area)
        .y_label_area_size(layout.y_label_area);
    if !caption.is_empty() {
        builder.caption(caption, ("sans-serif", layout.caption_size).into_font());
    }
    let chart = builder.build_cartesian_2d(x, y)?;
    chart.plotting_area().fill(&theme::GRID_BG)?;
    Ok(chart)
}

/// Dark-grid mesh with axis descriptions.
fn draw_mesh(chart: &mut Chart<'_, '_>, x_desc: &str, y_desc: &str) -> Result<(), RenderError> {
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .bold_line_style(theme::GRID_LINE.stroke_width(1))
        .light_line_style(theme::GRID_BG.stroke_width(1))
        .axis_desc_style(("sans-serif", 15.0).into_font())
        .label_style(("sans-serif", 12.0).into_font())
        .draw()?;
    Ok(())
}

/// Mesh for charts with categories along x; category names are drawn separately.
fn draw_category_mesh(chart: &mut Chart<'_, '_>, y_desc: &str) -> Result<(), RenderError> {
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_| String::new())
        .y_desc(y_desc)
        .bold_line_style(theme::GRID_LINE.stroke_width(1))
        .light_line_style(theme::GRID_BG.stroke_width(1))
        .axis_desc_style(("sans-serif", 15.0).into_font())
        .label_style(("sans-serif", 12.0).into_font())
        .draw()?;
    Ok(())
}

/// Category names under positions 0..n. `area` must be the root the chart sits on.
fn draw_category_labels(
    area: &Area<'_>,
    chart: &Chart<'_, '_>,
    names: &[String],
    baseline: f64,
) -> Result<(), RenderError> {
    let style = font(13.0).pos(Pos::new(HPos::Center, VPos::Top));
    for (i, name) in names.iter().enumerate() {
        let (px, py) = chart.backend_coord(&(i as f64, baseline));
        area.draw_text(name, &style, (px, py + 8))?;
    }
    Ok(())
}

/// Vertical colour bar with five ticks, drawn in pixel space.
fn draw_colorbar(
    area: &Area<'_>,
    palette: Palette,
    min: f64,
    max: f64,
    label: &str,
    tick_format: fn(f64) -> String,
) -> Result<(), RenderError> {
    const STEPS: i32 = 100;
    let (_, height) = area.dim_in_pixel();
    let top = 80;
    let bottom = height as i32 - 80;
    let left = 15;
    let right = 40;
    let span = (bottom - top).max(1);

    for step in 0..STEPS {
        let y0 = bottom - span * step / STEPS;
        let y1 = bottom - span * (step + 1) / STEPS;
        let t = (step as f64 + 0.5) / STEPS as f64;
        area.draw(&Rectangle::new([(left, y1), (right, y0)], palette.at(t).filled()))?;
    }
    area.draw(&Rectangle::new(
        [(left, top), (right, bottom)],
        theme::EDGE.stroke_width(1),
    ))?;

    let tick_style = font(12.0).pos(Pos::new(HPos::Left, VPos::Center));
    for tick in 0..=4 {
        let frac = tick as f64 / 4.0;
        let y = bottom - (span as f64 * frac).round() as i32;
        let value = min + (max - min) * frac;
        area.draw(&PathElement::new(
            vec![(right, y), (right + 5, y)],
            theme::EDGE.stroke_width(1),
        ))?;
        area.draw_text(&tick_format(value), &tick_style, (right + 8, y))?;
    }
    area.draw_text(
        label,
        &font(14.0).pos(Pos::new(HPos::Center, VPos::Bottom)),
        ((left + right) / 2, top - 12),
    )?;
    Ok(())
}

/// Histogram bars of one sample with its count-scaled KDE overlay.
struct HistogramLayer {
    /// `(left, right, count)` per bin.
    bars: Vec<(f64, f64, f64)>,
    overlay: Vec<(f64, f64)>,
}

impl HistogramLayer {
    fn new(values: &[f64], bins: usize, kde_points: usize) -> Option<Self> {
        let hist = DensityEstimator::histogram(values, bins)?;
        let scale = values.len() as f64 * hist.bin_width();
        let overlay = DensityEstimator::gaussian_kde(values, kde_points, KDE_CUT)
            .map(|curve| curve.scaled(scale))
            .unwrap_or_default();
        let bars = hist
            .edges
            .windows(2)
            .zip(&hist.counts)
            .map(|(edge, &count)| (edge[0], edge[1], count as f64))
            .collect();
        Some(Self { bars, overlay })
    }

    fn x_extent(&self) -> (f64, f64) {
        let lo = self.bars.first().map_or(f64::INFINITY, |b| b.0);
        let hi = self.bars.last().map_or(f64::NEG_INFINITY, |b| b.1);
        (
            self.overlay.first().map_or(lo, |p| p.0.min(lo)),
            self.overlay.last().map_or(hi, |p| p.0.max(hi)),
        )
    }

    fn y_max(&self) -> f64 {
        self.bars
            .iter()
            .map(|b| b.2)
            .chain(self.overlay.iter().map(|p| p.1))
            .fold(0.0, f64::max)
    }
}

/// Axis ranges covering every layer, so panels drawn with them are comparable.
fn shared_ranges<'a>(layers: impl IntoIterator<Item = &'a HistogramLayer>) -> (Range<f64>, Range<f64>) {
    let (mut lo, mut hi, mut top) = (f64::INFINITY, f64::NEG_INFINITY, 0.0f64);
    for layer in layers {
        let (l, h) = layer.x_extent();
        lo = lo.min(l);
        hi = hi.max(h);
        top = top.max(layer.y_max());
    }
    if lo > hi {
        return (0.0..1.0, 0.0..1.0);
    }
    (padded(lo, hi), 0.0..top.max(1.0) * 1.1)
}

/// Draw one histogram panel on fixed axes. Returns the bar count.
fn draw_histogram_panel(
    area: &Area<'_>,
    caption: &str,
    layout: PanelLayout,
    column: &str,
    layer: Option<&HistogramLayer>,
    (x_range, y_range): (Range<f64>, Range<f64>),
    fill: RGBColor,
) -> Result<usize, RenderError> {
    let mut chart = build_chart(area, caption, layout, x_range, y_range)?;
    draw_mesh(&mut chart, column, "Frequency")?;
    let Some(layer) = layer else {
        return Ok(0);
    };

    chart.draw_series(
        layer
            .bars
            .iter()
            .map(|&(x0, x1, h)| Rectangle::new([(x0, 0.0), (x1, h)], fill.mix(0.75).filled())),
    )?;
    chart.draw_series(
        layer
            .bars
            .iter()
            .map(|&(x0, x1, h)| Rectangle::new([(x0, 0.0), (x1, h)], theme::EDGE.stroke_width(1))),
    )?;
    if !layer.overlay.is_empty() {
        chart.draw_series(LineSeries::new(layer.overlay.iter().copied(), fill.stroke_width(2)))?;
    }

    Ok(layer.bars.len())
}

/// Deterministic horizontal offset for strip plots, in `[-width/2, width/2)`.
pub fn jitter(index: usize, width: f64) -> f64 {
    const GOLDEN: f64 = 0.618_033_988_749_895;
    (((index + 1) as f64 * GOLDEN).fract() - 0.5) * width
}

/// Draws dashboard charts from the loaded table.
pub struct ChartRenderer<'a> {
    config: &'a DashboardConfig,
}

impl<'a> ChartRenderer<'a> {
    pub fn new(config: &'a DashboardConfig) -> Self {
        Self { config }
    }

    fn category(&self) -> &str {
        &self.config.category_column
    }

    /// Render one chart of the page.
    pub fn render(&self, df: &DataFrame, kind: &ChartKind) -> Result<ChartArtifact, RenderError> {
        let title = kind.title(self.category());
        let ((width, height), (svg, marks)) = match kind {
            ChartKind::Scatter { x, y } => (WIDE, self.scatter(df, &title, x, y)?),
            ChartKind::Histogram { column } => (WIDE, self.histogram(df, &title, column)?),
            ChartKind::Violin { column } => (EXTRA_WIDE, self.violin(df, &title, column)?),
            ChartKind::FacetHistogram { column } => self.facet_histogram(df, &title, column)?,
            ChartKind::Pie => (PIE_SIZE, self.pie(df, &title)?),
            ChartKind::Boxplot { column } => (EXTRA_WIDE, self.boxplot(df, &title, column)?),
            ChartKind::CorrelationHeatmap { columns } => {
                (HEATMAP_SIZE, self.heatmap(df, &title, columns)?)
            }
            ChartKind::Pairplot { columns } => self.pairplot(df, &title, columns)?,
            ChartKind::Regression { x, y } => (WIDE, self.regression(df, &title, x, y)?),
            ChartKind::Kde { column } => (WIDE, self.kde(df, &title, column)?),
            ChartKind::Strip { column } => (WIDE, self.strip(df, &title, column)?),
            ChartKind::Hexbin { x, y } => (WIDE, self.hexbin(df, &title, x, y)?),
        };

        log::debug!("Rendered {} ({} marks, {} bytes)", kind.slug(), marks, svg.len());
        Ok(ChartArtifact {
            kind: kind.clone(),
            title,
            width,
            height,
            svg,
            marks,
        })
    }

    fn scatter(
        &self,
        df: &DataFrame,
        title: &str,
        x_col: &str,
        y_col: &str,
    ) -> Result<(String, usize), RenderError> {
        let groups = DataProcessor::pairs_by_category(df, self.category(), x_col, y_col)?;
        let colors = theme::SPECTRAL.categorical(groups.len());

        draw_svg(WIDE, |root| {
            let all = groups.iter().flat_map(|(_, pts)| pts.iter());
            let x_range = padded_extent(all.clone().map(|p| p.0));
            let y_range = padded_extent(all.map(|p| p.1));

            let mut chart = build_chart(root, title, FULL_PANEL, x_range, y_range)?;
            draw_mesh(&mut chart, x_col, y_col)?;

            let mut marks = 0;
            for ((name, points), &color) in groups.iter().zip(&colors) {
                marks += points.len();
                chart
                    .draw_series(points.iter().map(|&(x, y)| {
                        EmptyElement::at((x, y))
                            + Circle::new((0, 0), 6, color.filled())
                            + Circle::new((0, 0), 6, theme::EDGE.stroke_width(1))
                    }))?
                    .label(name.as_str())
                    .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
            }

            if !groups.is_empty() {
                chart
                    .configure_series_labels()
                    .position(SeriesLabelPosition::UpperRight)
                    .background_style(WHITE.mix(0.85).filled())
                    .border_style(theme::EDGE.stroke_width(1))
                    .label_font(("sans-serif", 13.0).into_font())
                    .draw()?;
            }
            Ok(marks)
        })
    }

    fn histogram(&self, df: &DataFrame, title: &str, column: &str) -> Result<(String, usize), RenderError> {
        let values = DataProcessor::numeric_values(df, column)?;
        let layer = HistogramLayer::new(&values, self.config.histogram_bins, self.config.kde_points);
        let ranges = shared_ranges(layer.iter());
        draw_svg(WIDE, |root| {
            draw_histogram_panel(
                root,
                title,
                FULL_PANEL,
                column,
                layer.as_ref(),
                ranges,
                theme::HISTOGRAM_FILL,
            )
        })
    }

    fn violin(&self, df: &DataFrame, title: &str, column: &str) -> Result<(String, usize), RenderError> {
        let groups = DataProcessor::values_by_category(df, self.category(), column)?;
        let colors = theme::MUTED.categorical(groups.len());
        let names: Vec<String> = groups.iter().map(|(g, _)| g.clone()).collect();

        let curves: Vec<_> = groups
            .iter()
            .map(|(_, values)| DensityEstimator::gaussian_kde(values, VIOLIN_POINTS, VIOLIN_CUT))
            .collect();
        let max_density = curves
            .iter()
            .flatten()
            .map(|c| c.max_density())
            .fold(0.0, f64::max);

        let y_values = curves
            .iter()
            .flatten()
            .flat_map(|c| c.points.iter().map(|p| p.0))
            .chain(groups.iter().flat_map(|(_, v)| v.iter().copied()));
        let y_range = padded_extent(y_values);
        let x_range = -0.5..(groups.len().max(1) as f64 - 0.5);
        let baseline = y_range.start;

        draw_svg(EXTRA_WIDE, |root| {
            let mut chart = build_chart(root, title, FULL_PANEL, x_range, y_range)?;
            draw_category_mesh(&mut chart, column)?;

            let mut marks = 0;
            for (i, (((_, values), curve), &color)) in
                groups.iter().zip(&curves).zip(&colors).enumerate()
            {
                let center = i as f64;
                match curve {
                    Some(curve) if max_density > 0.0 => {
                        let half = |d: f64| d / max_density * VIOLIN_HALF_WIDTH;
                        let mut outline: Vec<(f64, f64)> = curve
                            .points
                            .iter()
                            .map(|&(y, d)| (center + half(d), y))
                            .collect();
                        outline.extend(curve.points.iter().rev().map(|&(y, d)| (center - half(d), y)));
                        chart.draw_series(std::iter::once(Polygon::new(
                            outline.clone(),
                            color.mix(0.85).filled(),
                        )))?;
                        outline.push(outline[0]);
                        chart.draw_series(std::iter::once(PathElement::new(
                            outline,
                            RGBColor(64, 64, 64).stroke_width(1),
                        )))?;
                        marks += 1;
                    }
                    _ => {
                        if let Some((lo, hi)) = StatsCalculator::extent(values) {
                            chart.draw_series(std::iter::once(PathElement::new(
                                vec![(center - VIOLIN_HALF_WIDTH, lo), (center + VIOLIN_HALF_WIDTH, hi)],
                                color.stroke_width(2),
                            )))?;
                            marks += 1;
                        }
                    }
                }

                if let Some(summary) = StatsCalculator::box_summary(values) {
                    let inner = RGBColor(64, 64, 64);
                    chart.draw_series([
                        PathElement::new(
                            vec![(center, summary.whisker_low), (center, summary.whisker_high)],
                            inner.stroke_width(1),
                        ),
                        PathElement::new(
                            vec![(center, summary.q1), (center, summary.q3)],
                            inner.stroke_width(6),
                        ),
                    ])?;
                    chart.draw_series(std::iter::once(Circle::new(
                        (center, summary.median),
                        3,
                        WHITE.filled(),
                    )))?;
                }
            }

            draw_category_labels(root, &chart, &names, baseline)?;
            Ok(marks)
        })
    }

    fn facet_histogram(
        &self,
        df: &DataFrame,
        title: &str,
        column: &str,
    ) -> Result<((u32, u32), (String, usize)), RenderError> {
        let groups = DataProcessor::values_by_category(df, self.category(), column)?;
        let layers: Vec<Option<HistogramLayer>> = groups
            .iter()
            .map(|(_, values)| {
                HistogramLayer::new(values, self.config.facet_bins, self.config.kde_points)
            })
            .collect();
        // Panels share both axes.
        let ranges = shared_ranges(layers.iter().flatten());
        let panels = groups.len().max(1);
        let size = (
            FACET_PANEL.0 * panels as u32,
            FACET_PANEL.1 + SUPTITLE_HEIGHT,
        );

        let drawn = draw_svg(size, |root| {
            let area = root.titled(title, ("sans-serif", 22.0).into_font())?;
            if groups.is_empty() {
                return Ok(0);
            }
            let cells = area.split_evenly((1, groups.len()));
            for (((name, _), layer), cell) in groups.iter().zip(&layers).zip(&cells) {
                draw_histogram_panel(
                    cell,
                    &format!("{} = {}", self.category(), name),
                    FACET_LAYOUT,
                    column,
                    layer.as_ref(),
                    ranges.clone(),
                    theme::FACET_FILL,
                )?;
            }
            Ok(groups.len())
        })?;
        Ok((size, drawn))
    }

    fn pie(&self, df: &DataFrame, title: &str) -> Result<(String, usize), RenderError> {
        let counts = DataProcessor::category_counts(df, self.category())?;
        let total: usize = counts.iter().map(|(_, c)| c).sum();
        let colors = theme::SET2.categorical(counts.len());

        draw_svg(PIE_SIZE, |root| {
            let area = root.titled(title, ("sans-serif", 22.0).into_font())?;
            if total == 0 {
                return Ok(0);
            }
            let (w, h) = area.dim_in_pixel();
            let center = (w as f64 / 2.0, h as f64 / 2.0);
            let radius = w.min(h) as f64 * 0.36;
            let point = |angle_deg: f64, r: f64| {
                let a = angle_deg.to_radians();
                (
                    (center.0 + r * a.cos()).round() as i32,
                    (center.1 - r * a.sin()).round() as i32,
                )
            };

            let mut start = PIE_START_DEG;
            for ((name, count), &color) in counts.iter().zip(&colors) {
                let share = *count as f64 / total as f64;
                let sweep = share * 360.0;
                let steps = (sweep.ceil() as usize).max(2);

                let mut wedge = vec![point(0.0, 0.0)];
                wedge.extend((0..=steps).map(|s| point(start + sweep * s as f64 / steps as f64, radius)));
                area.draw(&Polygon::new(wedge.clone(), color.filled()))?;
                wedge.push(wedge[0]);
                area.draw(&PathElement::new(wedge, theme::EDGE.stroke_width(1)))?;

                let mid = start + sweep / 2.0;
                area.draw_text(name, &centered(15.0), point(mid, radius * 1.12))?;
                area.draw_text(&format!("{:.1}%", share * 100.0), &centered(14.0), point(mid, radius * 0.6))?;
                start += sweep;
            }
            Ok(counts.len())
        })
    }

    fn boxplot(&self, df: &DataFrame, title: &str, column: &str) -> Result<(String, usize), RenderError> {
        let groups = DataProcessor::values_by_category(df, self.category(), column)?;
        let colors = theme::ROCKET.categorical(groups.len());
        let names: Vec<String> = groups.iter().map(|(g, _)| g.clone()).collect();
        let y_range = padded_extent(groups.iter().flat_map(|(_, v)| v.iter().copied()));
        let x_range = -0.5..(groups.len().max(1) as f64 - 0.5);
        let baseline = y_range.start;

        draw_svg(EXTRA_WIDE, |root| {
            let mut chart = build_chart(root, title, FULL_PANEL, x_range, y_range)?;
            draw_category_mesh(&mut chart, column)?;

            let edge = RGBColor(64, 64, 64).stroke_width(1);
            let mut marks = 0;
            for (i, ((_, values), &color)) in groups.iter().zip(&colors).enumerate() {
                let Some(summary) = StatsCalculator::box_summary(values) else {
                    continue;
                };
                let (l, c, r) = (i as f64 - BOX_HALF_WIDTH, i as f64, i as f64 + BOX_HALF_WIDTH);
                let cap = BOX_HALF_WIDTH / 2.0;

                chart.draw_series(std::iter::once(Rectangle::new(
                    [(l, summary.q1), (r, summary.q3)],
                    color.filled(),
                )))?;
                chart.draw_series(std::iter::once(Rectangle::new(
                    [(l, summary.q1), (r, summary.q3)],
                    edge,
                )))?;
                chart.draw_series([
                    PathElement::new(vec![(l, summary.median), (r, summary.median)], edge),
                    PathElement::new(vec![(c, summary.q1), (c, summary.whisker_low)], edge),
                    PathElement::new(vec![(c, summary.q3), (c, summary.whisker_high)], edge),
                    PathElement::new(
                        vec![(c - cap, summary.whisker_low), (c + cap, summary.whisker_low)],
                        edge,
                    ),
                    PathElement::new(
                        vec![(c - cap, summary.whisker_high), (c + cap, summary.whisker_high)],
                        edge,
                    ),
                ])?;
                chart.draw_series(
                    summary
                        .outliers
                        .iter()
                        .map(|&v| Circle::new((c, v), 4, edge)),
                )?;
                marks += 1;
            }

            draw_category_labels(root, &chart, &names, baseline)?;
            Ok(marks)
        })
    }

    fn heatmap(&self, df: &DataFrame, title: &str, columns: &[String]) -> Result<(String, usize), RenderError> {
        let data = columns
            .iter()
            .map(|c| Ok((c.clone(), DataProcessor::column_values(df, c)?)))
            .collect::<Result<Vec<_>, ProcessorError>>()?;
        let matrix = StatsCalculator::correlation_matrix(&data);
        let k = matrix.size();

        draw_svg(HEATMAP_SIZE, |root| {
            let (width, _) = root.dim_in_pixel();
            let (main, bar) = root.split_horizontally(width as i32 - COLORBAR_WIDTH);

            let mut builder = ChartBuilder::on(&main);
            builder
                .caption(title, ("sans-serif", 22.0).into_font())
                .margin(20)
                .x_label_area_size(70)
                .y_label_area_size(120);
            let mut chart = builder.build_cartesian_2d(0.0..k.max(1) as f64, 0.0..k.max(1) as f64)?;

            let cells: Vec<(usize, usize, f64)> = matrix
                .lower_triangle()
                .into_iter()
                .filter(|(_, _, r)| r.is_finite())
                .collect();
            let top = |row: usize| (k - row) as f64;

            chart.draw_series(cells.iter().map(|&(row, col, r)| {
                Rectangle::new(
                    [(col as f64, top(row) - 1.0), (col as f64 + 1.0, top(row))],
                    theme::COOLWARM.scaled(r, -1.0, 1.0).filled(),
                )
            }))?;
            chart.draw_series(cells.iter().map(|&(row, col, _)| {
                Rectangle::new(
                    [(col as f64, top(row) - 1.0), (col as f64 + 1.0, top(row))],
                    WHITE.stroke_width(1),
                )
            }))?;
            chart.draw_series(cells.iter().map(|&(row, col, r)| {
                let style = if r.abs() > 0.6 {
                    centered(14.0).color(&WHITE)
                } else {
                    centered(14.0)
                };
                Text::new(
                    format!("{r:.2}"),
                    (col as f64 + 0.5, top(row) - 0.5),
                    style,
                )
            }))?;

            let row_style = font(13.0).pos(Pos::new(HPos::Right, VPos::Center));
            let col_style = font(13.0).pos(Pos::new(HPos::Center, VPos::Top));
            for (i, name) in matrix.columns.iter().enumerate() {
                let (px, py) = chart.backend_coord(&(0.0, top(i) - 0.5));
                main.draw_text(name, &row_style, (px - 8, py))?;
                let (px, py) = chart.backend_coord(&(i as f64 + 0.5, 0.0));
                main.draw_text(name, &col_style, (px, py + 8))?;
            }

            draw_colorbar(&bar, theme::COOLWARM, -1.0, 1.0, "r", |v| format!("{v:.1}"))?;
            Ok(cells.len())
        })
    }

    fn pairplot(
        &self,
        df: &DataFrame,
        title: &str,
        columns: &[String],
    ) -> Result<((u32, u32), (String, usize)), RenderError> {
        let data = columns
            .iter()
            .map(|c| DataProcessor::column_values(df, c))
            .collect::<Result<Vec<_>, _>>()?;
        let k = columns.len();
        let side = PAIR_CELL * k.max(1) as u32;
        let size = (side, side + SUPTITLE_HEIGHT);

        let drawn = draw_svg(size, |root| {
            let area = root.titled(title, ("sans-serif", 22.0).into_font())?;
            if k == 0 {
                return Ok(0);
            }
            let cells = area.split_evenly((k, k));
            let present = |i: usize| -> Vec<f64> { data[i].iter().flatten().copied().collect() };

            for (idx, cell) in cells.iter().enumerate() {
                let (row, col) = (idx / k, idx % k);
                let x_desc = if row == k - 1 { columns[col].as_str() } else { "" };
                let y_desc = if col == 0 { columns[row].as_str() } else { "" };

                if row == col {
                    let values = present(col);
                    let curve = DensityEstimator::gaussian_kde(&values, self.config.kde_points, KDE_CUT);
                    let (x_range, y_max) = match &curve {
                        Some(c) => (
                            padded_extent(c.points.iter().map(|p| p.0)),
                            c.max_density() * 1.1,
                        ),
                        None => (padded_extent(values.iter().copied()), 1.0),
                    };
                    let mut chart = build_chart(cell, "", PAIR_LAYOUT, x_range, 0.0..y_max)?;
                    draw_mesh(&mut chart, x_desc, y_desc)?;
                    if let Some(curve) = curve {
                        chart.draw_series(
                            AreaSeries::new(curve.points, 0.0, theme::PAIR_POINT.mix(0.3).filled())
                                .border_style(theme::PAIR_POINT.stroke_width(2)),
                        )?;
                    }
                } else {
                    let points: Vec<(f64, f64)> = data[col]
                        .iter()
                        .zip(&data[row])
                        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                        .collect();
                    let x_range = padded_extent(points.iter().map(|p| p.0));
                    let y_range = padded_extent(points.iter().map(|p| p.1));
                    let mut chart = build_chart(cell, "", PAIR_LAYOUT, x_range, y_range)?;
                    draw_mesh(&mut chart, x_desc, y_desc)?;
                    chart.draw_series(points.iter().map(|&(x, y)| {
                        EmptyElement::at((x, y))
                            + Circle::new((0, 0), 3, theme::PAIR_POINT.mix(0.8).filled())
                            + Circle::new((0, 0), 3, theme::EDGE.stroke_width(1))
                    }))?;
                }
            }
            Ok(k * k)
        })?;
        Ok((size, drawn))
    }

    fn regression(
        &self,
        df: &DataFrame,
        title: &str,
        x_col: &str,
        y_col: &str,
    ) -> Result<(String, usize), RenderError> {
        let points = DataProcessor::paired_values(df, x_col, y_col)?;
        let fit = StatsCalculator::linear_regression(&points);
        let x_desc = format!("{} Content", capitalize(x_col));
        let y_desc = format!("{} Content", capitalize(y_col));

        draw_svg(WIDE, |root| {
            let x_range = padded_extent(points.iter().map(|p| p.0));
            let band: Vec<(f64, f64, f64)> = match &fit {
                Some(fit) => (0..=100)
                    .map(|i| {
                        let x = x_range.start + (x_range.end - x_range.start) * i as f64 / 100.0;
                        let (lo, hi) = fit.confidence_interval(x);
                        (x, lo, hi)
                    })
                    .collect(),
                None => Vec::new(),
            };
            let y_range = padded_extent(
                points
                    .iter()
                    .map(|p| p.1)
                    .chain(band.iter().flat_map(|&(_, lo, hi)| [lo, hi])),
            );

            let corner = (x_range.start, y_range.end);
            let mut chart = build_chart(root, title, FULL_PANEL, x_range, y_range)?;
            draw_mesh(&mut chart, &x_desc, &y_desc)?;

            if !band.is_empty() {
                let mut outline: Vec<(f64, f64)> = band.iter().map(|&(x, _, hi)| (x, hi)).collect();
                outline.extend(band.iter().rev().map(|&(x, lo, _)| (x, lo)));
                chart.draw_series(std::iter::once(Polygon::new(
                    outline,
                    theme::TREND_LINE.mix(0.15).filled(),
                )))?;
            }
            chart.draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 4, theme::SCATTER_POINT.mix(0.8).filled())),
            )?;
            if let Some(fit) = &fit {
                chart.draw_series(LineSeries::new(
                    band.iter().map(|&(x, _, _)| (x, fit.predict(x))),
                    theme::TREND_LINE.stroke_width(2),
                ))?;
                if fit.r.is_finite() {
                    let (px, py) = chart.backend_coord(&corner);
                    root.draw_text(&format!("r = {:.2}", fit.r), &font(15.0), (px + 12, py + 10))?;
                }
            }
            Ok(points.len())
        })
    }

    fn kde(&self, df: &DataFrame, title: &str, column: &str) -> Result<(String, usize), RenderError> {
        let values = DataProcessor::numeric_values(df, column)?;
        let curve = DensityEstimator::gaussian_kde(&values, self.config.kde_points, KDE_CUT);

        draw_svg(WIDE, |root| {
            let (x_range, y_max) = match &curve {
                Some(c) => (
                    padded_extent(c.points.iter().map(|p| p.0)),
                    c.max_density() * 1.1,
                ),
                None => (padded_extent(values.iter().copied()), 1.0),
            };
            let mut chart = build_chart(root, title, FULL_PANEL, x_range, 0.0..y_max)?;
            draw_mesh(&mut chart, column, "Density")?;

            let Some(curve) = curve else {
                return Ok(0);
            };
            chart.draw_series(
                AreaSeries::new(curve.points, 0.0, theme::KDE_FILL.mix(0.25).filled())
                    .border_style(theme::KDE_FILL.stroke_width(2)),
            )?;
            Ok(1)
        })
    }

    fn strip(&self, df: &DataFrame, title: &str, column: &str) -> Result<(String, usize), RenderError> {
        let groups = DataProcessor::values_by_category(df, self.category(), column)?;
        let colors = theme::VIRIDIS.categorical(groups.len());
        let names: Vec<String> = groups.iter().map(|(g, _)| g.clone()).collect();
        let y_range = padded_extent(groups.iter().flat_map(|(_, v)| v.iter().copied()));
        let x_range = -0.5..(groups.len().max(1) as f64 - 0.5);
        let baseline = y_range.start;

        draw_svg(WIDE, |root| {
            let mut chart = build_chart(root, title, FULL_PANEL, x_range, y_range)?;
            draw_category_mesh(&mut chart, column)?;

            let mut marks = 0;
            for (i, ((_, values), &color)) in groups.iter().zip(&colors).enumerate() {
                marks += values.len();
                chart.draw_series(values.iter().enumerate().map(|(j, &v)| {
                    Circle::new((i as f64 + jitter(j, STRIP_JITTER), v), 5, color.mix(0.9).filled())
                }))?;
            }

            draw_category_labels(root, &chart, &names, baseline)?;
            Ok(marks)
        })
    }

    fn hexbin(
        &self,
        df: &DataFrame,
        title: &str,
        x_col: &str,
        y_col: &str,
    ) -> Result<(String, usize), RenderError> {
        let points = DataProcessor::paired_values(df, x_col, y_col)?;
        let grid = DensityEstimator::hexbin(&points, self.config.hexbin_gridsize);

        draw_svg(WIDE, |root| {
            let (width, _) = root.dim_in_pixel();
            let (main, bar) = root.split_horizontally(width as i32 - COLORBAR_WIDTH);

            let Some(grid) = grid else {
                let mut chart = build_chart(&main, title, FULL_PANEL, 0.0..1.0, 0.0..1.0)?;
                draw_mesh(&mut chart, x_col, y_col)?;
                return Ok(0);
            };

            let hexes: Vec<(Vec<(f64, f64)>, usize)> = grid
                .cells
                .iter()
                .map(|cell| (grid.vertices(cell), cell.count))
                .collect();
            let x_range = padded_extent(hexes.iter().flat_map(|(v, _)| v.iter().map(|p| p.0)));
            let y_range = padded_extent(hexes.iter().flat_map(|(v, _)| v.iter().map(|p| p.1)));
            let max = grid.max_count() as f64;

            let mut chart = build_chart(&main, title, FULL_PANEL, x_range, y_range)?;
            draw_mesh(&mut chart, x_col, y_col)?;
            chart.draw_series(hexes.iter().map(|(vertices, count)| {
                Polygon::new(
                    vertices.clone(),
                    theme::PURPLES.scaled(*count as f64, 0.0, max).filled(),
                )
            }))?;
            chart.draw_series(hexes.iter().map(|(vertices, _)| {
                let mut outline = vertices.clone();
                outline.push(vertices[0]);
                PathElement::new(outline, theme::EDGE.stroke_width(1))
            }))?;

            draw_colorbar(&bar, theme::PURPLES, 0.0, max, "Count", |v| format!("{v:.0}"))?;
            Ok(hexes.len())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn sites() -> DataFrame {
        df!(
            "Celestial Body" => ["Moon", "Mars", "Moon", "Ceres", "Mars", "Moon", "Ceres", "Mars"],
            "iron" => [10.0, 22.0, 12.5, 41.0, 19.0, 11.0, 38.5, 25.0],
            "nickel" => [3.1, 6.2, 2.8, 9.5, 5.1, 3.4, 8.8, 6.9],
            "sulfur" => [0.4, 1.2, 0.5, 2.1, 0.9, 0.3, 2.5, 1.0]
        )
        .unwrap()
    }

    fn render(kind: ChartKind) -> ChartArtifact {
        let config = DashboardConfig::default();
        ChartRenderer::new(&config).render(&sites(), &kind).unwrap()
    }

    #[test]
    fn every_kind_produces_an_svg_document() {
        let col = || "iron".to_string();
        let kinds = vec![
            ChartKind::Scatter { x: col(), y: "nickel".into() },
            ChartKind::Histogram { column: col() },
            ChartKind::Violin { column: col() },
            ChartKind::FacetHistogram { column: col() },
            ChartKind::Pie,
            ChartKind::Boxplot { column: col() },
            ChartKind::CorrelationHeatmap {
                columns: vec![col(), "nickel".into(), "sulfur".into()],
            },
            ChartKind::Pairplot {
                columns: vec![col(), "nickel".into()],
            },
            ChartKind::Regression { x: col(), y: "nickel".into() },
            ChartKind::Kde { column: col() },
            ChartKind::Strip { column: col() },
            ChartKind::Hexbin { x: col(), y: "nickel".into() },
        ];
        for kind in kinds {
            let artifact = render(kind.clone());
            assert!(artifact.svg.contains("<svg"), "{} has no svg root", kind.slug());
            assert!(artifact.svg.trim_end().ends_with("</svg>"));
            assert!(artifact.marks > 0, "{} drew nothing", kind.slug());
            assert_eq!(artifact.kind, kind);
        }
    }

    #[test]
    fn pie_has_one_slice_per_category() {
        let artifact = render(ChartKind::Pie);
        assert_eq!(artifact.marks, 3);
        assert_eq!((artifact.width, artifact.height), PIE_SIZE);
        assert!(artifact.svg.contains("Moon"));
        assert!(artifact.svg.contains("37.5%"));
    }

    #[test]
    fn mark_counts_follow_the_data() {
        assert_eq!(render(ChartKind::Scatter { x: "iron".into(), y: "nickel".into() }).marks, 8);
        assert_eq!(render(ChartKind::Histogram { column: "iron".into() }).marks, 20);
        assert_eq!(render(ChartKind::Boxplot { column: "iron".into() }).marks, 3);
        assert_eq!(render(ChartKind::Violin { column: "iron".into() }).marks, 3);
        assert_eq!(render(ChartKind::Strip { column: "sulfur".into() }).marks, 8);
        // Lower triangle of a 3x3 matrix.
        let heatmap = render(ChartKind::CorrelationHeatmap {
            columns: vec!["iron".into(), "nickel".into(), "sulfur".into()],
        });
        assert_eq!(heatmap.marks, 3);
        assert_eq!(
            render(ChartKind::Pairplot { columns: vec!["iron".into(), "nickel".into(), "sulfur".into()] }).marks,
            9
        );
    }

    #[test]
    fn grid_layouts_scale_with_content() {
        let facet = render(ChartKind::FacetHistogram { column: "nickel".into() });
        assert_eq!(facet.marks, 3);
        assert_eq!(facet.width, FACET_PANEL.0 * 3);

        let pair = render(ChartKind::Pairplot {
            columns: vec!["iron".into(), "nickel".into()],
        });
        assert_eq!(pair.width, PAIR_CELL * 2);
    }

    #[test]
    fn missing_or_text_columns_fail_the_chart() {
        let config = DashboardConfig::default();
        let renderer = ChartRenderer::new(&config);
        let err = renderer
            .render(&sites(), &ChartKind::Kde { column: "cobalt".into() })
            .unwrap_err();
        assert!(matches!(err, RenderError::Data(ProcessorError::MissingColumn(_))));

        let err = renderer
            .render(&sites(), &ChartKind::Histogram { column: "Celestial Body".into() })
            .unwrap_err();
        assert!(matches!(err, RenderError::Data(ProcessorError::NotNumeric { .. })));
    }

    #[test]
    fn constant_column_still_renders() {
        let df = df!(
            "Celestial Body" => ["Moon", "Moon", "Mars"],
            "iron" => [5.0, 5.0, 5.0]
        )
        .unwrap();
        let config = DashboardConfig::default();
        let renderer = ChartRenderer::new(&config);
        let kde = renderer.render(&df, &ChartKind::Kde { column: "iron".into() }).unwrap();
        assert_eq!(kde.marks, 0);
        let violin = renderer.render(&df, &ChartKind::Violin { column: "iron".into() }).unwrap();
        assert_eq!(violin.marks, 2);
    }

    #[test]
    fn facet_panels_share_axes() {
        let narrow = HistogramLayer::new(&[1.0, 1.5, 2.0, 2.0, 2.5], 15, 200).unwrap();
        let wide = HistogramLayer::new(&[10.0, 40.0, 70.0], 15, 200).unwrap();
        let (x, y) = shared_ranges([&narrow, &wide]);

        for layer in [&narrow, &wide] {
            let (lo, hi) = layer.x_extent();
            assert!(x.start <= lo && hi <= x.end);
            assert!(layer.y_max() <= y.end);
        }
        assert!(y.end >= narrow.y_max().max(wide.y_max()));
        assert_eq!(shared_ranges(std::iter::empty()), (0.0..1.0, 0.0..1.0));

        let facet = render(ChartKind::FacetHistogram { column: "iron".into() });
        assert_eq!(facet.marks, 3);
    }

    #[test]
    fn regression_reports_correlation() {
        let df = df!(
            "Celestial Body" => ["Moon", "Mars", "Ceres", "Moon"],
            "iron" => [1.0, 2.0, 3.0, 4.0],
            "nickel" => [3.0, 5.0, 7.0, 9.0]
        )
        .unwrap();
        let config = DashboardConfig::default();
        let chart = ChartRenderer::new(&config)
            .render(&df, &ChartKind::Regression { x: "iron".into(), y: "nickel".into() })
            .unwrap();
        assert!(chart.svg.contains("r = 1.00"));
        assert_eq!(chart.marks, 4);
    }

    #[test]
    fn hexbin_draws_empty_cells_too() {
        let chart = render(ChartKind::Hexbin { x: "iron".into(), y: "nickel".into() });
        // gridsize 30 gives 31x18 corner cells and 30x17 centre cells.
        assert_eq!(chart.marks, 31 * 18 + 30 * 17);
    }

    #[test]
    fn jitter_is_bounded_and_repeatable() {
        for i in 0..500 {
            let offset = jitter(i, 0.4);
            assert!((-0.2..0.2).contains(&offset));
            assert_eq!(offset, jitter(i, 0.4));
        }
    }
}
