//! Space Mining Dashboard Application
//! Main window with control panel and page viewer. Page renders run on a
//! background thread and stream their elements back over a channel.

use crate::charts::{charts_of, ChartPlanner};
use crate::config::DashboardConfig;
use crate::data::{ColumnSelection, DataLoader, TableSchema};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::page::{DashboardPage, PageElement, PageSink, PageSummary};
use crate::report::HtmlReport;
use anyhow::Context as _;
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

/// Messages from the render thread, tagged with the render generation.
enum RenderMessage {
    Element(u64, PageElement),
    Complete(u64, PageSummary),
    Error(u64, String),
}

/// Dataset schema load result from background thread
enum LoadResult {
    Complete { path: PathBuf, schema: TableSchema },
    Error(String),
}

/// Forwards page elements to the UI thread.
struct ChannelSink {
    generation: u64,
    tx: Sender<RenderMessage>,
}

impl PageSink for ChannelSink {
    fn emit(&mut self, element: PageElement) {
        let _ = self.tx.send(RenderMessage::Element(self.generation, element));
    }
}

/// Main application window.
pub struct MiningDashboardApp {
    config: DashboardConfig,
    schema: TableSchema,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async page render
    render_rx: Option<Receiver<RenderMessage>>,
    generation: u64,
    expected_charts: usize,
    is_rendering: bool,

    // Async dataset load
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl MiningDashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let mut app = Self {
            config,
            schema: TableSchema::default(),
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
            render_rx: None,
            generation: 0,
            expected_charts: 0,
            is_rendering: false,
            load_rx: None,
            is_loading: false,
        };

        let initial = app.config.dataset_path.clone();
        if initial.exists() {
            app.start_load(initial);
        } else {
            log::info!("Dataset {} not found, waiting for a file", initial.display());
            app.control_panel
                .set_progress(0.0, "Choose a CSV file to begin");
        }
        app
    }

    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.start_load(path);
        }
    }

    /// Read the dataset's schema in a background thread.
    fn start_load(&mut self, path: PathBuf) {
        self.control_panel.csv_path = Some(path.clone());
        self.control_panel.set_progress(0.0, "Loading CSV file...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let result = match DataLoader::load_csv(&path) {
                Ok(df) => LoadResult::Complete {
                    schema: TableSchema::of(&df),
                    path,
                },
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    fn check_load_results(&mut self, ctx: &egui::Context) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete { path, schema }) => {
                self.is_loading = false;
                self.control_panel.set_progress(
                    0.0,
                    &format!(
                        "Loaded {} columns, {} numeric",
                        schema.columns.len(),
                        schema.numeric.len()
                    ),
                );
                self.control_panel
                    .update_columns(schema.numeric.clone(), self.config.default_selection_size);
                self.config.dataset_path = path;
                self.schema = schema;
                self.start_render(ctx);
            }
            Ok(LoadResult::Error(error)) => {
                log::error!("Dataset load failed: {}", error);
                self.control_panel
                    .set_progress(0.0, &format!("Error: {}", error));
                self.is_loading = false;
            }
            Err(_) => self.load_rx = Some(rx),
        }
    }

    /// Re-render the whole page for the current selection.
    fn start_render(&mut self, ctx: &egui::Context) {
        self.generation += 1;
        let generation = self.generation;
        let selection = self.control_panel.selection.clone();
        let config = self.config.clone();

        let planner = ChartPlanner::new(
            &config.category_column,
            &config.regression_x,
            &config.regression_y,
        );
        self.expected_charts = charts_of(&planner.plan(&self.schema, &selection)).len();

        self.chart_viewer.reset(ctx, generation);
        self.control_panel.export_enabled = false;
        self.control_panel.set_progress(1.0, "Rendering page...");
        self.is_rendering = true;

        let (tx, rx) = channel();
        self.render_rx = Some(rx);

        thread::spawn(move || {
            Self::run_render(tx, generation, config, selection);
        });
    }

    /// Render the page (called from background thread)
    fn run_render(
        tx: Sender<RenderMessage>,
        generation: u64,
        config: DashboardConfig,
        selection: ColumnSelection,
    ) {
        let mut sink = ChannelSink {
            generation,
            tx: tx.clone(),
        };
        let message = match DashboardPage::new(&config).render(&selection, &mut sink) {
            Ok(summary) => RenderMessage::Complete(generation, summary),
            Err(e) => RenderMessage::Error(generation, e.to_string()),
        };
        let _ = tx.send(message);
    }

    fn check_render_results(&mut self) {
        let Some(rx) = self.render_rx.take() else {
            return;
        };
        let mut should_keep_receiver = true;

        while let Ok(message) = rx.try_recv() {
            match message {
                RenderMessage::Element(generation, _)
                | RenderMessage::Complete(generation, _)
                | RenderMessage::Error(generation, _)
                    if generation != self.generation =>
                {
                    log::debug!("Dropping result of stale render {}", generation);
                }
                RenderMessage::Element(_, element) => {
                    self.chart_viewer.emit(element);
                    let done = self.chart_viewer.chart_count();
                    if self.expected_charts > 0 {
                        let progress = 100.0 * done as f32 / self.expected_charts as f32;
                        self.control_panel.set_progress(
                            progress.min(99.0),
                            &format!("Rendering chart {}/{}...", done, self.expected_charts),
                        );
                    }
                }
                RenderMessage::Complete(_, summary) => {
                    self.control_panel.set_progress(
                        100.0,
                        &format!(
                            "Complete! {} charts, {} warnings",
                            summary.charts, summary.warnings
                        ),
                    );
                    self.control_panel.export_enabled = true;
                    self.is_rendering = false;
                    should_keep_receiver = false;
                }
                RenderMessage::Error(_, error) => {
                    self.control_panel
                        .set_progress(0.0, &format!("Error: {}", error));
                    self.is_rendering = false;
                    should_keep_receiver = false;
                }
            }
        }

        if should_keep_receiver {
            self.render_rx = Some(rx);
        }
    }

    fn export_report(&self) -> anyhow::Result<PathBuf> {
        let report = HtmlReport::from_elements(self.chart_viewer.elements.iter().cloned());
        let path = report
            .write_to(&self.config.report_dir)
            .with_context(|| format!("exporting to {}", self.config.report_dir.display()))?;
        open::that(&path).with_context(|| format!("opening {}", path.display()))?;
        Ok(path)
    }

    fn handle_export_report(&mut self) {
        match self.export_report() {
            Ok(path) => {
                self.control_panel.set_progress(
                    100.0,
                    &format!("Complete! Report saved to {}", path.display()),
                );
            }
            Err(e) => {
                log::error!("Report export failed: {:#}", e);
                self.control_panel
                    .set_progress(0.0, &format!("Error: {:#}", e));
            }
        }
    }
}

impl eframe::App for MiningDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results(ctx);
        self.check_render_results();

        if self.is_loading || self.is_rendering {
            ctx.request_repaint();
        }

        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::SelectionChanged => {
                            if !self.is_loading {
                                self.start_render(ctx);
                            }
                        }
                        ControlPanelAction::ExportReport => self.handle_export_report(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}
