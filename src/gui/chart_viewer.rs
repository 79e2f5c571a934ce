//! Chart Viewer Widget
//! Scrollable page view: headings, warnings and the rendered SVG charts.

use crate::page::{PageElement, PageSink};
use egui::{Color32, RichText, ScrollArea};

const CHART_SPACING: f32 = 15.0;

/// Shows the elements of the latest page render in order.
#[derive(Default)]
pub struct ChartViewer {
    pub elements: Vec<PageElement>,
    /// Render generation the elements belong to; part of each image URI.
    generation: u64,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the current page and start collecting `generation`.
    pub fn reset(&mut self, ctx: &egui::Context, generation: u64) {
        self.elements.clear();
        self.generation = generation;
        ctx.forget_all_images();
    }

    pub fn chart_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e, PageElement::Chart(_)))
            .count()
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        if self.elements.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        }

        let generation = self.generation;
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (idx, element) in self.elements.iter().enumerate() {
                    match element {
                        PageElement::Title(text) => {
                            ui.label(RichText::new(text).size(28.0).strong());
                        }
                        PageElement::Text(text) => {
                            ui.label(RichText::new(text).size(14.0));
                            ui.add_space(CHART_SPACING);
                        }
                        PageElement::Heading(text) => {
                            ui.add_space(CHART_SPACING);
                            ui.label(RichText::new(text).size(20.0).strong());
                            ui.add_space(5.0);
                        }
                        PageElement::Warning(text) => {
                            egui::Frame::none()
                                .rounding(5.0)
                                .stroke(egui::Stroke::new(1.0, Color32::from_rgb(255, 193, 7)))
                                .fill(Color32::from_rgb(255, 243, 205))
                                .inner_margin(8.0)
                                .show(ui, |ui| {
                                    ui.label(
                                        RichText::new(format!("⚠ {}", text))
                                            .color(Color32::from_rgb(133, 100, 4)),
                                    );
                                });
                        }
                        PageElement::Chart(chart) => {
                            let width = (chart.width as f32).min(ui.available_width());
                            let image = egui::Image::from_bytes(
                                format!("bytes://chart-{}-{}.svg", generation, idx),
                                chart.svg.clone().into_bytes(),
                            )
                            .fit_to_exact_size(egui::vec2(
                                width,
                                width * chart.height as f32 / chart.width as f32,
                            ))
                            .bg_fill(Color32::WHITE);
                            ui.add(image)
                                .on_hover_text(format!("{} ({} marks)", chart.title, chart.marks));
                        }
                    }
                }
            });
    }
}

impl PageSink for ChartViewer {
    fn emit(&mut self, element: PageElement) {
        self.elements.push(element);
    }
}
