//! HTML Report Export
//! Collects a rendered page and writes it as a single HTML file with inline SVG charts.

use crate::page::{PageElement, PageSink};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const REPORT_FILE: &str = "index.html";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Report is empty")]
    Empty,
}

const STYLE: &str = "body{font-family:sans-serif;max-width:1240px;margin:2em auto;color:#262626}\
h2{margin-top:1.6em}\
.warning{background:#fff3cd;border:1px solid #ffe08a;padding:.6em 1em;border-radius:4px}\
figure{margin:1em 0}figure svg{max-width:100%;height:auto}";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Page sink that builds an HTML document.
#[derive(Debug, Default)]
pub struct HtmlReport {
    elements: Vec<PageElement>,
}

impl HtmlReport {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from elements already collected elsewhere, e.g. by the viewer.
    pub fn from_elements(elements: impl IntoIterator<Item = PageElement>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
        }
    }

    pub fn to_html(&self) -> String {
        let title = self
            .elements
            .iter()
            .find_map(|e| match e {
                PageElement::Title(t) => Some(t.as_str()),
                _ => None,
            })
            .unwrap_or("Report");

        let mut html = String::new();
        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n",
            escape(title),
            STYLE
        );

        for element in &self.elements {
            let _ = match element {
                PageElement::Title(text) => writeln!(html, "<h1>{}</h1>", escape(text)),
                PageElement::Text(text) => writeln!(html, "<p>{}</p>", escape(text)),
                PageElement::Heading(text) => writeln!(html, "<h2>{}</h2>", escape(text)),
                PageElement::Warning(text) => {
                    writeln!(html, "<div class=\"warning\">{}</div>", escape(text))
                }
                PageElement::Chart(chart) => writeln!(
                    html,
                    "<figure class=\"chart\" data-kind=\"{}\" title=\"{}\">\n{}\n</figure>",
                    chart.kind.slug(),
                    escape(&chart.title),
                    chart.svg.trim()
                ),
            };
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    /// Write `index.html` into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        if self.elements.is_empty() {
            return Err(ReportError::Empty);
        }
        fs::create_dir_all(dir).map_err(|source| ReportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(REPORT_FILE);
        fs::write(&path, self.to_html()).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;

        log::info!("Report written to {}", path.display());
        Ok(path)
    }
}

impl PageSink for HtmlReport {
    fn emit(&mut self, element: PageElement) {
        self.elements.push(element);
    }
}
