//! Chart eligibility: which charts the page shows for a selection.

use crate::data::{ColumnSelection, TableSchema};

pub const EMPTY_SELECTION_WARNING: &str = "Please select at least one numeric column.";
pub const NO_NUMERIC_HEATMAP_WARNING: &str = "No numeric columns selected for correlation heatmap.";
pub const MORE_VISUALIZATIONS_HEADING: &str = "More Visualizations";

/// A chart and the columns it draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartKind {
    Scatter { x: String, y: String },
    Histogram { column: String },
    Violin { column: String },
    FacetHistogram { column: String },
    Pie,
    Boxplot { column: String },
    CorrelationHeatmap { columns: Vec<String> },
    Pairplot { columns: Vec<String> },
    Regression { x: String, y: String },
    Kde { column: String },
    Strip { column: String },
    Hexbin { x: String, y: String },
}

impl ChartKind {
    /// Selection size the chart needs. The regression and heatmap charts are
    /// gated on the table instead.
    pub fn min_selected(&self) -> usize {
        match self {
            ChartKind::Scatter { .. } | ChartKind::Hexbin { .. } | ChartKind::Pairplot { .. } => 2,
            ChartKind::Histogram { .. }
            | ChartKind::Violin { .. }
            | ChartKind::FacetHistogram { .. }
            | ChartKind::Boxplot { .. }
            | ChartKind::Kde { .. }
            | ChartKind::Strip { .. } => 1,
            ChartKind::Pie | ChartKind::CorrelationHeatmap { .. } | ChartKind::Regression { .. } => 0,
        }
    }

    /// Short identifier, also used for file names in the report.
    pub fn slug(&self) -> &'static str {
        match self {
            ChartKind::Scatter { .. } => "scatter",
            ChartKind::Histogram { .. } => "histogram",
            ChartKind::Violin { .. } => "violin",
            ChartKind::FacetHistogram { .. } => "facet",
            ChartKind::Pie => "pie",
            ChartKind::Boxplot { .. } => "boxplot",
            ChartKind::CorrelationHeatmap { .. } => "heatmap",
            ChartKind::Pairplot { .. } => "pairplot",
            ChartKind::Regression { .. } => "regression",
            ChartKind::Kde { .. } => "kde",
            ChartKind::Strip { .. } => "strip",
            ChartKind::Hexbin { .. } => "hexbin",
        }
    }

    /// Heading shown above the chart on the page.
    pub fn heading(&self, category: &str) -> String {
        match self {
            ChartKind::Scatter { x, y } => format!("{x} vs. {y} Composition"),
            ChartKind::Histogram { column } => format!("Distribution of {column}"),
            ChartKind::Violin { column } => {
                format!("{column} Distribution by {category} (Violin Plot)")
            }
            ChartKind::FacetHistogram { column } => {
                format!("{column} Distribution by {category} (FacetGrid)")
            }
            ChartKind::Pie => format!("{category} Distribution"),
            ChartKind::Boxplot { column } => format!("{column} by {category} (Boxplot)"),
            ChartKind::CorrelationHeatmap { .. } => "Correlation Heatmap".to_string(),
            ChartKind::Pairplot { .. } => "Pairplot of Selected Features".to_string(),
            ChartKind::Regression { x, y } => {
                format!("Regression Plot: {} vs {}", capitalize(x), capitalize(y))
            }
            ChartKind::Kde { column } => format!("KDE Plot of {column}"),
            ChartKind::Strip { column } => format!("Strip Plot of {column} by {category}"),
            ChartKind::Hexbin { x, y } => format!("Hexbin Plot of {x} vs {y}"),
        }
    }

    /// Title drawn inside the chart image.
    pub fn title(&self, category: &str) -> String {
        match self {
            ChartKind::Boxplot { column } => format!("{column} by {category}"),
            ChartKind::CorrelationHeatmap { .. } => {
                "Correlation Heatmap of Selected Features".to_string()
            }
            other => other.heading(category),
        }
    }
}

/// Upper-case the first letter of a column name.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One entry of the page plan, in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStep {
    Heading(String),
    Warning(String),
    Chart(ChartKind),
}

/// Turns a selection and the table schema into an ordered page plan.
pub struct ChartPlanner<'a> {
    pub category_column: &'a str,
    pub regression_x: &'a str,
    pub regression_y: &'a str,
}

impl<'a> ChartPlanner<'a> {
    pub fn new(category_column: &'a str, regression_x: &'a str, regression_y: &'a str) -> Self {
        Self {
            category_column,
            regression_x,
            regression_y,
        }
    }

    fn push_chart(&self, steps: &mut Vec<PlanStep>, selection: &ColumnSelection, kind: ChartKind) {
        if selection.len() >= kind.min_selected() {
            steps.push(PlanStep::Heading(kind.heading(self.category_column)));
            steps.push(PlanStep::Chart(kind));
        }
    }

    /// Build the plan. An empty selection yields only the warning.
    pub fn plan(&self, schema: &TableSchema, selection: &ColumnSelection) -> Vec<PlanStep> {
        let mut steps = Vec::new();
        let (Some(first), pair) = (selection.primary(), selection.pair()) else {
            steps.push(PlanStep::Warning(EMPTY_SELECTION_WARNING.to_string()));
            return steps;
        };
        let first = first.to_string();
        let single = |make: fn(String) -> ChartKind| make(first.clone());

        if let Some((x, y)) = pair {
            self.push_chart(
                &mut steps,
                selection,
                ChartKind::Scatter {
                    x: x.to_string(),
                    y: y.to_string(),
                },
            );
        }
        self.push_chart(&mut steps, selection, single(|column| ChartKind::Histogram { column }));
        self.push_chart(&mut steps, selection, single(|column| ChartKind::Violin { column }));
        self.push_chart(
            &mut steps,
            selection,
            single(|column| ChartKind::FacetHistogram { column }),
        );
        self.push_chart(&mut steps, selection, ChartKind::Pie);
        self.push_chart(&mut steps, selection, single(|column| ChartKind::Boxplot { column }));

        let numeric = selection.numeric_subset(&schema.numeric);
        if numeric.is_empty() {
            let heatmap = ChartKind::CorrelationHeatmap { columns: Vec::new() };
            steps.push(PlanStep::Heading(heatmap.heading(self.category_column)));
            steps.push(PlanStep::Warning(NO_NUMERIC_HEATMAP_WARNING.to_string()));
        } else {
            self.push_chart(
                &mut steps,
                selection,
                ChartKind::CorrelationHeatmap { columns: numeric },
            );
        }

        if selection.len() > 1 {
            self.push_chart(
                &mut steps,
                selection,
                ChartKind::Pairplot {
                    columns: selection.columns().to_vec(),
                },
            );
        }

        if schema.has_column(self.regression_x) && schema.has_column(self.regression_y) {
            self.push_chart(
                &mut steps,
                selection,
                ChartKind::Regression {
                    x: self.regression_x.to_string(),
                    y: self.regression_y.to_string(),
                },
            );
        }

        steps.push(PlanStep::Heading(MORE_VISUALIZATIONS_HEADING.to_string()));

        self.push_chart(&mut steps, selection, single(|column| ChartKind::Kde { column }));
        self.push_chart(&mut steps, selection, single(|column| ChartKind::Strip { column }));
        if let Some((x, y)) = pair {
            self.push_chart(
                &mut steps,
                selection,
                ChartKind::Hexbin {
                    x: x.to_string(),
                    y: y.to_string(),
                },
            );
        }

        steps
    }
}

/// Charts of a plan, in order.
pub fn charts_of(steps: &[PlanStep]) -> Vec<&ChartKind> {
    steps
        .iter()
        .filter_map(|step| match step {
            PlanStep::Chart(kind) => Some(kind),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(columns: &[&str], numeric: &[&str]) -> TableSchema {
        TableSchema {
            columns: columns.iter().map(|s| s.to_string()).collect(),
            numeric: numeric.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn mining_schema() -> TableSchema {
        schema(
            &["Celestial Body", "iron", "nickel", "sulfur"],
            &["iron", "nickel", "sulfur"],
        )
    }

    fn planner() -> ChartPlanner<'static> {
        ChartPlanner::new("Celestial Body", "iron", "nickel")
    }

    fn slugs(steps: &[PlanStep]) -> Vec<&'static str> {
        charts_of(steps).iter().map(|k| k.slug()).collect()
    }

    #[test]
    fn three_columns_render_every_chart_in_order() {
        let selection = ColumnSelection::new(["iron", "nickel", "sulfur"]);
        let steps = planner().plan(&mining_schema(), &selection);

        assert_eq!(
            slugs(&steps),
            vec![
                "scatter", "histogram", "violin", "facet", "pie", "boxplot", "heatmap",
                "pairplot", "regression", "kde", "strip", "hexbin"
            ]
        );

        let charts = charts_of(&steps);
        assert_eq!(
            charts[0],
            &ChartKind::Scatter {
                x: "iron".into(),
                y: "nickel".into()
            }
        );
        assert_eq!(
            charts[6],
            &ChartKind::CorrelationHeatmap {
                columns: vec!["iron".into(), "nickel".into(), "sulfur".into()]
            }
        );
        assert_eq!(
            charts[11],
            &ChartKind::Hexbin {
                x: "iron".into(),
                y: "nickel".into()
            }
        );
        assert!(!steps.iter().any(|s| matches!(s, PlanStep::Warning(_))));
    }

    #[test]
    fn every_chart_is_preceded_by_its_heading() {
        let selection = ColumnSelection::new(["iron", "nickel"]);
        let steps = planner().plan(&mining_schema(), &selection);
        for (i, step) in steps.iter().enumerate() {
            if let PlanStep::Chart(kind) = step {
                assert_eq!(
                    steps[i - 1],
                    PlanStep::Heading(kind.heading("Celestial Body"))
                );
            }
        }
        assert!(steps.contains(&PlanStep::Heading(MORE_VISUALIZATIONS_HEADING.into())));
    }

    #[test]
    fn empty_selection_only_warns() {
        let steps = planner().plan(&mining_schema(), &ColumnSelection::default());
        assert_eq!(
            steps,
            vec![PlanStep::Warning(EMPTY_SELECTION_WARNING.to_string())]
        );
    }

    #[test]
    fn single_column_skips_bivariate_charts() {
        let selection = ColumnSelection::new(["sulfur"]);
        let steps = planner().plan(&mining_schema(), &selection);
        let kinds = slugs(&steps);

        for bivariate in ["scatter", "hexbin", "pairplot"] {
            assert!(!kinds.contains(&bivariate), "{bivariate} should be skipped");
        }
        assert!(kinds.contains(&"regression"));
        assert!(charts_of(&steps).contains(&&ChartKind::Kde {
            column: "sulfur".into()
        }));
    }

    #[test]
    fn regression_depends_on_table_not_selection() {
        let no_metals = schema(&["Celestial Body", "sulfur"], &["sulfur"]);
        let selection = ColumnSelection::new(["sulfur"]);
        let steps = planner().plan(&no_metals, &selection);
        let kinds = slugs(&steps);
        assert!(!kinds.contains(&"regression"));
        assert_eq!(
            kinds,
            vec!["histogram", "violin", "facet", "pie", "boxplot", "heatmap", "kde", "strip"]
        );

        let only_iron = schema(&["Celestial Body", "iron", "sulfur"], &["iron", "sulfur"]);
        assert!(!slugs(&planner().plan(&only_iron, &selection)).contains(&"regression"));
    }

    #[test]
    fn heatmap_warns_without_numeric_selection() {
        let selection = ColumnSelection::new(["Celestial Body"]);
        let steps = planner().plan(&mining_schema(), &selection);

        assert!(!slugs(&steps).contains(&"heatmap"));
        let heading_at = steps
            .iter()
            .position(|s| *s == PlanStep::Heading("Correlation Heatmap".into()))
            .unwrap();
        assert_eq!(
            steps[heading_at + 1],
            PlanStep::Warning(NO_NUMERIC_HEATMAP_WARNING.to_string())
        );
    }

    #[test]
    fn heatmap_uses_numeric_intersection() {
        let selection = ColumnSelection::new(["Celestial Body", "nickel"]);
        let steps = planner().plan(&mining_schema(), &selection);
        assert!(charts_of(&steps).contains(&&ChartKind::CorrelationHeatmap {
            columns: vec!["nickel".into()]
        }));
    }

    #[test]
    fn headings_name_the_columns() {
        let scatter = ChartKind::Scatter {
            x: "iron".into(),
            y: "nickel".into(),
        };
        assert_eq!(scatter.heading("Celestial Body"), "iron vs. nickel Composition");
        let regression = ChartKind::Regression {
            x: "iron".into(),
            y: "nickel".into(),
        };
        assert_eq!(regression.heading("Celestial Body"), "Regression Plot: Iron vs Nickel");
        assert_eq!(
            ChartKind::Boxplot {
                column: "iron".into()
            }
            .title("Celestial Body"),
            "iron by Celestial Body"
        );
    }
}
