//! Data Processor Module
//! Extracts typed vectors, category groupings and counts from the table.

use super::loader::DataLoader;
use polars::prelude::*;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column not found: {0}")]
    MissingColumn(String),
    #[error("Column {column} is not numeric ({dtype})")]
    NotNumeric { column: String, dtype: String },
}

/// Handles column extraction and grouping for the charts.
pub struct DataProcessor;

impl DataProcessor {
    fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, ProcessorError> {
        df.column(name)
            .map_err(|_| ProcessorError::MissingColumn(name.to_string()))
    }

    /// Cast a numeric column to f64, keeping nulls as `None`.
    pub fn column_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, ProcessorError> {
        let column = Self::column(df, name)?;
        if !DataLoader::is_numeric_dtype(column.dtype()) {
            return Err(ProcessorError::NotNumeric {
                column: name.to_string(),
                dtype: column.dtype().to_string(),
            });
        }
        let value_f64 = column.cast(&DataType::Float64)?;
        let value_ca = value_f64.f64()?;
        Ok(value_ca
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect())
    }

    /// Read a column as strings, keeping nulls as `None`.
    fn category_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, ProcessorError> {
        let column = Self::column(df, name)?;
        let as_str = column.cast(&DataType::String)?;
        let str_ca = as_str.as_materialized_series().str()?;
        Ok(str_ca
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect())
    }

    /// Non-null values of a numeric column.
    pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, ProcessorError> {
        Ok(Self::column_values(df, name)?.into_iter().flatten().collect())
    }

    /// Row-aligned (x, y) pairs where both values are present.
    pub fn paired_values(
        df: &DataFrame,
        x_col: &str,
        y_col: &str,
    ) -> Result<Vec<(f64, f64)>, ProcessorError> {
        let xs = Self::column_values(df, x_col)?;
        let ys = Self::column_values(df, y_col)?;
        Ok(xs
            .into_iter()
            .zip(ys)
            .filter_map(|(x, y)| Some((x?, y?)))
            .collect())
    }

    /// Numeric values grouped by category, groups in first-appearance order.
    pub fn values_by_category(
        df: &DataFrame,
        category_col: &str,
        value_col: &str,
    ) -> Result<Vec<(String, Vec<f64>)>, ProcessorError> {
        let groups = Self::category_column(df, category_col)?;
        let values = Self::column_values(df, value_col)?;

        let mut order: Vec<String> = Vec::new();
        let mut grouped: HashMap<String, Vec<f64>> = HashMap::new();
        for (group, value) in groups.into_iter().zip(values) {
            let Some(group) = group else { continue };
            if !grouped.contains_key(&group) {
                order.push(group.clone());
            }
            let entry = grouped.entry(group).or_default();
            if let Some(v) = value {
                entry.push(v);
            }
        }

        Ok(order
            .into_iter()
            .map(|g| {
                let values = grouped.remove(&g).unwrap_or_default();
                (g, values)
            })
            .collect())
    }

    /// (x, y) pairs grouped by category, groups in first-appearance order.
    pub fn pairs_by_category(
        df: &DataFrame,
        category_col: &str,
        x_col: &str,
        y_col: &str,
    ) -> Result<Vec<(String, Vec<(f64, f64)>)>, ProcessorError> {
        let groups = Self::category_column(df, category_col)?;
        let xs = Self::column_values(df, x_col)?;
        let ys = Self::column_values(df, y_col)?;

        let mut result: Vec<(String, Vec<(f64, f64)>)> = Vec::new();
        for ((group, x), y) in groups.into_iter().zip(xs).zip(ys) {
            let Some(group) = group else { continue };
            let idx = match result.iter().position(|(g, _)| *g == group) {
                Some(idx) => idx,
                None => {
                    result.push((group, Vec::new()));
                    result.len() - 1
                }
            };
            if let (Some(x), Some(y)) = (x, y) {
                result[idx].1.push((x, y));
            }
        }
        Ok(result)
    }

    /// Category counts, most frequent first; ties keep first-appearance order.
    pub fn category_counts(
        df: &DataFrame,
        category_col: &str,
    ) -> Result<Vec<(String, usize)>, ProcessorError> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for value in Self::category_column(df, category_col)?.into_iter().flatten() {
            match counts.iter_mut().find(|(name, _)| *name == value) {
                Some((_, count)) => *count += 1,
                None => counts.push((value, 1)),
            }
        }
        // Stable sort keeps first-appearance order among equal counts.
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sites() -> DataFrame {
        df!(
            "Celestial Body" => ["Moon", "Mars", "Moon", "Ceres", "Mars", "Moon"],
            "iron" => [Some(10.0), Some(20.0), None, Some(40.0), Some(22.0), Some(12.0)],
            "nickel" => [3.0, 6.0, 2.5, 9.0, 5.5, 3.5],
            "site_count" => [1i64, 2, 3, 4, 5, 6]
        )
        .unwrap()
    }

    #[test]
    fn numeric_values_skip_nulls_and_cast_integers() {
        let df = sites();
        assert_eq!(
            DataProcessor::numeric_values(&df, "iron").unwrap(),
            vec![10.0, 20.0, 40.0, 22.0, 12.0]
        );
        assert_eq!(
            DataProcessor::numeric_values(&df, "site_count").unwrap(),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn non_numeric_and_missing_columns_fail() {
        let df = sites();
        assert!(matches!(
            DataProcessor::numeric_values(&df, "Celestial Body"),
            Err(ProcessorError::NotNumeric { .. })
        ));
        assert!(matches!(
            DataProcessor::numeric_values(&df, "cobalt"),
            Err(ProcessorError::MissingColumn(_))
        ));
    }

    #[test]
    fn paired_values_drop_incomplete_rows() {
        let df = sites();
        let pairs = DataProcessor::paired_values(&df, "iron", "nickel").unwrap();
        assert_eq!(pairs.len(), 5);
        assert_eq!(pairs[0], (10.0, 3.0));
        assert_eq!(pairs[2], (40.0, 9.0));
    }

    #[test]
    fn groups_follow_first_appearance() {
        let df = sites();
        let groups = DataProcessor::values_by_category(&df, "Celestial Body", "nickel").unwrap();
        let names: Vec<&str> = groups.iter().map(|(g, _)| g.as_str()).collect();
        assert_eq!(names, vec!["Moon", "Mars", "Ceres"]);
        assert_eq!(groups[0].1, vec![3.0, 2.5, 3.5]);
        assert_eq!(groups[2].1, vec![9.0]);

        let pairs =
            DataProcessor::pairs_by_category(&df, "Celestial Body", "iron", "nickel").unwrap();
        assert_eq!(pairs[0].1, vec![(10.0, 3.0), (12.0, 3.5)]);
    }

    #[test]
    fn counts_are_sorted_by_frequency() {
        let df = sites();
        let counts = DataProcessor::category_counts(&df, "Celestial Body").unwrap();
        assert_eq!(
            counts,
            vec![
                ("Moon".to_string(), 3),
                ("Mars".to_string(), 2),
                ("Ceres".to_string(), 1)
            ]
        );
    }
}
