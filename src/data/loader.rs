//! CSV Data Loader Module
//! Loads the mining-site table with Polars and exposes its schema.

use polars::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV {path}: {source}")]
    CsvError { path: String, source: PolarsError },
    #[error("Dataset not found: {0}")]
    NotFound(String),
}

/// Column names of a loaded table, split into all and numeric.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    pub columns: Vec<String>,
    pub numeric: Vec<String>,
}

impl TableSchema {
    /// Derive the schema of a DataFrame.
    pub fn of(df: &DataFrame) -> Self {
        Self {
            columns: df
                .get_column_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            numeric: DataLoader::numeric_columns(df),
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

/// Reads the dataset from disk. Every render loads a fresh copy.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file using Polars.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(LoaderError::NotFound(display));
        }

        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(|source| LoaderError::CsvError {
                path: display.clone(),
                source,
            })?;

        log::info!(
            "Loaded {} rows, {} columns from {}",
            df.height(),
            df.width(),
            display
        );
        Ok(df)
    }

    /// Whether a dtype counts as numeric for column selection.
    pub fn is_numeric_dtype(dtype: &DataType) -> bool {
        matches!(
            dtype,
            DataType::Float32
                | DataType::Float64
                | DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
        )
    }

    /// Get list of numeric column names, in table order.
    pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|col| Self::is_numeric_dtype(col.dtype()))
            .map(|col| col.name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
Celestial Body,iron,nickel,sulfur,site_count
Moon,10.5,3.2,0.4,2
Mars,22.1,5.9,1.1,4
Moon,11.0,2.8,0.3,1
Ceres,40.2,9.4,2.2,7
";

    #[test]
    fn loads_csv_and_splits_numeric_columns() {
        let mut file = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let df = DataLoader::load_csv(file.path()).unwrap();
        assert_eq!(df.height(), 4);

        let schema = TableSchema::of(&df);
        assert_eq!(schema.columns.len(), 5);
        assert_eq!(schema.numeric, vec!["iron", "nickel", "sulfur", "site_count"]);
        assert!(schema.has_column("Celestial Body"));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = DataLoader::load_csv(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(_)));
    }
}
