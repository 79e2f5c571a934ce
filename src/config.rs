//! Dashboard Configuration
//! Loads dashboard settings from a JSON file, falling back to built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SPACE_MINING_VIZ_CONFIG";

/// Config file looked up in the working directory when the env var is unset.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Settings for one dashboard page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub dataset_path: PathBuf,
    pub category_column: String,
    pub default_selection_size: usize,
    pub regression_x: String,
    pub regression_y: String,
    pub histogram_bins: usize,
    pub facet_bins: usize,
    pub hexbin_gridsize: usize,
    pub kde_points: usize,
    pub report_dir: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("space_mining_dataset.csv"),
            category_column: "Celestial Body".to_string(),
            default_selection_size: 3,
            regression_x: "iron".to_string(),
            regression_y: "nickel".to_string(),
            histogram_bins: 20,
            facet_bins: 15,
            hexbin_gridsize: 30,
            kde_points: 200,
            report_dir: PathBuf::from("report"),
        }
    }
}

impl DashboardConfig {
    /// Resolve the config location: env var first, then `dashboard.json`.
    ///
    /// A missing `dashboard.json` yields the defaults; a missing file named by
    /// the env var is an error.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    log::info!("No {} found, using default settings", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    /// Read settings from a JSON file. Keys left out keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded dashboard config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_describe_the_mining_page() {
        let config = DashboardConfig::default();
        assert_eq!(config.category_column, "Celestial Body");
        assert_eq!(config.default_selection_size, 3);
        assert_eq!(config.histogram_bins, 20);
        assert_eq!(config.facet_bins, 15);
        assert_eq!(config.hexbin_gridsize, 30);
        assert_eq!(config.regression_x, "iron");
        assert_eq!(config.regression_y, "nickel");
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "histogram_bins": 40, "dataset_path": "sites.csv" }}"#).unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.histogram_bins, 40);
        assert_eq!(config.dataset_path, PathBuf::from("sites.csv"));
        assert_eq!(config.category_column, "Celestial Body");
        assert_eq!(config.hexbin_gridsize, 30);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = DashboardConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DashboardConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
