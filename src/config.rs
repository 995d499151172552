//! Dashboard configuration.
//!
//! Settings live in an optional `cartera_dashboard.json` next to the
//! working directory. Every field has a default, so a partial file only
//! overrides what it names.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE: &str = "cartera_dashboard.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Separator must be a single ASCII character, got {0:?}")]
    Separator(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Dataset loaded at startup.
    pub dataset_path: PathBuf,

    /// Field separator of the dataset.
    pub separator: String,

    /// Initial window size in points.
    pub window_size: [f32; 2],

    /// Height of each interactive panel.
    pub panel_height: f32,

    /// Pixel size of a full dashboard export (2x2 grid).
    pub export_size: [u32; 2],

    /// Open exported files with the system viewer.
    pub open_after_export: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("dataset_sintetico_creditos.csv"),
            separator: ",".to_string(),
            window_size: [1400.0, 800.0],
            panel_height: 300.0,
            export_size: [1600, 1000],
            open_after_export: true,
        }
    }
}

impl DashboardConfig {
    /// Read and parse a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.separator_byte()?;
        Ok(config)
    }

    /// Load `path` if it exists; fall back to defaults on any problem.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(config) => {
                info!(path = %path.display(), "loaded configuration");
                config
            }
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// The separator as the byte Polars expects.
    pub fn separator_byte(&self) -> Result<u8, ConfigError> {
        match self.separator.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(ConfigError::Separator(self.separator.clone())),
        }
    }

    pub fn export_dimensions(&self) -> (u32, u32) {
        (self.export_size[0], self.export_size[1])
    }

    /// Size of a single-panel SVG, one quadrant of the full export.
    pub fn panel_dimensions(&self) -> (u32, u32) {
        (self.export_size[0] / 2, self.export_size[1] / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "separator": ";", "panel_height": 250.0 }}"#).unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.separator_byte().unwrap(), b';');
        assert_eq!(config.panel_height, 250.0);
        assert_eq!(
            config.dataset_path,
            PathBuf::from("dataset_sintetico_creditos.csv")
        );
    }

    #[test]
    fn malformed_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(matches!(
            DashboardConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
        assert_eq!(
            DashboardConfig::load_or_default(file.path()),
            DashboardConfig::default()
        );
    }

    #[test]
    fn rejects_multi_char_separator() {
        let config = DashboardConfig {
            separator: "||".to_string(),
            ..Default::default()
        };
        assert!(config.separator_byte().is_err());
    }

    #[test]
    fn missing_file_is_default() {
        let config = DashboardConfig::load_or_default(Path::new("/nonexistent/cartera.json"));
        assert_eq!(config, DashboardConfig::default());
    }
}
