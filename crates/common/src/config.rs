//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FleetdashError, FleetdashResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default export settings.
    #[serde(default)]
    pub export: ExportDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default export parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Directory that saved artifacts are written to.
    pub output_dir: PathBuf,

    /// Filename base used when the caller does not supply one.
    pub filename_base: String,

    /// Append `_<YYYY-MM-DD>` to the default filename base.
    pub append_date: bool,

    /// Worksheet name used by the workbook encoder.
    pub sheet_name: String,

    /// Printable document layout.
    pub pdf: PdfDefaults,

    /// Host print command. The job title and optional surface path are appended.
    pub print_command: Vec<String>,
}

/// Page and table styling for the printable document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfDefaults {
    /// Page width in points (A4 portrait by default).
    pub page_width_pt: f64,
    pub page_height_pt: f64,

    /// Margin on every side, in points.
    pub margin_pt: f64,

    /// Table text size in points.
    pub font_size_pt: f64,

    /// Header row background as `#rrggbb`.
    pub header_fill: String,

    /// Shade every other body row.
    pub striped: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "fleetdash=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            export: ExportDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            output_dir: dirs_default_exports(),
            filename_base: "Fleet_Report".to_string(),
            append_date: true,
            sheet_name: "Data".to_string(),
            pdf: PdfDefaults::default(),
            print_command: vec!["lp".to_string(), "-t".to_string()],
        }
    }
}

impl Default for PdfDefaults {
    fn default() -> Self {
        Self {
            page_width_pt: 595.28,
            page_height_pt: 841.89,
            margin_pt: 40.0,
            font_size_pt: 9.0,
            header_fill: "#0ea5e9".to_string(),
            striped: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load_from(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    /// Load config from `path`.
    pub fn load_from(path: &Path) -> FleetdashResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FleetdashError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            FleetdashError::config(format!("cannot parse {}: {e}", path.display()))
        })
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<PathBuf, std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(&config_path, json)?;
        Ok(config_path)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("fleetdash").join("config.json")
}

/// Default export directory.
fn dirs_default_exports() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("fleetdash").join("exports")
}
