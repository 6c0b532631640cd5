//! Error types shared across Fleetdash crates.

use std::path::PathBuf;

/// Top-level error type for Fleetdash export operations.
#[derive(Debug, thiserror::Error)]
pub enum FleetdashError {
    #[error("Encoding error ({format}): {message}")]
    Encoding { format: String, message: String },

    #[error("Raster export requires a snapshot surface, but none was provided")]
    MissingSurface,

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Delivery error: {message}")]
    Delivery { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using FleetdashError.
pub type FleetdashResult<T> = Result<T, FleetdashError>;

impl FleetdashError {
    pub fn encoding(format: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Encoding {
            format: format.into(),
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }
}
