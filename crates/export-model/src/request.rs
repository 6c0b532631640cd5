//! Export requests, finished artifacts, and observable outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::column::{resolve, ColumnDescriptor, Projection};
use crate::format::FormatId;
use crate::record::Record;

/// Opaque handle naming the on-screen region to rasterize.
///
/// The engine never interprets it; the rendering collaborator resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceRef(String);

impl SurfaceRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurfaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything a single export button is bound to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Rows to export, in display order.
    pub records: Vec<Record>,

    /// Explicit column order and labels. `None` infers from the first record.
    #[serde(default)]
    pub columns: Option<Vec<ColumnDescriptor>>,

    /// Base name for saved files.
    #[serde(default = "default_filename_base")]
    pub filename_base: String,

    /// Region used by the raster snapshot export.
    #[serde(default)]
    pub surface: Option<SurfaceRef>,
}

fn default_filename_base() -> String {
    "export".to_string()
}

impl ExportRequest {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            columns: None,
            filename_base: default_filename_base(),
            surface: None,
        }
    }

    pub fn with_columns(mut self, columns: Vec<ColumnDescriptor>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_filename_base(mut self, base: impl Into<String>) -> Self {
        self.filename_base = base.into();
        self
    }

    pub fn with_surface(mut self, surface: SurfaceRef) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Resolve the projection every record-driven encoder uses.
    pub fn projection(&self) -> Projection {
        resolve(&self.records, self.columns.as_deref())
    }

    /// Why `format` cannot currently be selected for this request, if anything.
    pub fn unavailable_reason(&self, format: FormatId) -> Option<&'static str> {
        if format.requires_surface() && self.surface.is_none() {
            return Some("no snapshot surface is attached to this export");
        }
        None
    }
}

/// An encoded export, ready to hand to the delivery collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub format: FormatId,
    pub filename: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Job description handed to the host print facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJob {
    /// Title shown by the host print dialog / spooler.
    pub title: String,

    /// Region the print view was opened from, when known.
    pub surface: Option<SurfaceRef>,
}

/// What happened to one completed export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportOutcome {
    /// An artifact was encoded and saved by the host.
    Delivered {
        format: FormatId,
        filename: String,
        bytes_written: usize,
    },

    /// The host print facility accepted the job.
    Printed,

    /// The export failed. Nothing was delivered.
    Failed { format: FormatId, reason: String },
}

impl ExportOutcome {
    pub fn format(&self) -> FormatId {
        match self {
            ExportOutcome::Delivered { format, .. } | ExportOutcome::Failed { format, .. } => {
                *format
            }
            ExportOutcome::Printed => FormatId::Print,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, ExportOutcome::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let request: ExportRequest = serde_json::from_value(json!({"records": []})).unwrap();
        assert_eq!(request.filename_base, "export");
        assert!(request.columns.is_none());
        assert!(request.surface.is_none());
    }

    #[test]
    fn test_image_unavailable_without_surface() {
        let request = ExportRequest::new(Vec::new());
        assert!(request.unavailable_reason(FormatId::Image).is_some());
        assert!(request.unavailable_reason(FormatId::Pdf).is_none());

        let request = request.with_surface(SurfaceRef::new("vehicles-table"));
        assert!(request.unavailable_reason(FormatId::Image).is_none());
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = ExportOutcome::Failed {
            format: FormatId::Image,
            reason: "boom".to_string(),
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["format"], "image");
        assert_eq!(outcome.format(), FormatId::Image);
        assert!(!outcome.is_success());
    }
}
