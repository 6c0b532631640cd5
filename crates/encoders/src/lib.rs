//! Fleetdash Encoders
//!
//! Pure transformations from `(records, projection)` to artifact bytes.
//!
//! ```text
//! ExportRequest ──┐
//!                 ├── resolve() ──► Projection
//!                 │                     │
//!                 ▼                     ▼
//!          encoder_for(FormatId) ──► EncodeFn ──► Artifact
//!                                   ├── xlsx  (workbook, one "Data" sheet)
//!                                   ├── pdf   (paginated table)
//!                                   ├── json  (records verbatim)
//!                                   └── doc   (legacy HTML table)
//! ```
//!
//! Every encoder visits records in input order and columns in projection
//! order, and is deterministic: the same input always yields the same bytes.
//! The raster snapshot and print formats are not record-driven and have no
//! encoder here.

pub mod doc;
pub mod json;
pub mod pdf;
pub mod xlsx;

use fleetdash_common::config::ExportDefaults;
use fleetdash_common::error::{FleetdashError, FleetdashResult};
use fleetdash_export_model::{Artifact, ColumnDescriptor, ExportRequest, FormatId, Record};

pub use pdf::PdfLayout;

/// Signature shared by every record-driven encoder.
pub type EncodeFn =
    fn(&[Record], &[ColumnDescriptor], &EncodeOptions) -> FleetdashResult<Vec<u8>>;

/// Format-specific knobs, usually derived from the app config.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Worksheet name for the workbook encoder.
    pub sheet_name: String,

    /// Page and table layout for the printable document.
    pub pdf: PdfLayout,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            sheet_name: "Data".to_string(),
            pdf: PdfLayout::default(),
        }
    }
}

impl From<&ExportDefaults> for EncodeOptions {
    fn from(defaults: &ExportDefaults) -> Self {
        Self {
            sheet_name: defaults.sheet_name.clone(),
            pdf: PdfLayout::from(&defaults.pdf),
        }
    }
}

/// Dispatch table from format to encoder.
///
/// Returns `None` for formats that are not produced from records.
pub fn encoder_for(format: FormatId) -> Option<EncodeFn> {
    match format {
        FormatId::Xlsx => Some(xlsx::encode),
        FormatId::Pdf => Some(pdf::encode),
        FormatId::Json => Some(json::encode),
        FormatId::Doc => Some(doc::encode),
        FormatId::Image | FormatId::Print => None,
    }
}

/// Resolve the projection for `request` and encode it as `format`.
pub fn encode_request(
    format: FormatId,
    request: &ExportRequest,
    options: &EncodeOptions,
) -> FleetdashResult<Artifact> {
    let encode = encoder_for(format).ok_or_else(|| {
        FleetdashError::unsupported(format!("{format} is not a record-driven format"))
    })?;
    let (Some(filename), Some(media_type)) = (
        format.filename(&request.filename_base),
        format.media_type(),
    ) else {
        return Err(FleetdashError::unsupported(format!(
            "{format} does not produce a file"
        )));
    };

    let projection = request.projection();
    let bytes = encode(&request.records, &projection, options)?;

    tracing::debug!(
        format = %format,
        rows = request.records.len(),
        columns = projection.len(),
        bytes = bytes.len(),
        "Encoded artifact"
    );

    Ok(Artifact {
        format,
        filename,
        media_type,
        bytes,
    })
}
