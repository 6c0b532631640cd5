//! Fleetdash Export Model
//!
//! Data types shared by the encoders, the export trigger, and host
//! integrations:
//!
//! - [`Record`]: one dataset row, an ordered JSON object
//! - [`ColumnDescriptor`] / [`Projection`]: which keys are exported and how
//!   they are labelled, with [`resolve`] deriving one when none is supplied
//! - [`FormatId`]: the closed set of export formats
//! - [`ExportRequest`], [`Artifact`], [`ExportOutcome`]: the request/result
//!   lifecycle of one export

pub mod column;
pub mod format;
pub mod record;
pub mod request;

pub use column::{resolve, ColumnDescriptor, ColumnParseError, Projection};
pub use format::{FormatId, UnknownFormat};
pub use record::{cell, display_text, parse_records, Record, RecordParseError};
pub use request::{Artifact, ExportOutcome, ExportRequest, PrintJob, SurfaceRef};
