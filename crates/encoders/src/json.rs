//! Structured text export.
//!
//! The record array is written verbatim; column projection does not apply.

use fleetdash_common::error::{FleetdashError, FleetdashResult};
use fleetdash_export_model::{ColumnDescriptor, Record};

use crate::EncodeOptions;

/// Pretty-print `records` with two-space indentation, preserving field order.
pub fn encode(
    records: &[Record],
    _projection: &[ColumnDescriptor],
    _options: &EncodeOptions,
) -> FleetdashResult<Vec<u8>> {
    serde_json::to_vec_pretty(records).map_err(|e| FleetdashError::encoding("json", e.to_string()))
}
