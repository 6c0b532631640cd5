//! Hand-off of finished exports to the host environment.

use fleetdash_common::error::FleetdashResult;
use fleetdash_export_model::{Artifact, PrintJob};

/// Where a saved artifact ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Host-specific location (a path for file-backed hosts).
    pub location: String,

    /// Bytes persisted.
    pub bytes_written: usize,
}

/// Host capabilities the export engine depends on.
///
/// Implementations must not partially deliver: either the whole artifact is
/// persisted or an error is returned.
pub trait Delivery: Send + Sync {
    /// Persist `artifact` under its derived filename.
    fn save_file(&self, artifact: &Artifact) -> FleetdashResult<DeliveryReceipt>;

    /// Open the host print facility for the current view.
    fn print(&self, job: &PrintJob) -> FleetdashResult<()>;

    /// Host name for logging.
    fn name(&self) -> &str;
}
