//! Fleetdash Export Engine
//!
//! Drives exports from a menu-style trigger through encoding (or raster
//! capture) to host delivery.
//!
//! ```text
//!   ExportTrigger ──select(F)──┬── record formats ──► fleetdash-encoders ──┐
//!                              ├── image ──► SnapshotCapturer (tokio task) ┼──► Delivery::save_file
//!                              └── print ─────────────────────────────────┴──► Delivery::print
//! ```
//!
//! Every accepted selection produces exactly one [`ExportOutcome`] unless the
//! trigger is reset or shut down first.

pub mod delivery;
pub mod snapshot;
pub mod trigger;

pub use delivery::{Delivery, DeliveryReceipt};
pub use snapshot::{encode_png, RasterFrame, SnapshotCapturer, SurfaceRenderer};
pub use trigger::{
    ExportTrigger, MenuOption, PendingExport, SelectError, Selection, TriggerPhase, TriggerState,
};

pub use fleetdash_export_model::ExportOutcome;
