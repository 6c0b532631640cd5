//! Export trigger: the menu-driven, single-flight export state machine.
//!
//! ```text
//!   Closed ──open──► Open ──select(F)──► Exporting(F) ──done──► Closed
//!     ▲               │                        │
//!     └───dismiss─────┘                        └──(reset / shutdown: result dropped)
//! ```
//!
//! At most one export is in flight per trigger. Record-driven formats and
//! print complete inside [`ExportTrigger::select`]; the raster snapshot runs
//! on a tokio task and completes later. Each export is stamped with a
//! generation; a completion whose generation is no longer current is
//! discarded without touching state or emitting an outcome.
//!
//! An export claims its generation right before it hands bytes to the
//! delivery host. From then on it can no longer be aborted, and its outcome
//! is emitted even if the trigger is reset or shut down in the meantime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle};

use fleetdash_common::error::{FleetdashError, FleetdashResult};
use fleetdash_encoders::{encode_request, EncodeOptions};
use fleetdash_export_model::{Artifact, ExportOutcome, ExportRequest, FormatId, PrintJob};

use crate::delivery::Delivery;
use crate::snapshot::SnapshotCapturer;

/// Phase of the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPhase {
    /// Menu hidden, nothing running.
    Closed,
    /// Menu visible, waiting for a selection.
    Open,
    /// An export of the given format is in flight.
    Exporting(FormatId),
}

/// Observable state, published on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TriggerState {
    pub menu_open: bool,
    pub active_format: Option<FormatId>,
}

impl From<TriggerPhase> for TriggerState {
    fn from(phase: TriggerPhase) -> Self {
        match phase {
            TriggerPhase::Closed => Self::default(),
            TriggerPhase::Open => Self {
                menu_open: true,
                active_format: None,
            },
            TriggerPhase::Exporting(format) => Self {
                menu_open: true,
                active_format: Some(format),
            },
        }
    }
}

/// One entry of the export menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuOption {
    pub format: FormatId,
    pub label: &'static str,

    /// Not selectable: unavailable for this request, or another export is
    /// in flight.
    pub disabled: bool,

    /// This format is the one currently exporting.
    pub busy: bool,
}

/// Why a selection was refused. Refusals leave the state untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    #[error("Export menu is not open")]
    MenuClosed,

    #[error("An export is already in progress ({active})")]
    Busy { active: FormatId },

    #[error("{format} export is unavailable: {reason}")]
    Disabled {
        format: FormatId,
        reason: &'static str,
    },

    #[error("Export trigger has been shut down")]
    ShutDown,
}

/// Result of an accepted selection.
#[derive(Debug)]
pub enum Selection {
    /// The export already finished; its outcome has also been emitted.
    Completed(ExportOutcome),

    /// The export is running in the background.
    Pending(PendingExport),
}

/// Handle to a background export.
#[derive(Debug)]
pub struct PendingExport {
    format: FormatId,
    handle: JoinHandle<Option<ExportOutcome>>,
}

impl PendingExport {
    pub fn format(&self) -> FormatId {
        self.format
    }

    /// Wait for the export to settle.
    ///
    /// Returns `None` when the result was discarded because the trigger was
    /// reset or shut down first.
    pub async fn wait(self) -> Option<ExportOutcome> {
        self.handle.await.ok().flatten()
    }
}

struct Shared {
    phase: TriggerPhase,
    generation: u64,
    pending: Option<AbortHandle>,
    /// Generations past the point of no return.
    delivering: Vec<u64>,
    shut_down: bool,
    state_tx: watch::Sender<TriggerState>,
}

impl Shared {
    fn set_phase(&mut self, phase: TriggerPhase) {
        if self.phase != phase {
            tracing::debug!(from = ?self.phase, to = ?phase, "Trigger transition");
            self.phase = phase;
            self.state_tx.send_replace(phase.into());
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        !self.shut_down && self.generation == generation
    }
}

/// State shared with background export tasks.
struct Core {
    shared: Mutex<Shared>,
    delivery: Arc<dyn Delivery>,
    outcome_tx: mpsc::UnboundedSender<ExportOutcome>,
}

impl Core {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Commit the export stamped `generation` to delivery.
    ///
    /// Returns `false` when it is stale. A claimed export is detached from
    /// its abort handle.
    fn claim(&self, generation: u64) -> bool {
        let mut shared = self.lock();
        if !shared.is_current(generation) {
            return false;
        }
        shared.pending = None;
        shared.delivering.push(generation);
        true
    }

    fn deliver(&self, format: FormatId, artifact: FleetdashResult<Artifact>) -> ExportOutcome {
        let artifact = match artifact {
            Ok(artifact) => artifact,
            Err(e) => return failed(format, e),
        };
        match self.delivery.save_file(&artifact) {
            Ok(receipt) => {
                tracing::info!(
                    format = %format,
                    location = %receipt.location,
                    bytes = receipt.bytes_written,
                    host = self.delivery.name(),
                    "Export delivered"
                );
                ExportOutcome::Delivered {
                    format,
                    filename: artifact.filename,
                    bytes_written: receipt.bytes_written,
                }
            }
            Err(e) => failed(format, e),
        }
    }

    /// Close out the export stamped `generation`.
    ///
    /// Returns the outcome when it was accepted, `None` when it is stale.
    /// A claimed export is always accepted, but only moves the trigger back
    /// to `Closed` while its generation is still current.
    fn complete(&self, generation: u64, outcome: ExportOutcome) -> Option<ExportOutcome> {
        {
            let mut shared = self.lock();
            let before = shared.delivering.len();
            shared.delivering.retain(|g| *g != generation);
            let claimed = shared.delivering.len() != before;

            if shared.is_current(generation) {
                shared.pending = None;
                shared.set_phase(TriggerPhase::Closed);
            } else if claimed {
                tracing::debug!(
                    format = %outcome.format(),
                    generation,
                    "Export delivered after trigger reset"
                );
            } else {
                tracing::debug!(
                    format = %outcome.format(),
                    generation,
                    "Discarding stale export result"
                );
                return None;
            }
        }

        if let ExportOutcome::Failed { format, reason } = &outcome {
            tracing::warn!(format = %format, reason = %reason, "Export failed");
        }
        // Receiver may be gone; the outcome is still returned to the caller.
        let _ = self.outcome_tx.send(outcome.clone());
        Some(outcome)
    }
}

fn failed(format: FormatId, error: FleetdashError) -> ExportOutcome {
    ExportOutcome::Failed {
        format,
        reason: error.to_string(),
    }
}

/// Export button bound to one [`ExportRequest`].
pub struct ExportTrigger {
    request: Arc<ExportRequest>,
    options: EncodeOptions,
    capturer: SnapshotCapturer,
    core: Arc<Core>,
    outcome_rx: Mutex<Option<mpsc::UnboundedReceiver<ExportOutcome>>>,
}

impl ExportTrigger {
    /// Create a closed trigger.
    pub fn new(
        request: ExportRequest,
        options: EncodeOptions,
        capturer: SnapshotCapturer,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        let (state_tx, _) = watch::channel(TriggerState::default());
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            request: Arc::new(request),
            options,
            capturer,
            core: Arc::new(Core {
                shared: Mutex::new(Shared {
                    phase: TriggerPhase::Closed,
                    generation: 0,
                    pending: None,
                    delivering: Vec::new(),
                    shut_down: false,
                    state_tx,
                }),
                delivery,
                outcome_tx,
            }),
            outcome_rx: Mutex::new(Some(outcome_rx)),
        }
    }

    pub fn request(&self) -> &ExportRequest {
        &self.request
    }

    pub fn phase(&self) -> TriggerPhase {
        self.core.lock().phase
    }

    pub fn state(&self) -> TriggerState {
        self.phase().into()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<TriggerState> {
        self.core.lock().state_tx.subscribe()
    }

    /// Take the outcome stream. Only the first call gets it.
    pub fn take_outcomes(&self) -> Option<mpsc::UnboundedReceiver<ExportOutcome>> {
        self.outcome_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Show the menu. Ignored unless closed.
    pub fn open_menu(&self) {
        let mut shared = self.core.lock();
        if !shared.shut_down && shared.phase == TriggerPhase::Closed {
            shared.set_phase(TriggerPhase::Open);
        }
    }

    /// Flip menu visibility. Ignored while exporting.
    pub fn toggle_menu(&self) {
        let mut shared = self.core.lock();
        if shared.shut_down {
            return;
        }
        match shared.phase {
            TriggerPhase::Closed => shared.set_phase(TriggerPhase::Open),
            TriggerPhase::Open => shared.set_phase(TriggerPhase::Closed),
            TriggerPhase::Exporting(_) => {}
        }
    }

    /// Hide the menu without exporting. Ignored while exporting.
    pub fn dismiss(&self) {
        let mut shared = self.core.lock();
        if shared.phase == TriggerPhase::Open {
            shared.set_phase(TriggerPhase::Closed);
        }
    }

    /// Menu entries in display order with their availability.
    ///
    /// While an export is in flight every entry is disabled.
    pub fn menu_options(&self) -> Vec<MenuOption> {
        let active = match self.phase() {
            TriggerPhase::Exporting(format) => Some(format),
            _ => None,
        };
        FormatId::ALL
            .into_iter()
            .map(|format| MenuOption {
                format,
                label: format.label(),
                disabled: active.is_some() || self.request.unavailable_reason(format).is_some(),
                busy: active == Some(format),
            })
            .collect()
    }

    /// Start exporting `format`.
    ///
    /// Only accepted while the menu is open and nothing is in flight. The
    /// trigger moves to `Exporting(format)` before any work starts.
    pub fn select(&self, format: FormatId) -> Result<Selection, SelectError> {
        let generation = {
            let mut shared = self.core.lock();
            if shared.shut_down {
                return Err(SelectError::ShutDown);
            }
            match shared.phase {
                TriggerPhase::Closed => return Err(SelectError::MenuClosed),
                TriggerPhase::Exporting(active) => return Err(SelectError::Busy { active }),
                TriggerPhase::Open => {}
            }
            if let Some(reason) = self.request.unavailable_reason(format) {
                return Err(SelectError::Disabled { format, reason });
            }
            shared.generation += 1;
            shared.set_phase(TriggerPhase::Exporting(format));
            if format != FormatId::Image {
                // Synchronous exports deliver before select returns.
                let generation = shared.generation;
                shared.delivering.push(generation);
            }
            shared.generation
        };

        tracing::info!(
            format = %format,
            rows = self.request.records.len(),
            filename_base = %self.request.filename_base,
            "Starting export"
        );

        let outcome = match format {
            FormatId::Image => return Ok(self.spawn_capture(generation)),
            FormatId::Print => self.print(),
            _ => self.core.deliver(
                format,
                encode_request(format, &self.request, &self.options),
            ),
        };

        let outcome = self
            .core
            .complete(generation, outcome.clone())
            .unwrap_or(outcome);
        Ok(Selection::Completed(outcome))
    }

    fn print(&self) -> ExportOutcome {
        let job = PrintJob {
            title: self.request.filename_base.clone(),
            surface: self.request.surface.clone(),
        };
        match self.core.delivery.print(&job) {
            Ok(()) => {
                tracing::info!(title = %job.title, host = self.core.delivery.name(), "Print requested");
                ExportOutcome::Printed
            }
            Err(e) => failed(FormatId::Print, e),
        }
    }

    fn spawn_capture(&self, generation: u64) -> Selection {
        let core = Arc::clone(&self.core);
        let request = Arc::clone(&self.request);
        let capturer = self.capturer.clone();

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                let outcome = failed(
                    FormatId::Image,
                    FleetdashError::render(format!("no async runtime for snapshot capture: {e}")),
                );
                let outcome = core.complete(generation, outcome.clone()).unwrap_or(outcome);
                return Selection::Completed(outcome);
            }
        };

        let handle = runtime.spawn(async move {
            let bytes = capturer.capture(request.surface.as_ref()).await;
            if !core.claim(generation) {
                tracing::debug!(generation, "Snapshot finished after trigger reset");
                return None;
            }
            let artifact = bytes.and_then(|bytes| snapshot_artifact(&request, bytes));
            let delivery_core = Arc::clone(&core);
            let outcome = tokio::task::spawn_blocking(move || {
                delivery_core.deliver(FormatId::Image, artifact)
            })
            .await
            .unwrap_or_else(|e| {
                failed(
                    FormatId::Image,
                    FleetdashError::delivery(format!("delivery task failed: {e}")),
                )
            });
            core.complete(generation, outcome)
        });

        {
            let mut shared = self.core.lock();
            if shared.is_current(generation)
                && shared.phase == TriggerPhase::Exporting(FormatId::Image)
                && !shared.delivering.contains(&generation)
            {
                shared.pending = Some(handle.abort_handle());
            }
        }

        Selection::Pending(PendingExport {
            format: FormatId::Image,
            handle,
        })
    }

    /// Return to `Closed`, abandoning any in-flight export.
    ///
    /// A snapshot still being captured is aborted and its result, should it
    /// arrive anyway, is discarded. One already handed to the delivery host
    /// runs to completion and still reports its outcome.
    pub fn reset(&self) {
        let mut shared = self.core.lock();
        shared.generation += 1;
        if let Some(pending) = shared.pending.take() {
            tracing::debug!("Aborting in-flight snapshot");
            pending.abort();
        }
        shared.set_phase(TriggerPhase::Closed);
    }

    /// Reset and refuse all further selections.
    pub fn shutdown(&self) {
        self.reset();
        self.core.lock().shut_down = true;
    }

    pub fn is_shut_down(&self) -> bool {
        self.core.lock().shut_down
    }
}

impl Drop for ExportTrigger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn snapshot_artifact(request: &ExportRequest, bytes: Vec<u8>) -> FleetdashResult<Artifact> {
    let format = FormatId::Image;
    let (Some(filename), Some(media_type)) =
        (format.filename(&request.filename_base), format.media_type())
    else {
        return Err(FleetdashError::unsupported("snapshot format has no file form"));
    };
    Ok(Artifact {
        format,
        filename,
        media_type,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_projection() {
        assert_eq!(TriggerState::from(TriggerPhase::Closed), TriggerState::default());
        assert_eq!(
            TriggerState::from(TriggerPhase::Exporting(FormatId::Pdf)),
            TriggerState {
                menu_open: true,
                active_format: Some(FormatId::Pdf),
            }
        );
    }

    #[test]
    fn test_select_error_messages() {
        let err = SelectError::Busy {
            active: FormatId::Image,
        };
        assert!(err.to_string().contains("already in progress"));
        assert_eq!(
            SelectError::MenuClosed.to_string(),
            "Export menu is not open"
        );
    }
}
