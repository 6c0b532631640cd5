//! Export a dataset through the export trigger.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use fleetdash_common::config::{AppConfig, ExportDefaults};
use fleetdash_encoders::EncodeOptions;
use fleetdash_export_engine::{ExportOutcome, ExportTrigger, Selection, SnapshotCapturer};
use fleetdash_export_model::{parse_records, ColumnDescriptor, ExportRequest, FormatId, SurfaceRef};
use fleetdash_platform_host::{DesktopHost, ImageFileRenderer};

pub struct ExportArgs {
    pub data: PathBuf,
    pub format: FormatId,
    pub columns: Vec<ColumnDescriptor>,
    pub filename: Option<String>,
    pub output: Option<PathBuf>,
    pub surface: Option<PathBuf>,
}

pub async fn run(args: ExportArgs, config: &AppConfig) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.data)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", args.data.display()))?;
    let records = parse_records(&raw)
        .map_err(|e| anyhow::anyhow!("Failed to load {}: {e}", args.data.display()))?;
    tracing::info!(path = %args.data.display(), rows = records.len(), "Loaded dataset");

    let mut defaults = config.export.clone();
    if let Some(output) = args.output {
        defaults.output_dir = output;
    }

    let filename_base = args.filename.unwrap_or_else(|| {
        default_filename_base(&defaults, chrono::Local::now().date_naive())
    });

    let mut request = ExportRequest::new(records).with_filename_base(filename_base);
    if !args.columns.is_empty() {
        request = request.with_columns(args.columns);
    }
    if let Some(surface) = &args.surface {
        request = request.with_surface(SurfaceRef::new(surface.display().to_string()));
    }

    println!("Exporting {} as {}", args.data.display(), args.format.label());
    println!("  Rows: {}", request.records.len());
    println!("  Columns: {}", request.projection().len());
    if args.format.extension().is_some() {
        println!("  Output: {}", defaults.output_dir.display());
    }

    let trigger = ExportTrigger::new(
        request,
        EncodeOptions::from(&defaults),
        SnapshotCapturer::new(Arc::new(ImageFileRenderer::new())),
        Arc::new(DesktopHost::from_defaults(&defaults)),
    );

    trigger.open_menu();
    let outcome = match trigger.select(args.format)? {
        Selection::Completed(outcome) => outcome,
        Selection::Pending(pending) => {
            tracing::debug!(format = %pending.format(), "Waiting for background export");
            pending.wait().await.ok_or_else(|| {
                tracing::warn!(format = %args.format, "Background export was abandoned");
                anyhow::anyhow!("Snapshot export was abandoned")
            })?
        }
    };
    tracing::info!(format = %args.format, success = outcome.is_success(), "Export finished");

    match outcome {
        ExportOutcome::Delivered {
            filename,
            bytes_written,
            ..
        } => {
            println!(
                "Export complete: {} ({bytes_written} bytes)",
                defaults.output_dir.join(filename).display()
            );
            Ok(())
        }
        ExportOutcome::Printed => {
            println!("Sent to printer");
            Ok(())
        }
        ExportOutcome::Failed { format, reason } => {
            Err(anyhow::anyhow!("{} export failed: {reason}", format.label()))
        }
    }
}

/// Configured base name, suffixed with `date` when enabled.
pub fn default_filename_base(defaults: &ExportDefaults, date: NaiveDate) -> String {
    if defaults.append_date {
        format!("{}_{}", defaults.filename_base, date.format("%Y-%m-%d"))
    } else {
        defaults.filename_base.clone()
    }
}
