//! List export formats as the export menu shows them.

use std::path::PathBuf;
use std::sync::Arc;

use fleetdash_common::config::AppConfig;
use fleetdash_encoders::EncodeOptions;
use fleetdash_export_engine::{ExportTrigger, SnapshotCapturer};
use fleetdash_export_model::{ExportRequest, SurfaceRef};
use fleetdash_platform_host::{DesktopHost, ImageFileRenderer};

pub fn run(surface: Option<PathBuf>, json: bool, config: &AppConfig) -> anyhow::Result<()> {
    let mut request = ExportRequest::new(Vec::new());
    if let Some(surface) = surface {
        request = request.with_surface(SurfaceRef::new(surface.display().to_string()));
    }

    let trigger = ExportTrigger::new(
        request,
        EncodeOptions::from(&config.export),
        SnapshotCapturer::new(Arc::new(ImageFileRenderer::new())),
        Arc::new(DesktopHost::from_defaults(&config.export)),
    );
    let options = trigger.menu_options();

    if json {
        println!("{}", serde_json::to_string_pretty(&options)?);
        return Ok(());
    }

    println!("{:<8} {:<16} {:<10} Status", "Format", "Label", "File");
    println!("{}", "=".repeat(50));
    for option in &options {
        let file = option
            .format
            .extension()
            .map(|ext| format!(".{ext}"))
            .unwrap_or_else(|| "-".to_string());
        let status = if option.disabled {
            "needs --surface"
        } else {
            "available"
        };
        println!(
            "{:<8} {:<16} {:<10} {status}",
            option.format.id(),
            option.label,
            file
        );
    }

    Ok(())
}
