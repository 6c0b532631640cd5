//! Directory-backed file saving and command-backed printing.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use fleetdash_common::config::ExportDefaults;
use fleetdash_common::error::{FleetdashError, FleetdashResult};
use fleetdash_export_engine::{Delivery, DeliveryReceipt};
use fleetdash_export_model::{Artifact, PrintJob};

/// Delivery host for desktop and CLI use.
#[derive(Debug, Clone)]
pub struct DesktopHost {
    output_dir: PathBuf,
    print_command: Vec<String>,
}

impl DesktopHost {
    pub fn new(output_dir: impl Into<PathBuf>, print_command: Vec<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            print_command,
        }
    }

    pub fn from_defaults(defaults: &ExportDefaults) -> Self {
        Self::new(&defaults.output_dir, defaults.print_command.clone())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Resolve the target path for `filename`, rejecting anything that would
    /// escape the output directory.
    fn target_path(&self, filename: &str) -> FleetdashResult<PathBuf> {
        let name = Path::new(filename);
        let is_plain = !filename.is_empty()
            && name.file_name().map(|f| f == name.as_os_str()).unwrap_or(false);
        if !is_plain {
            return Err(FleetdashError::delivery(format!(
                "refusing to save {filename:?}: not a plain file name"
            )));
        }
        Ok(self.output_dir.join(name))
    }

    fn print_command_for(&self, job: &PrintJob) -> FleetdashResult<Command> {
        let (program, args) = self
            .print_command
            .split_first()
            .ok_or_else(|| FleetdashError::delivery("no print command configured"))?;

        let mut cmd = Command::new(program);
        cmd.args(args).arg(&job.title);
        if let Some(surface) = &job.surface {
            let path = Path::new(surface.as_str());
            if path.is_file() {
                cmd.arg(path);
            }
        }
        Ok(cmd)
    }
}

impl Delivery for DesktopHost {
    fn save_file(&self, artifact: &Artifact) -> FleetdashResult<DeliveryReceipt> {
        let target = self.target_path(&artifact.filename)?;
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            FleetdashError::delivery(format!(
                "cannot create {}: {e}",
                self.output_dir.display()
            ))
        })?;

        // Write beside the target, then rename into place.
        let staging = target.with_file_name(format!(".{}.part", artifact.filename));
        let written = std::fs::File::create(&staging)
            .and_then(|mut file| {
                file.write_all(&artifact.bytes)?;
                file.sync_all()
            })
            .and_then(|()| std::fs::rename(&staging, &target));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&staging);
            return Err(FleetdashError::delivery(format!(
                "cannot save {}: {e}",
                target.display()
            )));
        }

        tracing::debug!(
            path = %target.display(),
            media_type = artifact.media_type,
            bytes = artifact.bytes.len(),
            "Saved artifact"
        );
        Ok(DeliveryReceipt {
            location: target.display().to_string(),
            bytes_written: artifact.bytes.len(),
        })
    }

    fn print(&self, job: &PrintJob) -> FleetdashResult<()> {
        let mut cmd = self.print_command_for(job)?;
        tracing::debug!(command = ?cmd, "Running print command");

        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                FleetdashError::delivery(format!(
                    "print facility unavailable ({}): {e}",
                    self.print_command.join(" ")
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FleetdashError::delivery(format!(
                "print command exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "desktop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetdash_export_model::{FormatId, SurfaceRef};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "fleetdash-host-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn artifact(filename: &str) -> Artifact {
        Artifact {
            format: FormatId::Json,
            filename: filename.to_string(),
            media_type: "application/json",
            bytes: b"[]".to_vec(),
        }
    }

    #[test]
    fn test_save_creates_output_dir() {
        let dir = scratch_dir("save").join("nested");
        let host = DesktopHost::new(&dir, Vec::new());

        let receipt = host.save_file(&artifact("Fleet_Report.json")).unwrap();
        assert_eq!(receipt.bytes_written, 2);
        assert_eq!(std::fs::read(dir.join("Fleet_Report.json")).unwrap(), b"[]");
        assert!(!dir.join(".Fleet_Report.json.part").exists());

        let _ = std::fs::remove_dir_all(dir.parent().unwrap());
    }

    #[test]
    fn test_save_rejects_path_components() {
        let dir = scratch_dir("escape");
        let host = DesktopHost::new(&dir, Vec::new());

        for name in ["../evil.json", "a/b.json", ""] {
            let err = host.save_file(&artifact(name)).unwrap_err();
            assert!(matches!(err, FleetdashError::Delivery { .. }), "{name:?}");
        }
        assert!(!dir.exists());
    }

    #[test]
    fn test_print_without_command_is_delivery_error() {
        let host = DesktopHost::new(std::env::temp_dir(), Vec::new());
        let err = host
            .print(&PrintJob {
                title: "Fleet".to_string(),
                surface: None,
            })
            .unwrap_err();
        assert!(matches!(err, FleetdashError::Delivery { .. }));
    }

    #[test]
    fn test_print_command_receives_title_and_existing_surface() {
        let dir = scratch_dir("print");
        std::fs::create_dir_all(&dir).unwrap();
        let snapshot = dir.join("table.png");
        std::fs::write(&snapshot, b"png").unwrap();

        let host = DesktopHost::new(&dir, vec!["lp".to_string(), "-t".to_string()]);
        let cmd = host
            .print_command_for(&PrintJob {
                title: "Fleet_Report".to_string(),
                surface: Some(SurfaceRef::new(snapshot.display().to_string())),
            })
            .unwrap();
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(cmd.get_program(), "lp");
        let expected = vec![
            "-t".to_string(),
            "Fleet_Report".to_string(),
            snapshot.display().to_string(),
        ];
        assert_eq!(args, expected);

        let cmd = host
            .print_command_for(&PrintJob {
                title: "Fleet_Report".to_string(),
                surface: Some(SurfaceRef::new("vehicles-table")),
            })
            .unwrap();
        assert_eq!(cmd.get_args().count(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn test_print_reports_command_status() {
        let job = PrintJob {
            title: "Fleet".to_string(),
            surface: None,
        };
        let ok = DesktopHost::new(std::env::temp_dir(), vec!["true".to_string()]);
        assert!(ok.print(&job).is_ok());

        let failing = DesktopHost::new(std::env::temp_dir(), vec!["false".to_string()]);
        assert!(matches!(
            failing.print(&job),
            Err(FleetdashError::Delivery { .. })
        ));

        let missing = DesktopHost::new(
            std::env::temp_dir(),
            vec!["fleetdash-no-such-spooler".to_string()],
        );
        assert!(missing.print(&job).is_err());
    }
}
