//! Delivery on desktop platforms.

use std::io::Write;
use std::path::PathBuf;

use super::{DeliveryError, DeliveryStrategy, DeliveryTarget};
use crate::format::ExportOutput;

/// Delivers exports to the filesystem and standard output.
///
/// - save dialog: native file dialog via `rfd`, unsupported without a display
/// - download: write into `export_dir`, or to `out` when set
/// - clipboard: unsupported
/// - manual copy: print the text to `stdout`
/// - preview: unsupported
pub struct NativeDelivery<W: Write> {
    /// Directory for direct downloads.
    pub export_dir: PathBuf,
    /// Exact output path, overriding `export_dir` and the suggested name.
    pub out: Option<PathBuf>,
    /// Where manual copies are written.
    pub stdout: W,
    /// Whether a native file dialog can be shown.
    pub dialog_available: bool,
}

impl<W: Write> NativeDelivery<W> {
    /// Create a delivery target writing into `export_dir`.
    pub fn new(export_dir: impl Into<PathBuf>, stdout: W) -> Self {
        Self {
            export_dir: export_dir.into(),
            out: None,
            stdout,
            dialog_available: dialog_backend_available(),
        }
    }

    /// Override dialog detection.
    pub fn with_dialog(mut self, available: bool) -> Self {
        self.dialog_available = available;
        self
    }

    /// Write to exactly this path.
    pub fn with_out(mut self, out: Option<PathBuf>) -> Self {
        self.out = out;
        self
    }

    fn download_path(&self, output: &ExportOutput) -> PathBuf {
        self.out
            .clone()
            .unwrap_or_else(|| self.export_dir.join(&output.filename))
    }
}

impl<W: Write> DeliveryTarget for NativeDelivery<W> {
    fn attempt(
        &mut self,
        strategy: DeliveryStrategy,
        output: &ExportOutput,
    ) -> Result<String, DeliveryError> {
        match strategy {
            DeliveryStrategy::SavePicker => {
                if !self.dialog_available {
                    return Err(DeliveryError::Unsupported(
                        "no display for a file dialog".to_string(),
                    ));
                }
                let mut dialog = rfd::FileDialog::new().set_file_name(&output.filename);
                if self.export_dir.is_dir() {
                    dialog = dialog.set_directory(&self.export_dir);
                }
                let path = dialog.save_file().ok_or(DeliveryError::Cancelled)?;
                std::fs::write(&path, &output.content)?;
                Ok(path.display().to_string())
            }
            DeliveryStrategy::Download => {
                let path = self.download_path(output);
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, &output.content)?;
                Ok(path.display().to_string())
            }
            DeliveryStrategy::ManualCopy => {
                self.stdout.write_all(output.content.as_bytes())?;
                if !output.content.ends_with('\n') {
                    self.stdout.write_all(b"\n")?;
                }
                self.stdout.flush()?;
                Ok(output.filename.clone())
            }
            DeliveryStrategy::Clipboard => Err(DeliveryError::Unsupported(
                "no clipboard access from the command line".to_string(),
            )),
            DeliveryStrategy::Preview => Err(DeliveryError::Unsupported(
                "no preview window on the command line".to_string(),
            )),
        }
    }
}

/// Whether the session can show a native dialog.
///
/// rfd returns no path both when the user dismisses the dialog and when no
/// dialog backend exists, so a missing display has to be detected up front.
#[cfg(all(unix, not(target_os = "macos")))]
fn dialog_backend_available() -> bool {
    ["DISPLAY", "WAYLAND_DISPLAY"]
        .iter()
        .any(|var| std::env::var_os(var).is_some_and(|value| !value.is_empty()))
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn dialog_backend_available() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::{DeliveryAction, DeliveryPlan, deliver};

    fn output() -> ExportOutput {
        ExportOutput {
            content: "{}".into(),
            filename: "icons.annotations.json".into(),
            content_type: "application/json",
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_download_into_export_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut target = NativeDelivery::new(dir.path().join("out"), Vec::new());
        let plan = DeliveryPlan::for_action(DeliveryAction::Save, "application/json")
            .without(DeliveryStrategy::SavePicker);

        let report = deliver(&mut target, &plan, &output());
        let written = dir.path().join("out").join("icons.annotations.json");
        assert_eq!(std::fs::read_to_string(&written).unwrap(), "{}");
        assert_eq!(report.status, format!("Downloaded {}", written.display()));
    }

    #[test]
    fn test_save_without_dialog_falls_back_to_download() {
        let dir = tempfile::tempdir().unwrap();
        let mut target = NativeDelivery::new(dir.path(), Vec::new()).with_dialog(false);
        let plan = DeliveryPlan::for_action(DeliveryAction::Save, "application/json");

        let report = deliver(&mut target, &plan, &output());
        assert_eq!(report.attempts.len(), 2);
        assert_eq!(report.attempts[0].strategy, DeliveryStrategy::SavePicker);
        assert!(report.attempts[0].error.is_some());
        assert_eq!(report.delivered_by, Some(DeliveryStrategy::Download));
        assert!(dir.path().join("icons.annotations.json").exists());
    }

    #[test]
    fn test_explicit_out_path() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("custom.json");
        let mut target = NativeDelivery::new(dir.path(), Vec::new()).with_out(Some(out.clone()));
        target.attempt(DeliveryStrategy::Download, &output()).unwrap();
        assert!(out.exists());
    }

    #[test]
    fn test_copy_prints_text() {
        let mut target = NativeDelivery::new(".", Vec::new());
        let plan = DeliveryPlan::for_action(DeliveryAction::Copy, "application/json");
        let report = deliver(&mut target, &plan, &output());

        assert_eq!(report.delivered_by, Some(DeliveryStrategy::ManualCopy));
        assert_eq!(String::from_utf8(target.stdout).unwrap(), "{}\n");
    }
}
