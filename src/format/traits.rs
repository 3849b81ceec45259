//! Trait definitions for export format implementations.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::constants::DEFAULT_EXPORT_STEM;
use crate::format::error::FormatError;
use crate::model::AnnotationMap;

/// Trait for export generators.
///
/// Each format (HTML package, annotated SVG, JSON) implements [`render`]
/// and [`fallback`]; callers use the provided [`export`], which never fails.
///
/// [`render`]: ExportFormat::render
/// [`fallback`]: ExportFormat::fallback
/// [`export`]: ExportFormat::export
pub trait ExportFormat: Send + Sync {
    /// Unique identifier for this format (e.g., "html", "svg", "json").
    fn id(&self) -> &'static str;

    /// Human-readable name for UI display.
    fn display_name(&self) -> &'static str;

    /// Suffix appended to the file stem, without a leading dot.
    fn extension(&self) -> &'static str;

    /// MIME type of the output.
    fn content_type(&self) -> &'static str;

    /// Build the output text.
    fn render(
        &self,
        input: &ExportInput<'_>,
        warnings: &mut Vec<FormatWarning>,
    ) -> Result<String, FormatError>;

    /// Output used when [`render`](ExportFormat::render) fails.
    fn fallback(&self, input: &ExportInput<'_>) -> String;

    /// Render `input`, falling back on failure.
    fn export(&self, input: &ExportInput<'_>) -> ExportOutput {
        let mut warnings = Vec::new();
        let content = match self.render(input, &mut warnings) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("{} export failed, using fallback: {}", self.display_name(), e);
                warnings.push(FormatWarning::error(format!("Export fell back: {}", e)));
                self.fallback(input)
            }
        };

        log::info!(
            "Exported {} ({} bytes, {} annotation(s))",
            self.id(),
            content.len(),
            input.annotations.len()
        );

        ExportOutput {
            content,
            filename: format!("{}.{}", input.stem(), self.extension()),
            content_type: self.content_type(),
            warnings,
        }
    }
}

/// Inputs shared by every generator.
///
/// The markup and annotations must come from the same session state.
#[derive(Debug, Clone, Copy)]
pub struct ExportInput<'a> {
    /// SVG markup, normally already sanitized.
    pub svg: &'a str,

    /// Annotation snapshot.
    pub annotations: &'a AnnotationMap,

    /// Export timestamp.
    pub exported_at: DateTime<Utc>,

    /// Uploaded file name, used for the suggested filename.
    pub name: Option<&'a str>,
}

impl<'a> ExportInput<'a> {
    /// Create an input without a file name.
    pub fn new(svg: &'a str, annotations: &'a AnnotationMap, exported_at: DateTime<Utc>) -> Self {
        Self {
            svg,
            annotations,
            exported_at,
            name: None,
        }
    }

    /// Set the uploaded file name.
    pub fn with_name(mut self, name: Option<&'a str>) -> Self {
        self.name = name;
        self
    }

    /// Stem for suggested filenames.
    pub fn stem(&self) -> &'a str {
        self.name
            .and_then(|name| Path::new(name).file_stem())
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or(DEFAULT_EXPORT_STEM)
    }

    /// Export timestamp as RFC 3339 text.
    pub fn timestamp(&self) -> String {
        self.exported_at
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}

/// Result of an export.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    /// Output text.
    pub content: String,

    /// Suggested file name.
    pub filename: String,

    /// MIME type.
    pub content_type: &'static str,

    /// Warnings generated during export.
    pub warnings: Vec<FormatWarning>,
}

impl ExportOutput {
    /// Check if there were any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if the output is a fallback.
    pub fn has_errors(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w.severity, WarningSeverity::Error))
    }
}

/// Warning generated during export.
#[derive(Debug, Clone)]
pub struct FormatWarning {
    /// Element key this warning relates to (if applicable).
    pub key: Option<String>,

    /// Human-readable warning message.
    pub message: String,

    /// Severity level of the warning.
    pub severity: WarningSeverity,
}

impl FormatWarning {
    /// Create a new warning.
    pub fn new(message: impl Into<String>, severity: WarningSeverity) -> Self {
        Self {
            key: None,
            message: message.into(),
            severity,
        }
    }

    /// Create an info-level warning.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Info)
    }

    /// Create a warning-level warning.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Warning)
    }

    /// Create an error-level warning.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Error)
    }

    /// Set the element key this warning relates to.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// Severity level for format warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    /// Informational message, not a problem.
    Info,
    /// Warning that something was skipped or modified.
    Warning,
    /// The output is a fallback.
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_from_name() {
        let annotations = AnnotationMap::new();
        let input = ExportInput::new("<svg/>", &annotations, Utc::now());
        assert_eq!(input.stem(), "annotations");
        assert_eq!(input.with_name(Some("icons.svg")).stem(), "icons");
        assert_eq!(input.with_name(Some("dir/set.v2.svg")).stem(), "set.v2");
        assert_eq!(input.with_name(Some("")).stem(), "annotations");
    }
}
