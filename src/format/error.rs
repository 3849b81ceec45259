//! Error types for export format operations.

use thiserror::Error;

use crate::svg::SvgError;

/// Errors that can occur while building an export.
///
/// Generators never return these to the user: [`ExportFormat::export`]
/// turns them into a fallback output plus a warning.
///
/// [`ExportFormat::export`]: crate::format::ExportFormat::export
#[derive(Error, Debug)]
pub enum FormatError {
    /// Input SVG could not be parsed or sanitized
    #[error("SVG error: {0}")]
    Svg(#[from] SvgError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML serialization error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// No format registered under this id
    #[error("Unknown export format: {0}")]
    UnknownFormat(String),
}
