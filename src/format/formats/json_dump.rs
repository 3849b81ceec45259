//! JSON dump format implementation.
//!
//! A single pretty-printed document holding the export timestamp, the
//! sanitized SVG text and the full annotation snapshot. Reading the
//! `annotations` field back yields a snapshot equal to the exported one,
//! comment ids and timestamps included.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::format::error::FormatError;
use crate::format::traits::{ExportFormat, ExportInput, FormatWarning};
use crate::model::AnnotationMap;
use crate::svg::sanitize;

/// Parsed content of a JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonDump {
    /// When the export was made.
    pub exported_at: DateTime<Utc>,

    /// Sanitized SVG markup.
    pub svg_text: String,

    /// Annotation snapshot.
    #[serde(default)]
    pub annotations: AnnotationMap,
}

impl JsonDump {
    /// Parse a JSON export.
    pub fn from_json(json: &str) -> Result<Self, FormatError> {
        Ok(serde_json::from_str(json)?)
    }

    fn to_pretty_json(&self) -> Result<String, FormatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// JSON dump format.
pub struct JsonDumpFormat;

impl ExportFormat for JsonDumpFormat {
    fn id(&self) -> &'static str {
        "json"
    }

    fn display_name(&self) -> &'static str {
        "Annotations (JSON)"
    }

    fn extension(&self) -> &'static str {
        "annotations.json"
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn render(
        &self,
        input: &ExportInput<'_>,
        warnings: &mut Vec<FormatWarning>,
    ) -> Result<String, FormatError> {
        let sanitized = sanitize(input.svg)?;
        super::warn_removed_scripts(sanitized.scripts_removed, warnings);
        JsonDump {
            exported_at: input.exported_at,
            svg_text: sanitized.markup,
            annotations: input.annotations.clone(),
        }
        .to_pretty_json()
    }

    fn fallback(&self, input: &ExportInput<'_>) -> String {
        let dump = JsonDump {
            exported_at: input.exported_at,
            svg_text: input.svg.to_string(),
            annotations: input.annotations.clone(),
        };
        match dump.to_pretty_json() {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to encode JSON fallback: {}", e);
                String::from("{}")
            }
        }
    }
}
