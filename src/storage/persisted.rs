//! The persisted session record.
//!
//! Written as `{"svgText": ..., "annotations": {...}}` and read back from
//! any of the shapes earlier builds produced:
//!
//! - `{"svgText": "<svg/>", "annotations": {...}}`
//! - `{"svgText": {"svg": "<svg/>", "annotations": {...}}, "annotations": {...}}`
//! - `{"svg": "<svg/>", "annotations": {...}}`
//!
//! A missing or unreadable record is treated as no prior session.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{StorageBackend, StorageError};
use crate::constants::SESSION_STORAGE_KEY;
use crate::model::AnnotationMap;

/// Loaded document text plus its annotations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    /// Uploaded file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Sanitized SVG markup, empty when no document is loaded.
    #[serde(default)]
    pub svg_text: String,

    /// Annotation snapshot.
    #[serde(default)]
    pub annotations: AnnotationMap,
}

impl PersistedSession {
    /// Create a record.
    pub fn new(name: Option<String>, svg_text: String, annotations: AnnotationMap) -> Self {
        Self {
            name,
            svg_text,
            annotations,
        }
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode any accepted shape.
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Object(mut object) = value else {
            return Err(StorageError::Unavailable(
                "session record is not an object".to_string(),
            ));
        };

        let name = object
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut annotations = match object.remove("annotations") {
            Some(Value::Null) | None => None,
            Some(value) => Some(serde_json::from_value::<AnnotationMap>(value)?),
        };

        let svg_text = match object.remove("svgText") {
            Some(Value::String(text)) => text,
            Some(Value::Object(mut nested)) => {
                if annotations.is_none() {
                    if let Some(value) = nested.remove("annotations") {
                        annotations = Some(serde_json::from_value(value)?);
                    }
                }
                match nested.remove("svg") {
                    Some(Value::String(text)) => text,
                    _ => String::new(),
                }
            }
            _ => match object.remove("svg") {
                Some(Value::String(text)) => text,
                _ => String::new(),
            },
        };

        Ok(Self {
            name,
            svg_text,
            annotations: annotations.unwrap_or_default(),
        })
    }

    /// Read the session record from `storage`.
    ///
    /// Returns `None` when there is no record or it cannot be decoded.
    pub fn load<B: StorageBackend + ?Sized>(storage: &B) -> Option<Self> {
        let raw = match storage.read(SESSION_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to read saved session: {}", e);
                return None;
            }
        };

        match Self::from_json(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                log::warn!("Ignoring unreadable saved session: {}", e);
                None
            }
        }
    }

    /// Write the session record to `storage`.
    pub fn save<B: StorageBackend + ?Sized>(&self, storage: &mut B) -> Result<(), StorageError> {
        storage.write(SESSION_STORAGE_KEY, &self.to_json()?)
    }
}
