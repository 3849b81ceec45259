//! Annotation records attached to SVG elements.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// All annotations of one document, keyed by element key.
///
/// A `BTreeMap` keeps exports and persisted state in a stable order.
pub type AnnotationMap = BTreeMap<String, Annotation>;

/// Label, notes and comment thread for one element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Short label.
    #[serde(default)]
    pub title: String,

    /// Free-text notes.
    #[serde(default)]
    pub description: String,

    /// Comments, oldest first.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Annotation {
    /// Whether title, notes and comments are all empty.
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.description.trim().is_empty()
            && self.comments.is_empty()
    }

    /// The title, or `fallback` when the title is blank.
    pub fn label_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        let title = self.title.trim();
        if title.is_empty() { fallback } else { title }
    }

    /// Find a comment by id.
    pub fn comment(&self, id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }
}

/// One entry of a comment thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Unique within the owning annotation.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    /// Comment body, never blank.
    pub text: String,

    /// Creation time.
    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a comment.
    pub fn new(id: impl Into<String>, text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            created_at,
        }
    }
}

/// Partial update of an annotation's text fields.
///
/// `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldUpdate {
    /// New title.
    pub title: Option<String>,
    /// New notes.
    pub description: Option<String>,
}

impl FieldUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the notes.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

// Older sessions stored numeric comment ids and epoch-millisecond timestamps.

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Millis(i64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(text) => DateTime::parse_from_rfc3339(&text)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom),
        Raw::Millis(millis) => DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {}", millis))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_field_names() {
        let created = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let annotation = Annotation {
            title: "Gear".into(),
            description: "Settings icon".into(),
            comments: vec![Comment::new("c1", "needs review", created)],
        };
        let json = serde_json::to_value(&annotation).unwrap();
        assert_eq!(json["title"], "Gear");
        assert_eq!(json["description"], "Settings icon");
        assert_eq!(json["comments"][0]["text"], "needs review");
        assert_eq!(json["comments"][0]["createdAt"], "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_legacy_comment_shape() {
        let comment: Comment =
            serde_json::from_str(r#"{"id": 17, "text": "hi", "createdAt": 1700000000000}"#).unwrap();
        assert_eq!(comment.id, "17");
        assert_eq!(comment.created_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_missing_fields_default() {
        let annotation: Annotation = serde_json::from_str("{}").unwrap();
        assert!(annotation.is_empty());
        assert_eq!(annotation.label_or("key"), "key");
    }
}
