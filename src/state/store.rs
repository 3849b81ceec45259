//! In-memory annotation store.
//!
//! The store knows nothing about documents or persistence; [`Session`]
//! wraps it and writes a snapshot after each mutation.
//!
//! [`Session`]: crate::state::Session

use chrono::{DateTime, Utc};

use crate::clock::now_utc;
use crate::model::{Annotation, AnnotationMap, Comment, FieldUpdate};

/// Annotations of the loaded document, keyed by element key.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    /// Records by key.
    records: AnnotationMap,
    /// Sequence number for the next comment id.
    next_seq: u64,
}

impl AnnotationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from a snapshot.
    pub fn from_snapshot(snapshot: AnnotationMap) -> Self {
        let mut store = Self::new();
        store.replace_all(snapshot);
        store
    }

    /// Annotation for `key`, or an empty one if there is none.
    pub fn get(&self, key: &str) -> Annotation {
        self.records.get(key).cloned().unwrap_or_default()
    }

    /// Stored annotation for `key`, if any.
    pub fn record(&self, key: &str) -> Option<&Annotation> {
        self.records.get(key)
    }

    /// Whether an annotation exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Number of annotated keys.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All annotations.
    pub fn snapshot(&self) -> &AnnotationMap {
        &self.records
    }

    /// Apply a partial update of title and notes.
    ///
    /// Creates the record if absent, unless the update would only produce
    /// an empty record. Returns whether anything changed.
    pub fn set_fields(&mut self, key: &str, update: FieldUpdate) -> bool {
        if update.is_empty() {
            return false;
        }

        if !self.records.contains_key(key) {
            let blank = update.title.as_deref().is_none_or(str::is_empty)
                && update.description.as_deref().is_none_or(str::is_empty);
            if blank {
                return false;
            }
        }

        let record = self.records.entry(key.to_string()).or_default();
        let mut changed = false;
        if let Some(title) = update.title {
            if record.title != title {
                record.title = title;
                changed = true;
            }
        }
        if let Some(description) = update.description {
            if record.description != description {
                record.description = description;
                changed = true;
            }
        }

        if changed {
            log::debug!("Updated fields of '{}'", key);
        }
        changed
    }

    /// Append a comment stamped with the current time.
    ///
    /// Blank text is ignored. Returns the new comment.
    pub fn append_comment(&mut self, key: &str, text: &str) -> Option<Comment> {
        self.append_comment_at(key, text, now_utc())
    }

    /// Append a comment with an explicit creation time.
    pub fn append_comment_at(
        &mut self,
        key: &str,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> Option<Comment> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let record = self.records.entry(key.to_string()).or_default();
        let id = loop {
            let candidate = format!("c{}-{}", created_at.timestamp_millis(), self.next_seq);
            self.next_seq += 1;
            if record.comment(&candidate).is_none() {
                break candidate;
            }
        };

        let comment = Comment::new(id, text, created_at);
        record.comments.push(comment.clone());
        log::debug!("Added comment {} to '{}'", comment.id, key);
        Some(comment)
    }

    /// Delete one comment. Returns whether it existed.
    pub fn delete_comment(&mut self, key: &str, comment_id: &str) -> bool {
        let Some(record) = self.records.get_mut(key) else {
            return false;
        };
        let before = record.comments.len();
        record.comments.retain(|c| c.id != comment_id);
        before != record.comments.len()
    }

    /// Remove every annotation.
    pub fn clear_all(&mut self) {
        self.records.clear();
    }

    /// Replace the contents with `snapshot`.
    pub fn replace_all(&mut self, snapshot: AnnotationMap) {
        let comments: usize = snapshot.values().map(|a| a.comments.len()).sum();
        self.records = snapshot;
        self.next_seq = comments as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_unknown_is_empty() {
        let store = AnnotationStore::new();
        assert_eq!(store.get("nope"), Annotation::default());
        assert!(!store.contains("nope"));
    }

    #[test]
    fn test_set_fields_is_partial() {
        let mut store = AnnotationStore::new();
        assert!(store.set_fields("a", FieldUpdate::new().title("Gear")));
        assert!(store.set_fields("a", FieldUpdate::new().description("Settings icon")));
        let record = store.get("a");
        assert_eq!(record.title, "Gear");
        assert_eq!(record.description, "Settings icon");

        assert!(!store.set_fields("a", FieldUpdate::new().title("Gear")));
    }

    #[test]
    fn test_blank_update_does_not_create() {
        let mut store = AnnotationStore::new();
        assert!(!store.set_fields("a", FieldUpdate::new().title("").description("")));
        assert!(store.is_empty());
    }

    #[test]
    fn test_blank_comments_are_ignored() {
        let mut store = AnnotationStore::new();
        store.append_comment("a", "first");
        assert!(store.append_comment("a", "").is_none());
        assert!(store.append_comment("a", "   ").is_none());
        assert_eq!(store.get("a").comments.len(), 1);
    }

    #[test]
    fn test_comment_only_record_is_kept() {
        let mut store = AnnotationStore::new();
        store.append_comment("a", "hello");
        let record = store.record("a").unwrap();
        assert!(record.title.is_empty());
        assert!(record.description.is_empty());
        assert_eq!(record.comments[0].text, "hello");
    }

    #[test]
    fn test_comments_keep_order_and_unique_ids() {
        let mut store = AnnotationStore::new();
        let at = DateTime::from_timestamp_millis(1_000).unwrap();
        let a = store.append_comment_at("k", " one ", at).unwrap();
        let b = store.append_comment_at("k", "two", at).unwrap();
        assert_ne!(a.id, b.id);
        let texts: Vec<_> = store.get("k").comments.into_iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[test]
    fn test_delete_comment() {
        let mut store = AnnotationStore::new();
        let first = store.append_comment("k", "one").unwrap();
        store.append_comment("k", "two");
        assert!(store.delete_comment("k", &first.id));
        assert!(!store.delete_comment("k", &first.id));
        assert!(!store.delete_comment("other", "x"));
        assert_eq!(store.get("k").comments.len(), 1);
        assert!(store.contains("k"));
    }

    #[test]
    fn test_replace_and_clear() {
        let mut store = AnnotationStore::new();
        store.set_fields("a", FieldUpdate::new().title("x"));

        let mut snapshot = AnnotationMap::new();
        snapshot.insert(
            "b".into(),
            Annotation {
                title: "y".into(),
                ..Default::default()
            },
        );
        store.replace_all(snapshot);
        assert!(!store.contains("a"));
        assert_eq!(store.get("b").title, "y");

        store.clear_all();
        assert!(store.is_empty());
    }

    #[test]
    fn test_ids_stay_unique_after_replace() {
        let at = DateTime::from_timestamp_millis(5).unwrap();
        let mut store = AnnotationStore::new();
        let existing = store.append_comment_at("k", "one", at).unwrap();

        let mut restored = AnnotationStore::from_snapshot(store.snapshot().clone());
        let added = restored.append_comment_at("k", "two", at).unwrap();
        assert_ne!(existing.id, added.id);
    }
}
