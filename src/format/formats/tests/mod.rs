//! Unit tests for export format implementations.
//!
//! These tests verify the content of each export and that reading an
//! export back reproduces the annotation snapshot.

mod html_package_tests;
mod json_dump_tests;
mod roundtrip_tests;

use chrono::{DateTime, Utc};

use crate::model::{Annotation, AnnotationMap, Comment};

/// Fixed export time used by all format tests.
fn exported_at() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
}

/// Two icons with authored ids.
const ICONS: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 20 10"><g id="iconA"><path d="M0 0h5v5z"/></g><g id="iconB"><rect width="5" height="5"/></g></svg>"#;

fn annotation(title: &str, description: &str, comments: &[&str]) -> Annotation {
    Annotation {
        title: title.to_string(),
        description: description.to_string(),
        comments: comments
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let at = DateTime::from_timestamp_millis(1_700_000_000_000 + i as i64).unwrap();
                Comment::new(format!("c{}-{}", at.timestamp_millis(), i), *text, at)
            })
            .collect(),
    }
}

fn snapshot(entries: &[(&str, Annotation)]) -> AnnotationMap {
    entries
        .iter()
        .map(|(key, annotation)| (key.to_string(), annotation.clone()))
        .collect()
}
