//! Tests for the JSON dump format.

use super::*;
use crate::format::formats::{JsonDump, JsonDumpFormat};
use crate::format::{ExportFormat, ExportInput};

#[test]
fn test_dump_fields() {
    let annotations = snapshot(&[("iconA", annotation("Gear", "", &[]))]);
    let output = JsonDumpFormat.export(&ExportInput::new(ICONS, &annotations, exported_at()));

    assert_eq!(output.filename, "annotations.annotations.json");
    assert_eq!(output.content_type, "application/json");

    let value: serde_json::Value = serde_json::from_str(&output.content).unwrap();
    assert_eq!(value["exportedAt"], "2023-11-14T22:13:20Z");
    assert!(value["svgText"].as_str().unwrap().contains("cursor: pointer"));
    assert_eq!(value["annotations"]["iconA"]["title"], "Gear");
}

#[test]
fn test_dump_is_pretty_printed() {
    let output = JsonDumpFormat.export(&ExportInput::new(ICONS, &AnnotationMap::new(), exported_at()));
    assert!(output.content.contains("\n  \"svgText\""));
}

#[test]
fn test_invalid_svg_dumps_raw_input() {
    let output =
        JsonDumpFormat.export(&ExportInput::new("<nope/>", &AnnotationMap::new(), exported_at()));
    assert!(output.has_errors());
    let dump = JsonDump::from_json(&output.content).unwrap();
    assert_eq!(dump.svg_text, "<nope/>");
}
