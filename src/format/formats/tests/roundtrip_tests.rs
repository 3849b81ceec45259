//! Round-trip tests: exports read back into the store.

use super::*;
use crate::format::formats::{JsonDump, JsonDumpFormat};
use crate::format::{ExportFormat, ExportInput};
use crate::state::AnnotationStore;

#[test]
fn test_json_roundtrip_reproduces_store() {
    let mut store = AnnotationStore::new();
    store.set_fields(
        "iconA",
        crate::model::FieldUpdate::new().title("Gear").description("Settings icon"),
    );
    store.append_comment_at("iconA", "needs review", exported_at());
    store.append_comment_at("iconA", "second", exported_at());
    store.append_comment_at("iconB", "only a comment", exported_at());

    let output = JsonDumpFormat.export(&ExportInput::new(ICONS, store.snapshot(), exported_at()));
    let dump = JsonDump::from_json(&output.content).unwrap();
    let restored = AnnotationStore::from_snapshot(dump.annotations);

    assert_eq!(restored.snapshot(), store.snapshot());
    let texts: Vec<String> = restored
        .get("iconA")
        .comments
        .into_iter()
        .map(|c| c.text)
        .collect();
    assert_eq!(texts, vec!["needs review", "second"]);
}

#[test]
fn test_exported_svg_text_is_stable_input() {
    let annotations = snapshot(&[("iconA", annotation("Gear", "", &["x"]))]);
    let first = JsonDumpFormat.export(&ExportInput::new(ICONS, &annotations, exported_at()));
    let dump = JsonDump::from_json(&first.content).unwrap();

    let second =
        JsonDumpFormat.export(&ExportInput::new(&dump.svg_text, &dump.annotations, exported_at()));
    assert_eq!(first.content, second.content);
}
