//! Annotated SVG format implementation.
//!
//! Every annotated element that still exists in the drawing gets a
//! `<title>` (shown as a tooltip by browsers) and a `<desc>` as its first
//! children. Existing ones are reused. A single `<metadata>` node at the
//! start of the root carries the export timestamp and the whole snapshot
//! as JSON, so the file describes itself.

use std::collections::HashMap;

use crate::constants::{DESCRIPTION_COMMENT_COUNT, METADATA_ID, TOOLTIP_COMMENT_COUNT};
use crate::format::error::FormatError;
use crate::format::traits::{ExportFormat, ExportInput, FormatWarning};
use crate::model::Annotation;
use crate::svg::{Document, NodeId, sanitize_document};

/// Annotated SVG format.
pub struct AnnotatedSvgFormat;

impl ExportFormat for AnnotatedSvgFormat {
    fn id(&self) -> &'static str {
        "svg"
    }

    fn display_name(&self) -> &'static str {
        "Annotated SVG"
    }

    fn extension(&self) -> &'static str {
        "annotated.svg"
    }

    fn content_type(&self) -> &'static str {
        "image/svg+xml"
    }

    fn render(
        &self,
        input: &ExportInput<'_>,
        warnings: &mut Vec<FormatWarning>,
    ) -> Result<String, FormatError> {
        let (mut doc, report) = sanitize_document(input.svg)?;
        super::warn_removed_scripts(report.scripts_removed, warnings);
        let by_key: HashMap<&str, NodeId> = report
            .keys
            .iter()
            .map(String::as_str)
            .zip(report.keyed.iter().copied())
            .collect();

        for (key, annotation) in input.annotations {
            let Some(&element) = by_key.get(key.as_str()) else {
                log::debug!("Skipping orphaned annotation '{}'", key);
                warnings.push(
                    FormatWarning::info("Annotated element no longer exists").with_key(key.clone()),
                );
                continue;
            };

            let title = ensure_child(&mut doc, element, "title", 0);
            doc.set_text_content(title, &tooltip_text(key, annotation));

            let after_title = doc
                .children(element)
                .iter()
                .position(|&child| child == title)
                .map_or(0, |index| index + 1);
            let desc = ensure_child(&mut doc, element, "desc", after_title);
            doc.set_text_content(desc, &description_text(key, annotation));
        }

        write_metadata(&mut doc, input)?;
        Ok(doc.serialize()?)
    }

    fn fallback(&self, input: &ExportInput<'_>) -> String {
        input.svg.to_string()
    }
}

/// Tooltip: label, then optional notes and first comments.
pub(crate) fn tooltip_text(key: &str, annotation: &Annotation) -> String {
    let mut lines = vec![annotation.label_or(key).to_string()];

    let notes = annotation.description.trim();
    if !notes.is_empty() {
        lines.push(format!("Notes: {}", notes));
    }

    if !annotation.comments.is_empty() {
        let quoted: Vec<&str> = annotation
            .comments
            .iter()
            .take(TOOLTIP_COMMENT_COUNT)
            .map(|c| c.text.as_str())
            .collect();
        lines.push(format!("Comments: {}", quoted.join("; ")));
    }

    lines.join("\n")
}

/// Long description: label, notes and up to ten comments.
pub(crate) fn description_text(key: &str, annotation: &Annotation) -> String {
    let mut lines = vec![format!("Label: {}", annotation.label_or(key))];

    let notes = annotation.description.trim();
    lines.push(if notes.is_empty() {
        "Notes: (none)".to_string()
    } else {
        format!("Notes: {}", notes)
    });

    if annotation.comments.is_empty() {
        lines.push("Comments: (none)".to_string());
    } else {
        lines.push("Comments:".to_string());
        lines.extend(
            annotation
                .comments
                .iter()
                .take(DESCRIPTION_COMMENT_COUNT)
                .map(|c| format!("- {}", c.text)),
        );
    }

    lines.join("\n")
}

/// Find the direct child named `local` or create one at `index`.
fn ensure_child(doc: &mut Document, parent: NodeId, local: &str, index: usize) -> NodeId {
    let existing = doc
        .element_children(parent)
        .find(|&child| doc.element(child).is_some_and(|e| e.local_name() == local));
    if let Some(child) = existing {
        return child;
    }

    let name = qualified_name(doc, parent, local);
    let child = doc.create_element(&name);
    doc.insert_child(parent, index, child);
    child
}

/// `local` with the same namespace prefix as `parent`.
fn qualified_name(doc: &Document, parent: NodeId, local: &str) -> String {
    doc.element(parent)
        .and_then(|e| e.name.split_once(':'))
        .map_or_else(|| local.to_string(), |(prefix, _)| format!("{}:{}", prefix, local))
}

fn write_metadata(doc: &mut Document, input: &ExportInput<'_>) -> Result<(), FormatError> {
    let root = doc.root();
    let stale: Vec<NodeId> = doc
        .element_children(root)
        .filter(|&child| {
            doc.element(child)
                .is_some_and(|e| e.local_name() == "metadata" && e.id() == Some(METADATA_ID))
        })
        .collect();
    for node in stale {
        doc.detach(node);
    }

    let json = serde_json::to_string(input.annotations)?;
    let name = qualified_name(doc, root, "metadata");
    let metadata = doc.create_element(&name);
    if let Some(element) = doc.element_mut(metadata) {
        element.set_attribute("id", METADATA_ID);
        element.set_attribute("data-exported-at", input.timestamp());
    }
    doc.set_text_content(metadata, &json);
    doc.insert_child(root, 0, metadata);
    Ok(())
}
