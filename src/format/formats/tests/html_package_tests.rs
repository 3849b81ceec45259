//! Tests for the HTML package format.

use super::*;
use crate::format::formats::html_package::{json_data_block, script_string_literal};
use crate::format::formats::{HtmlPackageFormat, VIEWER_SCRIPT};
use crate::format::{ExportFormat, ExportInput};

fn export(svg: &str, annotations: &AnnotationMap) -> crate::format::ExportOutput {
    HtmlPackageFormat
        .export(&ExportInput::new(svg, annotations, exported_at()).with_name(Some("icons.svg")))
}

/// Text between `window.SVAT_SVG = ` and the end of its script element.
fn svg_literal(html: &str) -> &str {
    let start = html.find("window.SVAT_SVG = ").unwrap() + "window.SVAT_SVG = ".len();
    let end = start + html[start..].find("</script>").unwrap();
    &html[start..end]
}

#[test]
fn test_package_structure() {
    let annotations = snapshot(&[("iconA", annotation("Gear", "Settings icon", &[]))]);
    let output = export(ICONS, &annotations);

    assert_eq!(output.filename, "icons.annotated.html");
    assert_eq!(output.content_type, "text/html");
    assert!(!output.has_warnings());

    let html = &output.content;
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>icons.svg</title>"));
    assert!(html.contains(r#"<script type="application/json" id="svat-data">"#));
    assert!(html.contains(VIEWER_SCRIPT));
    assert!(html.contains("id=\\\"iconA\\\""));
}

#[test]
fn test_closing_script_in_svg_text_is_escaped() {
    let source = r#"<svg><g id="a"><text>&lt;/script&gt;<![CDATA[</script><script>alert(1)</script>]]></text></g><g id="b"><text>x &lt;/SCRIPT y</text></g></svg>"#;
    let output = export(source, &AnnotationMap::new());
    let literal = svg_literal(&output.content);

    assert!(literal.ends_with("\";"));
    assert!(!literal.to_ascii_lowercase().contains("</script"));
    assert!(literal.contains("<\\/script>"));
}

#[test]
fn test_embedded_literal_decodes_to_sanitized_svg() {
    let output = export(ICONS, &AnnotationMap::new());
    let literal = svg_literal(&output.content).trim_end_matches(';');
    let decoded: String = serde_json::from_str(literal).unwrap();
    assert_eq!(decoded, crate::svg::sanitize(ICONS).unwrap().markup);
}

#[test]
fn test_annotation_block_escapes_angle_brackets() {
    let annotations = snapshot(&[(
        "iconA",
        annotation("</script><b>", "a & b", &["<!-- hi -->"]),
    )]);
    let output = export(ICONS, &annotations);
    let html = &output.content;

    let start = html.find(r#"id="svat-data">"#).unwrap() + r#"id="svat-data">"#.len();
    let end = start + html[start..].find("</script>").unwrap();
    let block = &html[start..end];
    assert!(!block.contains('<'));

    let decoded: AnnotationMap = serde_json::from_str(block).unwrap();
    assert_eq!(decoded, annotations);
}

#[test]
fn test_invalid_svg_falls_back_to_empty_drawing() {
    let annotations = snapshot(&[("iconA", annotation("Gear", "", &[]))]);
    let output = export("not an svg", &annotations);

    assert!(output.has_errors());
    assert!(output.content.contains("svat-notice"));
    assert!(output.content.contains("Gear"));
    let literal = svg_literal(&output.content).trim_end_matches(';');
    let decoded: String = serde_json::from_str(literal).unwrap();
    assert!(decoded.starts_with("<svg"));
}

#[test]
fn test_helpers() {
    assert_eq!(script_string_literal("a</b").unwrap(), r#""a<\/b""#);
    assert_eq!(
        json_data_block(r#"{"a":"<&>"}"#),
        r#"{"a":"\u003c\u0026\u003e"}"#
    );
}

#[test]
fn test_viewer_script_cannot_close_its_element() {
    assert!(!VIEWER_SCRIPT.to_ascii_lowercase().contains("</script"));
    assert!(!VIEWER_SCRIPT.contains("<!--"));
}

#[test]
fn test_viewer_looks_up_own_records_only() {
    assert!(VIEWER_SCRIPT.contains("Object.prototype.hasOwnProperty.call(annotations, key)"));
    assert!(!VIEWER_SCRIPT.contains("annotations[selectedKey]"));
}
