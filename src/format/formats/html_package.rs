//! Standalone HTML package format implementation.
//!
//! The page embeds three things and nothing else:
//!
//! - the sanitized drawing as a JavaScript string literal (`window.SVAT_SVG`)
//! - the annotation snapshot in a `<script type="application/json">` block
//! - the viewer script, which mounts the drawing and reproduces the
//!   editor's click and highlight behavior on its own
//!
//! Neither embedded payload may close its `<script>` element early: the
//! drawing literal has every `</` written as `<\/`, and the JSON block has
//! every `<` written as `\u003c`.

use quick_xml::escape::escape;

use crate::format::error::FormatError;
use crate::format::traits::{ExportFormat, ExportInput, FormatWarning};
use crate::svg::sanitize;

/// Viewer script shipped inside every package.
pub const VIEWER_SCRIPT: &str = include_str!("viewer.js");

/// Drawing used when the input cannot be sanitized.
const EMPTY_DRAWING: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#;

/// HTML package format.
pub struct HtmlPackageFormat;

impl ExportFormat for HtmlPackageFormat {
    fn id(&self) -> &'static str {
        "html"
    }

    fn display_name(&self) -> &'static str {
        "Interactive HTML"
    }

    fn extension(&self) -> &'static str {
        "annotated.html"
    }

    fn content_type(&self) -> &'static str {
        "text/html"
    }

    fn render(
        &self,
        input: &ExportInput<'_>,
        warnings: &mut Vec<FormatWarning>,
    ) -> Result<String, FormatError> {
        let sanitized = sanitize(input.svg)?;
        super::warn_removed_scripts(sanitized.scripts_removed, warnings);
        let svg_literal = script_string_literal(&sanitized.markup)?;
        let data = json_data_block(&serde_json::to_string(input.annotations)?);
        Ok(page(input, &svg_literal, &data, None))
    }

    fn fallback(&self, input: &ExportInput<'_>) -> String {
        let svg_literal = script_string_literal(EMPTY_DRAWING)
            .unwrap_or_else(|_| String::from("\"\""));
        let data = serde_json::to_string(input.annotations)
            .map(|json| json_data_block(&json))
            .unwrap_or_else(|_| String::from("{}"));
        page(
            input,
            &svg_literal,
            &data,
            Some("The drawing could not be processed; only the annotations were exported."),
        )
    }
}

/// Encode `text` as a JavaScript string literal safe inside `<script>`.
pub(crate) fn script_string_literal(text: &str) -> Result<String, FormatError> {
    let json = serde_json::to_string(text)?;
    Ok(json.replace("</", "<\\/").replace("<!--", "\\u003c!--"))
}

/// Make JSON safe as the body of a `<script type="application/json">`.
pub(crate) fn json_data_block(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

fn page(input: &ExportInput<'_>, svg_literal: &str, data: &str, notice: Option<&str>) -> String {
    let title = escape(input.name.unwrap_or("Annotated SVG"));
    let notice = notice
        .map(|text| format!("    <p class=\"svat-notice\">{}</p>\n", escape(text)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <meta name="generator" content="svat">
  <meta name="svat-exported-at" content="{exported_at}">
  <title>{title}</title>
  <style>
    body {{ margin: 0; font-family: system-ui, sans-serif; color: #1f2937; background: #f9fafb; }}
    main {{ display: flex; flex-wrap: wrap; gap: 1.5rem; padding: 1.5rem; }}
    #svat-drawing {{ flex: 1 1 28rem; min-width: 0; background: #fff; border: 1px solid #e5e7eb; border-radius: 8px; padding: 1rem; }}
    #svat-details {{ flex: 0 1 20rem; background: #fff; border: 1px solid #e5e7eb; border-radius: 8px; padding: 1rem; }}
    #svat-details h2 {{ margin: 0 0 0.25rem; font-size: 1.1rem; }}
    #svat-key {{ font-family: ui-monospace, monospace; color: #6b7280; font-size: 0.85rem; }}
    #svat-comments {{ padding-left: 1.25rem; }}
    .svat-empty {{ list-style: none; margin-left: -1.25rem; color: #6b7280; }}
    .svat-notice {{ color: #b45309; }}
  </style>
</head>
<body>
  <main>
    <div id="svat-drawing"></div>
    <aside id="svat-details">
{notice}      <h2 id="svat-label"></h2>
      <div id="svat-key"></div>
      <h3>Notes</h3>
      <p id="svat-notes"></p>
      <h3>Comments</h3>
      <ul id="svat-comments"></ul>
      <button type="button" id="svat-deselect">Clear selection</button>
    </aside>
  </main>
  <script type="application/json" id="svat-data">{data}</script>
  <script>window.SVAT_SVG = {svg_literal};</script>
  <script>
{viewer}
  </script>
</body>
</html>
"#,
        exported_at = input.timestamp(),
        title = title,
        notice = notice,
        data = data,
        svg_literal = svg_literal,
        viewer = VIEWER_SCRIPT,
    )
}
