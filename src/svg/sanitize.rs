//! SVG sanitation and normalization.
//!
//! The pipeline, in order:
//! 1. parse and locate the `<svg>` root
//! 2. remove every `<script>` element
//! 3. merge responsive sizing into the root's inline style
//! 4. resolve element keys
//! 5. merge interactive styling into every keyed element
//! 6. serialize
//!
//! Running it on its own output yields the same keys and styles.

use crate::constants::{INTERACTIVE_STYLE, ROOT_STYLE};
use crate::svg::dom::{Document, NodeId};
use crate::svg::error::SvgError;
use crate::svg::keys::{KeyStrategy, resolve_keys};
use crate::svg::style::merge_style;

/// Output of [`sanitize`].
#[derive(Debug, Clone)]
pub struct SanitizedSvg {
    /// Cleaned markup.
    pub markup: String,
    /// Keys of interactive elements in document order.
    pub keys: Vec<String>,
    /// How the keys were obtained.
    pub strategy: KeyStrategy,
    /// Number of script elements removed.
    pub scripts_removed: usize,
}

/// Sanitize raw SVG text.
pub fn sanitize(raw: &str) -> Result<SanitizedSvg, SvgError> {
    let (doc, report) = sanitize_document(raw)?;
    let markup = doc.serialize()?;
    Ok(SanitizedSvg {
        markup,
        keys: report.keys,
        strategy: report.strategy,
        scripts_removed: report.scripts_removed,
    })
}

/// Keys and counters gathered while sanitizing a document.
#[derive(Debug, Clone)]
pub struct SanitizeReport {
    /// Keys of interactive elements in document order.
    pub keys: Vec<String>,
    /// Keyed element nodes, parallel to `keys`.
    pub keyed: Vec<NodeId>,
    /// How the keys were obtained.
    pub strategy: KeyStrategy,
    /// Number of script elements removed.
    pub scripts_removed: usize,
}

/// Sanitize raw SVG text and return the document instead of markup.
pub fn sanitize_document(raw: &str) -> Result<(Document, SanitizeReport), SvgError> {
    let mut doc = Document::parse(raw)?;

    let scripts_removed = strip_scripts(&mut doc);
    if scripts_removed > 0 {
        log::info!("Removed {} script element(s) from SVG", scripts_removed);
    }

    let root = doc.root();
    if let Some(element) = doc.element_mut(root) {
        let style = merge_style(element.attribute("style"), ROOT_STYLE);
        element.set_attribute("style", style);
    }

    let keys = resolve_keys(&mut doc);
    for &id in &keys.keyed {
        if let Some(element) = doc.element_mut(id) {
            let style = merge_style(element.attribute("style"), INTERACTIVE_STYLE);
            element.set_attribute("style", style);
        }
    }

    log::debug!(
        "Sanitized SVG: {} interactive element(s) via {:?}",
        keys.keys.len(),
        keys.strategy
    );

    Ok((
        doc,
        SanitizeReport {
            keys: keys.keys,
            keyed: keys.keyed,
            strategy: keys.strategy,
            scripts_removed,
        },
    ))
}

fn strip_scripts(doc: &mut Document) -> usize {
    let scripts: Vec<NodeId> = doc
        .elements()
        .into_iter()
        .filter(|&id| {
            doc.element(id)
                .is_some_and(|e| e.local_name().eq_ignore_ascii_case("script"))
        })
        .collect();

    for &id in &scripts {
        doc.detach(id);
    }
    scripts.len()
}
