//! Element key resolution.
//!
//! Every element a user can click on is identified by a key: its own `id`
//! when the author provided one, otherwise a synthesized value stored in the
//! [`KEY_ATTR`] attribute. Synthesis prefers groups over leaf shapes so that
//! an icon made of several paths is annotated as one unit.

use std::collections::HashSet;

use crate::constants::{GROUP_TAG, KEY_ATTR, KEY_PREFIX, SHAPE_TAGS};
use crate::svg::dom::{Document, Element, NodeId};

/// How the keys of a document were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// Author-provided ids on groups or shapes
    Authored,
    /// Synthesized keys from an earlier pass were kept
    Existing,
    /// Keys synthesized on groups containing shapes
    Groups,
    /// Keys synthesized on bare shapes
    Shapes,
    /// Nothing annotatable was found
    None,
}

/// Result of resolving keys on a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyReport {
    /// Which rule produced the keys.
    pub strategy: KeyStrategy,
    /// Keyed elements in document order.
    pub keyed: Vec<NodeId>,
    /// Their keys, parallel to `keyed`.
    pub keys: Vec<String>,
}

/// Whether elements with this tag can carry a key.
pub fn is_annotatable_tag(local_name: &str) -> bool {
    local_name == GROUP_TAG || is_shape_tag(local_name)
}

/// Whether this tag is a primitive shape.
pub fn is_shape_tag(local_name: &str) -> bool {
    SHAPE_TAGS.contains(&local_name)
}

/// Key of an annotatable element. The `id` wins over a synthesized key.
pub fn key_of(element: &Element) -> Option<&str> {
    if !is_annotatable_tag(element.local_name()) {
        return None;
    }
    element
        .id()
        .or_else(|| element.attribute(KEY_ATTR).filter(|key| !key.is_empty()))
}

/// Make sure every annotatable element of `doc` has a key.
///
/// A document whose groups or shapes carry any authored `id` is left as is,
/// apart from dropping stale synthesized keys. Otherwise keys already
/// synthesized by an earlier pass are kept, which makes the operation
/// idempotent. Only when neither exists are new keys synthesized: first on
/// every group that contains a shape, and if there are none, on every shape.
pub fn resolve_keys(doc: &mut Document) -> KeyReport {
    let elements = doc.elements();

    let authored = elements.iter().any(|&id| {
        doc.element(id)
            .is_some_and(|e| is_annotatable_tag(e.local_name()) && e.id().is_some())
    });

    if authored {
        for &id in &elements {
            if let Some(element) = doc.element_mut(id) {
                element.remove_attribute(KEY_ATTR);
            }
        }
        return collect(doc, &elements, KeyStrategy::Authored);
    }

    let existing = elements.iter().any(|&id| {
        doc.element(id).is_some_and(|e| {
            is_annotatable_tag(e.local_name()) && e.attribute(KEY_ATTR).is_some_and(|k| !k.is_empty())
        })
    });
    if existing {
        return collect(doc, &elements, KeyStrategy::Existing);
    }

    let mut keygen = KeyGenerator::new(doc, &elements);

    let groups: Vec<NodeId> = elements
        .iter()
        .copied()
        .filter(|&id| {
            doc.element(id)
                .is_some_and(|e| e.local_name() == GROUP_TAG)
                && contains_shape(doc, id)
        })
        .collect();

    if !groups.is_empty() {
        assign(doc, &groups, &mut keygen);
        log::debug!("Synthesized keys for {} groups", groups.len());
        return collect(doc, &elements, KeyStrategy::Groups);
    }

    let shapes: Vec<NodeId> = elements
        .iter()
        .copied()
        .filter(|&id| doc.element(id).is_some_and(|e| is_shape_tag(e.local_name())))
        .collect();

    if !shapes.is_empty() {
        assign(doc, &shapes, &mut keygen);
        log::debug!("Synthesized keys for {} shapes", shapes.len());
        return collect(doc, &elements, KeyStrategy::Shapes);
    }

    collect(doc, &elements, KeyStrategy::None)
}

fn contains_shape(doc: &Document, id: NodeId) -> bool {
    doc.descendants(id)
        .into_iter()
        .any(|child| doc.element(child).is_some_and(|e| is_shape_tag(e.local_name())))
}

fn assign(doc: &mut Document, targets: &[NodeId], keygen: &mut KeyGenerator) {
    for &id in targets {
        let key = keygen.next_key();
        if let Some(element) = doc.element_mut(id) {
            element.set_attribute(KEY_ATTR, key);
        }
    }
}

fn collect(doc: &Document, elements: &[NodeId], strategy: KeyStrategy) -> KeyReport {
    let mut keyed = Vec::new();
    let mut keys = Vec::new();
    for &id in elements {
        if let Some(key) = doc.element(id).and_then(key_of) {
            keyed.push(id);
            keys.push(key.to_string());
        }
    }
    KeyReport {
        strategy,
        keyed,
        keys,
    }
}

/// Monotonic key source that skips values already used as ids.
struct KeyGenerator {
    next: usize,
    taken: HashSet<String>,
}

impl KeyGenerator {
    fn new(doc: &Document, elements: &[NodeId]) -> Self {
        let taken = elements
            .iter()
            .filter_map(|&id| doc.element(id).and_then(|e| e.id()))
            .map(str::to_string)
            .collect();
        Self { next: 0, taken }
    }

    fn next_key(&mut self) -> String {
        loop {
            let key = format!("{}{}", KEY_PREFIX, self.next);
            self.next += 1;
            if !self.taken.contains(&key) {
                return key;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(source: &str) -> (Document, KeyReport) {
        let mut doc = Document::parse(source).unwrap();
        let report = resolve_keys(&mut doc);
        (doc, report)
    }

    #[test]
    fn test_authored_ids_are_kept() {
        let (_, report) = resolve(r#"<svg><g id="iconA"><path/></g><g><rect/></g></svg>"#);
        assert_eq!(report.strategy, KeyStrategy::Authored);
        assert_eq!(report.keys, vec!["iconA"]);
    }

    #[test]
    fn test_groups_preferred_over_shapes() {
        let (_, report) = resolve("<svg><g><path/><path/></g><g><g><circle/></g></g><g/></svg>");
        assert_eq!(report.strategy, KeyStrategy::Groups);
        assert_eq!(report.keys, vec!["svat-0", "svat-1", "svat-2"]);
    }

    #[test]
    fn test_flat_document_keys_shapes() {
        let (_, report) = resolve("<svg><rect/><circle/><path/></svg>");
        assert_eq!(report.strategy, KeyStrategy::Shapes);
        assert_eq!(report.keys.len(), 3);
    }

    #[test]
    fn test_no_annotatable_content() {
        let (_, report) = resolve("<svg><defs/></svg>");
        assert_eq!(report.strategy, KeyStrategy::None);
        assert!(report.keys.is_empty());
    }

    #[test]
    fn test_resolve_twice_is_stable() {
        let (mut doc, first) = resolve("<svg><g><path/></g><g><rect/></g></svg>");
        let second = resolve_keys(&mut doc);
        assert_eq!(second.strategy, KeyStrategy::Existing);
        assert_eq!(first.keys, second.keys);
    }

    #[test]
    fn test_id_is_authoritative_over_synthesized() {
        let (doc, report) =
            resolve(r#"<svg><g id="real" data-svat-key="svat-0"><path/></g></svg>"#);
        assert_eq!(report.keys, vec!["real"]);
        let g = report.keyed[0];
        assert_eq!(doc.element(g).unwrap().attribute(KEY_ATTR), None);
    }

    #[test]
    fn test_synthesized_keys_avoid_existing_ids() {
        let (_, report) = resolve(
            r#"<svg><defs><linearGradient id="svat-0"/></defs><g><path/></g></svg>"#,
        );
        assert_eq!(report.keys, vec!["svat-1"]);
    }
}
