//! Rendered-document abstraction for the selection controller.
//!
//! The controller only needs to walk parents, read and write attributes and
//! run a selector. [`Document`] implements this natively; the browser build
//! implements it over live DOM elements.

use crate::constants::KEY_ATTR;
use crate::svg::dom::{Document, NodeId};
use crate::svg::keys::is_annotatable_tag;
use crate::svg::query::{attribute_selector, id_selector};

/// A rendered SVG the controller can inspect and restyle.
pub trait SvgSurface {
    /// Handle to one node of the surface.
    type Node: Clone + PartialEq;

    /// Nearest element above `node`, if any.
    fn parent_element(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Whether `node` is the `<svg>` root that bounds ancestor walks.
    fn is_root(&self, node: &Self::Node) -> bool;

    /// Local tag name when `node` is an element.
    fn local_name(&self, node: &Self::Node) -> Option<String>;

    /// Attribute value of an element.
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Set an attribute on an element.
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

    /// Remove an attribute from an element.
    fn remove_attribute(&mut self, node: &Self::Node, name: &str);

    /// First element matching `selector`.
    fn query_selector(&self, selector: &str) -> Option<Self::Node>;
}

/// Key of `node` when it is an annotatable element carrying one.
pub fn key_of_node<S: SvgSurface>(surface: &S, node: &S::Node) -> Option<String> {
    let name = surface.local_name(node)?;
    if !is_annotatable_tag(&name) {
        return None;
    }
    surface
        .attribute(node, "id")
        .filter(|id| !id.is_empty())
        .or_else(|| surface.attribute(node, KEY_ATTR).filter(|key| !key.is_empty()))
}

/// Find the element identified by `key`.
///
/// Tries an escaped id lookup first, then the synthesized key attribute.
pub fn find_by_key<S: SvgSurface>(surface: &S, key: &str) -> Option<S::Node> {
    surface
        .query_selector(&id_selector(key))
        .or_else(|| surface.query_selector(&attribute_selector(KEY_ATTR, key)))
}

impl SvgSurface for Document {
    type Node = NodeId;

    fn parent_element(&self, node: &NodeId) -> Option<NodeId> {
        let mut current = self.parent(*node);
        while let Some(id) = current {
            if self.element(id).is_some() {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    fn is_root(&self, node: &NodeId) -> bool {
        *node == self.root()
    }

    fn local_name(&self, node: &NodeId) -> Option<String> {
        self.element(*node).map(|e| e.local_name().to_string())
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.element(*node)
            .and_then(|e| e.attribute(name))
            .map(str::to_string)
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(*node) {
            element.set_attribute(name, value);
        }
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) {
        if let Some(element) = self.element_mut(*node) {
            element.remove_attribute(name);
        }
    }

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        match Document::query_selector(self, selector) {
            Ok(found) => found,
            Err(e) => {
                log::debug!("Selector lookup failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_special_id() {
        let doc = Document::parse(r#"<svg><g id="a:b"><path/></g></svg>"#).unwrap();
        let found = find_by_key(&doc, "a:b").unwrap();
        assert_eq!(key_of_node(&doc, &found).as_deref(), Some("a:b"));
    }

    #[test]
    fn test_find_by_synthesized_key() {
        let doc = Document::parse(r#"<svg><g data-svat-key="svat-0"><path/></g></svg>"#).unwrap();
        let found = find_by_key(&doc, "svat-0").unwrap();
        assert_eq!(doc.local_name(&found).as_deref(), Some("g"));
    }

    #[test]
    fn test_non_annotatable_has_no_key() {
        let doc = Document::parse(r#"<svg id="root"><defs id="d"/></svg>"#).unwrap();
        assert_eq!(key_of_node(&doc, &doc.root()), None);
    }
}
