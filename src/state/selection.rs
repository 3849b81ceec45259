//! Selection and highlight state machine.
//!
//! Two states: [`Selection::Idle`] and [`Selection::Selected`]. Entering
//! either one first restores the previously highlighted element; entering
//! `Selected` then highlights the new element.
//!
//! An element's original inline style is cached in
//! [`ORIGINAL_STYLE_ATTR`] the first time it is highlighted and reused on
//! every later highlight and restore, so repeated cycles never drift. An
//! empty cached value means the element had no `style` attribute.

use crate::constants::{HIGHLIGHT_STYLE, ORIGINAL_STYLE_ATTR};
use crate::svg::{SvgSurface, find_by_key, key_of_node, merge_style};

/// Current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Nothing selected
    #[default]
    Idle,
    /// The element with this key is selected
    Selected(String),
}

impl Selection {
    /// Selected key, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Selection::Idle => None,
            Selection::Selected(key) => Some(key),
        }
    }
}

/// Drives selection and highlighting on an [`SvgSurface`].
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    state: Selection,
}

impl SelectionController {
    /// Create an idle controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> &Selection {
        &self.state
    }

    /// Selected key, if any.
    pub fn selected_key(&self) -> Option<&str> {
        self.state.key()
    }

    /// Key of the nearest keyed element at or above `target`.
    ///
    /// The walk stops before the root; a click that reaches it resolves to nothing.
    pub fn resolve_target<S: SvgSurface>(surface: &S, target: &S::Node) -> Option<String> {
        let mut current = match surface.local_name(target) {
            Some(_) => Some(target.clone()),
            None => surface.parent_element(target),
        };

        while let Some(node) = current {
            if surface.is_root(&node) {
                return None;
            }
            if let Some(key) = key_of_node(surface, &node) {
                return Some(key);
            }
            current = surface.parent_element(&node);
        }
        None
    }

    /// Handle a click on `target`.
    ///
    /// Returns the selected key, or `None` when the click hit nothing keyed
    /// and the state was left unchanged.
    pub fn click<S: SvgSurface>(&mut self, surface: &mut S, target: &S::Node) -> Option<String> {
        let Some(key) = Self::resolve_target(surface, target) else {
            log::trace!("Click ignored: no keyed ancestor");
            return None;
        };
        self.select(surface, &key).then_some(key)
    }

    /// Select the element with `key`.
    ///
    /// Returns `false`, leaving the state unchanged, if no element has that key.
    pub fn select<S: SvgSurface>(&mut self, surface: &mut S, key: &str) -> bool {
        let Some(node) = find_by_key(surface, key) else {
            log::debug!("Cannot select '{}': no such element", key);
            return false;
        };

        self.clear_highlight(surface);
        apply_highlight(surface, &node);
        self.state = Selection::Selected(key.to_string());
        log::debug!("Selected '{}'", key);
        true
    }

    /// Return to idle, restoring the highlighted element.
    pub fn deselect<S: SvgSurface>(&mut self, surface: &mut S) {
        self.clear_highlight(surface);
        self.state = Selection::Idle;
    }

    /// Forget the selection without touching any surface.
    ///
    /// Used when the document is replaced and the old surface is gone.
    pub fn reset(&mut self) {
        self.state = Selection::Idle;
    }

    fn clear_highlight<S: SvgSurface>(&self, surface: &mut S) {
        let Some(key) = self.state.key() else {
            return;
        };
        if let Some(node) = find_by_key(surface, key) {
            restore_style(surface, &node);
        }
    }
}

fn apply_highlight<S: SvgSurface>(surface: &mut S, node: &S::Node) {
    let original = match surface.attribute(node, ORIGINAL_STYLE_ATTR) {
        Some(cached) => cached,
        None => {
            let current = surface.attribute(node, "style").unwrap_or_default();
            surface.set_attribute(node, ORIGINAL_STYLE_ATTR, &current);
            current
        }
    };

    let base = (!original.is_empty()).then_some(original.as_str());
    let highlighted = merge_style(base, HIGHLIGHT_STYLE);
    surface.set_attribute(node, "style", &highlighted);
}

fn restore_style<S: SvgSurface>(surface: &mut S, node: &S::Node) {
    let Some(original) = surface.attribute(node, ORIGINAL_STYLE_ATTR) else {
        return;
    };
    if original.is_empty() {
        surface.remove_attribute(node, "style");
    } else {
        surface.set_attribute(node, "style", &original);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::{Document, NodeId, sanitize};

    fn rendered(source: &str) -> Document {
        Document::parse(&sanitize(source).unwrap().markup).unwrap()
    }

    fn find(doc: &Document, name: &str) -> NodeId {
        doc.elements()
            .into_iter()
            .find(|&id| doc.element(id).unwrap().name == name)
            .unwrap()
    }

    #[test]
    fn test_click_nested_leaf_selects_group() {
        let mut doc = rendered(
            r#"<svg><g id="iconA"><g><path/></g></g><g id="iconB"><rect/></g></svg>"#,
        );
        let path = find(&doc, "path");
        let mut controller = SelectionController::new();

        assert_eq!(controller.click(&mut doc, &path).as_deref(), Some("iconA"));
        assert_eq!(controller.state(), &Selection::Selected("iconA".into()));
    }

    #[test]
    fn test_click_outside_keys_is_ignored() {
        let mut doc = rendered(r#"<svg><g id="iconA"><path/></g><circle/></svg>"#);
        let circle = find(&doc, "circle");
        let mut controller = SelectionController::new();

        assert!(controller.click(&mut doc, &circle).is_none());
        assert_eq!(controller.state(), &Selection::Idle);

        let root = doc.root();
        assert!(controller.click(&mut doc, &root).is_none());
    }

    #[test]
    fn test_highlight_moves_and_restores() {
        let mut doc = rendered(r#"<svg><g id="a"><path/></g><g id="b"><path/></g></svg>"#);
        let a = find_by_key(&doc, "a").unwrap();
        let b = find_by_key(&doc, "b").unwrap();
        let original_a = doc.attribute(&a, "style");
        let mut controller = SelectionController::new();

        assert!(controller.select(&mut doc, "a"));
        assert!(doc.attribute(&a, "style").unwrap().contains("outline: 2px"));

        assert!(controller.select(&mut doc, "b"));
        assert_eq!(doc.attribute(&a, "style"), original_a);
        assert!(doc.attribute(&b, "style").unwrap().contains("drop-shadow"));

        controller.deselect(&mut doc);
        assert_eq!(controller.state(), &Selection::Idle);
        assert!(!doc.attribute(&b, "style").unwrap().contains("outline:"));
    }

    #[test]
    fn test_repeated_cycles_do_not_drift() {
        let mut doc = rendered(r#"<svg><g id="a" style="fill: red"><path/></g></svg>"#);
        let a = find_by_key(&doc, "a").unwrap();
        let original = doc.attribute(&a, "style");
        let mut controller = SelectionController::new();

        for _ in 0..5 {
            controller.select(&mut doc, "a");
            controller.select(&mut doc, "a");
            controller.deselect(&mut doc);
        }
        assert_eq!(doc.attribute(&a, "style"), original);
    }

    #[test]
    fn test_unstyled_element_restored_without_style() {
        let mut doc = Document::parse(r#"<svg><g id="a"><path/></g></svg>"#).unwrap();
        let a = find_by_key(&doc, "a").unwrap();
        let mut controller = SelectionController::new();

        controller.select(&mut doc, "a");
        controller.deselect(&mut doc);
        assert_eq!(doc.attribute(&a, "style"), None);
        assert_eq!(doc.attribute(&a, ORIGINAL_STYLE_ATTR).as_deref(), Some(""));
    }

    #[test]
    fn test_select_special_character_id() {
        let mut doc = rendered(r#"<svg><g id="a:b"><path/></g></svg>"#);
        let mut controller = SelectionController::new();
        assert!(controller.select(&mut doc, "a:b"));
        assert_eq!(controller.selected_key(), Some("a:b"));
    }

    #[test]
    fn test_select_unknown_key_keeps_state() {
        let mut doc = rendered(r#"<svg><g id="a"><path/></g></svg>"#);
        let mut controller = SelectionController::new();
        controller.select(&mut doc, "a");
        assert!(!controller.select(&mut doc, "missing"));
        assert_eq!(controller.selected_key(), Some("a"));
    }

    #[test]
    fn test_synthesized_keys_are_selectable() {
        let mut doc = rendered("<svg><g><path/></g><g><rect/></g></svg>");
        let rect = find(&doc, "rect");
        let mut controller = SelectionController::new();
        assert_eq!(controller.click(&mut doc, &rect).as_deref(), Some("svat-1"));
    }

    #[test]
    fn test_reset_forgets_selection() {
        let mut doc = rendered(r#"<svg><g id="a"><path/></g></svg>"#);
        let mut controller = SelectionController::new();
        controller.select(&mut doc, "a");
        controller.reset();
        assert_eq!(controller.state(), &Selection::Idle);
    }
}
