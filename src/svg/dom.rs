//! Arena-backed XML tree for SVG documents.
//!
//! The tree is built from `quick-xml` reader events and written back with
//! `quick_xml::Writer`. Nodes live in a flat vector and refer to each other
//! by index, so detaching a node only unlinks it; the slot stays allocated
//! for the lifetime of the document.
//!
//! Character data is stored in escaped form. Entity references are expanded
//! on parse: the XML and HTML5 named entities, numeric references and any
//! `<!ENTITY>` declared in the doctype's internal subset. The doctype itself
//! is not serialized, so the output never depends on it. A reference that
//! cannot be resolved is kept as literal text.

use std::borrow::Cow;
use std::collections::HashMap;

use quick_xml::escape::{escape, partial_escape, unescape, unescape_with};
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::svg::error::SvgError;

/// General entities declared in a doctype, by name.
type Entities = HashMap<String, String>;

/// Index of a node inside a [`Document`].
pub type NodeId = usize;

/// An element with its qualified name and attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified tag name as written (may carry a prefix such as `svg:`).
    pub name: String,
    /// Attributes with unescaped values.
    pub attributes: Vec<(String, String)>,
}

impl Element {
    /// Create an element without attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Tag name without namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Get an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    /// The `id` attribute, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.attribute("id").filter(|id| !id.is_empty())
    }
}

/// Content of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element
    Element(Element),
    /// Character data in escaped form
    Text(String),
    /// Raw CDATA section content
    CData(String),
    /// Comment body
    Comment(String),
    /// Processing instruction body
    ProcessingInstruction(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A parsed SVG document rooted at its first `<svg>` element.
///
/// Anything outside that element (XML declaration, doctype, wrapper
/// elements) is dropped on parse and never serialized.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Parse markup and locate the `<svg>` root.
    ///
    /// Fails on malformed XML and when no `svg` element exists.
    pub fn parse(text: &str) -> Result<Self, SvgError> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(false);
        reader.check_end_names(true);

        let mut nodes: Vec<Node> = Vec::new();
        let mut top_level: Vec<NodeId> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut entities = Entities::new();

        loop {
            match reader.read_event()? {
                Event::DocType(doctype) => {
                    entities.extend(entity_declarations(&String::from_utf8_lossy(&doctype)));
                }
                Event::Start(start) => {
                    let kind = NodeKind::Element(element_from_start(&start, &entities)?);
                    let id = push_node(&mut nodes, &mut top_level, stack.last().copied(), kind);
                    stack.push(id);
                }
                Event::Empty(start) => {
                    let kind = NodeKind::Element(element_from_start(&start, &entities)?);
                    push_node(&mut nodes, &mut top_level, stack.last().copied(), kind);
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(text) => {
                    // Whitespace between prolog items is irrelevant
                    if stack.is_empty() {
                        continue;
                    }
                    let kind = NodeKind::Text(normalize_text(&text, &entities));
                    push_node(&mut nodes, &mut top_level, stack.last().copied(), kind);
                }
                Event::CData(data) => {
                    let kind = NodeKind::CData(String::from_utf8_lossy(&data).into_owned());
                    push_node(&mut nodes, &mut top_level, stack.last().copied(), kind);
                }
                Event::Comment(comment) => {
                    let kind = NodeKind::Comment(String::from_utf8_lossy(&comment).into_owned());
                    push_node(&mut nodes, &mut top_level, stack.last().copied(), kind);
                }
                Event::PI(pi) => {
                    let kind =
                        NodeKind::ProcessingInstruction(String::from_utf8_lossy(&pi).into_owned());
                    push_node(&mut nodes, &mut top_level, stack.last().copied(), kind);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(&open) = stack.last() {
            let name = match &nodes[open].kind {
                NodeKind::Element(element) => element.name.clone(),
                _ => String::from("?"),
            };
            return Err(SvgError::malformed(format!("unclosed element <{}>", name)));
        }

        let root = find_svg(&nodes, &top_level).ok_or(SvgError::MissingRoot)?;
        nodes[root].parent = None;

        log::trace!("Parsed SVG document with {} nodes", nodes.len());
        Ok(Self { nodes, root })
    }

    /// The `<svg>` root element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node content, if the id is valid.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id).map(|node| &node.kind)
    }

    /// Element data, if the node is an element.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    /// Mutable element data, if the node is an element.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(id).map(|node| &mut node.kind) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    /// Parent node. `None` for the root and for detached nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// Direct children in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Direct element children in document order.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.element(child).is_some())
    }

    /// All descendants of `id` in pre-order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Every element reachable from the root, root first, in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .filter(|&id| self.element(id).is_some())
            .collect()
    }

    /// Whether `id` is still attached beneath the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push_detached(NodeKind::Element(Element::new(name)))
    }

    /// Create a detached text node; `text` is escaped on the way in.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_detached(NodeKind::Text(escape(text).into_owned()))
    }

    /// Insert `child` under `parent` at `index` (clamped), moving it if attached elsewhere.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if parent >= self.nodes.len() || child >= self.nodes.len() || parent == child {
            return;
        }
        self.detach(child);
        let children = &mut self.nodes[parent].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child].parent = Some(parent);
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let end = self.children(parent).len();
        self.insert_child(parent, end, child);
    }

    /// Unlink a node from its parent. Detaching the root is a no-op.
    pub fn detach(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        let Some(parent) = self.parent(id) else {
            return;
        };
        self.nodes[parent].children.retain(|&child| child != id);
        self.nodes[id].parent = None;
    }

    /// Concatenated, unescaped character data beneath `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in std::iter::once(id).chain(self.descendants(id)) {
            match self.kind(node) {
                Some(NodeKind::Text(raw)) => {
                    let text = unescape(raw).unwrap_or(Cow::Borrowed(raw.as_str()));
                    out.push_str(&text);
                }
                Some(NodeKind::CData(raw)) => out.push_str(raw),
                _ => {}
            }
        }
        out
    }

    /// Replace all children of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        let old: Vec<NodeId> = self.children(id).to_vec();
        for child in old {
            self.detach(child);
        }
        let text = self.create_text(text);
        self.append_child(id, text);
    }

    /// Serialize the whole document.
    pub fn serialize(&self) -> Result<String, SvgError> {
        self.serialize_node(self.root)
    }

    /// Serialize a single subtree.
    pub fn serialize_node(&self, id: NodeId) -> Result<String, SvgError> {
        let mut writer = Writer::new(Vec::new());
        self.write_node(&mut writer, id)?;
        Ok(String::from_utf8(writer.into_inner())?)
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> Result<(), SvgError> {
        enum Step {
            Enter(NodeId),
            Leave(NodeId),
        }

        let mut steps = vec![Step::Enter(id)];
        while let Some(step) = steps.pop() {
            let id = match step {
                Step::Enter(id) => id,
                Step::Leave(id) => {
                    if let Some(NodeKind::Element(element)) = self.kind(id) {
                        write_event(writer, Event::End(BytesEnd::new(element.name.as_str())))?;
                    }
                    continue;
                }
            };
            let Some(node) = self.nodes.get(id) else {
                continue;
            };

            match &node.kind {
                NodeKind::Element(element) => {
                    let mut start = BytesStart::new(element.name.as_str());
                    for (key, value) in &element.attributes {
                        start.push_attribute((key.as_str(), value.as_str()));
                    }

                    if node.children.is_empty() {
                        write_event(writer, Event::Empty(start))?;
                    } else {
                        write_event(writer, Event::Start(start))?;
                        steps.push(Step::Leave(id));
                        steps.extend(node.children.iter().rev().map(|&child| Step::Enter(child)));
                    }
                }
                NodeKind::Text(raw) => {
                    write_event(writer, Event::Text(BytesText::from_escaped(raw.as_str())))?;
                }
                NodeKind::CData(raw) => {
                    write_event(writer, Event::CData(BytesCData::new(raw.as_str())))?;
                }
                NodeKind::Comment(raw) => {
                    write_event(writer, Event::Comment(BytesText::from_escaped(raw.as_str())))?;
                }
                NodeKind::ProcessingInstruction(raw) => {
                    write_event(writer, Event::PI(BytesText::from_escaped(raw.as_str())))?;
                }
            }
        }
        Ok(())
    }

    fn push_detached(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), SvgError> {
    writer
        .write_event(event)
        .map_err(|e| SvgError::Xml(e.into()))
}

fn element_from_start(start: &BytesStart<'_>, entities: &Entities) -> Result<Element, SvgError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = Element::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.unescape_value_with(|name| entities.get(name).map(String::as_str)) {
            Ok(value) => value.into_owned(),
            Err(e) => {
                log::warn!("Keeping attribute '{}' as literal text: {}", key, e);
                String::from_utf8_lossy(&attr.value).into_owned()
            }
        };
        element.attributes.push((key, value));
    }

    Ok(element)
}

/// Expand entity references in character data and re-escape the markup characters.
fn normalize_text(text: &BytesText<'_>, entities: &Entities) -> String {
    match text.unescape_with(|name| entities.get(name).map(String::as_str)) {
        Ok(value) => partial_escape(&value).into_owned(),
        Err(e) => {
            log::warn!("Keeping text as literal: {}", e);
            partial_escape(&String::from_utf8_lossy(text)).into_owned()
        }
    }
}

/// General entities declared in a doctype's internal subset.
///
/// Parameter entities and external (`SYSTEM`/`PUBLIC`) entities are skipped.
/// A value may refer to entities declared before it.
fn entity_declarations(doctype: &str) -> Entities {
    const DECLARATION: &str = "<!ENTITY";

    let mut entities = Entities::new();
    let mut rest = doctype;
    while let Some(start) = rest.find(DECLARATION) {
        rest = rest[start + DECLARATION.len()..].trim_start();

        let parameter = rest.starts_with('%');
        if parameter {
            rest = rest[1..].trim_start();
        }

        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();

        let Some(quote) = rest.chars().next().filter(|&c| c == '"' || c == '\'') else {
            continue;
        };
        let Some(len) = rest[1..].find(quote) else {
            break;
        };
        let value = &rest[1..1 + len];
        rest = &rest[len + 2..];

        if parameter || name.is_empty() {
            continue;
        }
        let expanded = match unescape_with(value, |n| entities.get(n).map(String::as_str)) {
            Ok(expanded) => expanded.into_owned(),
            Err(_) => value.to_string(),
        };
        entities.insert(name.to_string(), expanded);
    }
    entities
}

fn push_node(
    nodes: &mut Vec<Node>,
    top_level: &mut Vec<NodeId>,
    parent: Option<NodeId>,
    kind: NodeKind,
) -> NodeId {
    let id = nodes.len();
    nodes.push(Node {
        kind,
        parent,
        children: Vec::new(),
    });
    match parent {
        Some(parent) => nodes[parent].children.push(id),
        None => top_level.push(id),
    }
    id
}

fn find_svg(nodes: &[Node], top_level: &[NodeId]) -> Option<NodeId> {
    let mut stack: Vec<NodeId> = top_level.iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        if let NodeKind::Element(element) = &nodes[id].kind {
            if element.local_name() == "svg" {
                return Some(id);
            }
        }
        stack.extend(nodes[id].children.iter().rev().copied());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_finds_root() {
        let doc = Document::parse(r#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"><rect/></svg>"#)
            .unwrap();
        assert_eq!(doc.element(doc.root()).unwrap().local_name(), "svg");
        assert_eq!(doc.elements().len(), 2);
    }

    #[test]
    fn test_parse_nested_root() {
        let doc = Document::parse("<div><p>hi</p><svg:svg><g/></svg:svg></div>").unwrap();
        let root = doc.element(doc.root()).unwrap();
        assert_eq!(root.name, "svg:svg");
        assert_eq!(doc.parent(doc.root()), None);
        assert_eq!(doc.serialize().unwrap(), "<svg:svg><g/></svg:svg>");
    }

    #[test]
    fn test_missing_root() {
        let err = Document::parse("<html><body/></html>").unwrap_err();
        assert!(matches!(err, SvgError::MissingRoot));
    }

    #[test]
    fn test_malformed_input() {
        assert!(Document::parse("<svg><g></svg>").is_err());
        assert!(Document::parse("<svg><g>").is_err());
        assert!(Document::parse("not xml at all").is_err());
    }

    #[test]
    fn test_serialize_preserves_text_and_cdata() {
        let source = "<svg><text>a &amp; b</text><style><![CDATA[.x{fill:red}]]></style><!-- note --></svg>";
        let doc = Document::parse(source).unwrap();
        assert_eq!(doc.serialize().unwrap(), source);
    }

    #[test]
    fn test_attribute_escaping_roundtrip() {
        let doc = Document::parse(r#"<svg><g data-x="a &lt; b &quot;c&quot;"/></svg>"#).unwrap();
        let g = doc.element_children(doc.root()).next().unwrap();
        assert_eq!(doc.element(g).unwrap().attribute("data-x"), Some(r#"a < b "c""#));

        let again = Document::parse(&doc.serialize().unwrap()).unwrap();
        let g = again.element_children(again.root()).next().unwrap();
        assert_eq!(again.element(g).unwrap().attribute("data-x"), Some(r#"a < b "c""#));
    }

    #[test]
    fn test_internal_subset_entities_expanded() {
        let source = r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "x.dtd" [
            <!ENTITY ns_svg "http://www.w3.org/2000/svg">
            <!ENTITY % local "ignored">
            <!ENTITY label 'Fan &amp; motor'>
            <!ENTITY full "&label; unit">
        ]><svg xmlns="&ns_svg;"><text>&full;</text></svg>"#;
        let doc = Document::parse(source).unwrap();
        let root = doc.element(doc.root()).unwrap();
        assert_eq!(root.attribute("xmlns"), Some("http://www.w3.org/2000/svg"));

        let text = doc.element_children(doc.root()).next().unwrap();
        assert_eq!(doc.text_content(text), "Fan & motor unit");
        assert_eq!(
            doc.serialize().unwrap(),
            r#"<svg xmlns="http://www.w3.org/2000/svg"><text>Fan &amp; motor unit</text></svg>"#
        );
    }

    #[test]
    fn test_html_entities_in_text() {
        let doc = Document::parse("<svg><text>a&nbsp;b&#33;</text></svg>").unwrap();
        assert_eq!(doc.serialize().unwrap(), "<svg><text>a\u{a0}b!</text></svg>");
    }

    #[test]
    fn test_unknown_entity_kept_as_literal_text() {
        let doc = Document::parse(r#"<svg data-x="&nope;"><text>&nope;</text></svg>"#).unwrap();
        let out = doc.serialize().unwrap();
        assert_eq!(out, r#"<svg data-x="&amp;nope;"><text>&amp;nope;</text></svg>"#);
        assert!(Document::parse(&out).is_ok());
    }

    #[test]
    fn test_deep_nesting_serializes() {
        let depth = 20_000;
        let source = format!("<svg>{}<rect/>{}</svg>", "<g>".repeat(depth), "</g>".repeat(depth));
        let doc = Document::parse(&source).unwrap();
        assert_eq!(doc.serialize().unwrap(), source);
    }

    #[test]
    fn test_insert_and_detach() {
        let mut doc = Document::parse("<svg><rect/></svg>").unwrap();
        let title = doc.create_element("title");
        doc.set_text_content(title, "x < y");
        doc.insert_child(doc.root(), 0, title);
        assert_eq!(
            doc.serialize().unwrap(),
            "<svg><title>x &lt; y</title><rect/></svg>"
        );
        assert_eq!(doc.text_content(title), "x < y");

        doc.detach(title);
        assert!(!doc.is_attached(title));
        assert_eq!(doc.serialize().unwrap(), "<svg><rect/></svg>");
    }

    #[test]
    fn test_descendants_preorder() {
        let doc = Document::parse("<svg><g><a/><b/></g><c/></svg>").unwrap();
        let names: Vec<_> = doc
            .descendants(doc.root())
            .into_iter()
            .filter_map(|id| doc.element(id).map(|e| e.name.clone()))
            .collect();
        assert_eq!(names, vec!["g", "a", "b", "c"]);
    }
}
