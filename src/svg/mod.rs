//! SVG parsing, sanitation and element addressing.

mod dom;
mod error;
mod keys;
mod query;
mod sanitize;
mod style;
mod surface;

pub use dom::{Document, Element, NodeId, NodeKind};
pub use error::SvgError;
pub use keys::{KeyReport, KeyStrategy, is_annotatable_tag, is_shape_tag, key_of, resolve_keys};
pub use query::{Selector, attribute_selector, css_escape, id_selector};
pub use sanitize::{SanitizeReport, SanitizedSvg, sanitize, sanitize_document};
pub use style::{InlineStyle, merge_style};
pub use surface::{SvgSurface, find_by_key, key_of_node};
