//! Global constants for the SVAT application

/// Attribute carrying a synthesized element key.
pub const KEY_ATTR: &str = "data-svat-key";

/// Prefix of synthesized key values.
pub const KEY_PREFIX: &str = "svat-";

/// Attribute caching an element's inline style from before its first highlight.
pub const ORIGINAL_STYLE_ATTR: &str = "data-svat-original-style";

/// Tag name for grouping elements.
pub const GROUP_TAG: &str = "g";

/// Primitive shape tags that make a group worth keying.
pub const SHAPE_TAGS: &[&str] = &[
    "path", "rect", "circle", "ellipse", "line", "polyline", "polygon", "text", "use", "image",
];

/// Style merged into the root element so the drawing scales with its container.
pub const ROOT_STYLE: &[(&str, &str)] = &[("max-width", "100%"), ("height", "auto")];

/// Style merged into every keyed element.
pub const INTERACTIVE_STYLE: &[(&str, &str)] = &[
    ("pointer-events", "auto"),
    ("cursor", "pointer"),
    ("transition", "filter 0.15s ease, outline 0.15s ease"),
];

/// Style applied to the selected element.
pub const HIGHLIGHT_STYLE: &[(&str, &str)] = &[
    ("filter", "drop-shadow(0 0 6px rgba(37, 99, 235, 0.85))"),
    ("outline", "2px solid #2563eb"),
    ("outline-offset", "2px"),
];

/// Id of the metadata node written into annotated SVG exports.
pub const METADATA_ID: &str = "svat-annotations";

/// Storage key for the persisted session.
pub const SESSION_STORAGE_KEY: &str = "svat.session.v1";

/// Number of comments quoted in an element's tooltip.
pub const TOOLTIP_COMMENT_COUNT: usize = 2;

/// Number of comments listed in an element's description.
pub const DESCRIPTION_COMMENT_COUNT: usize = 10;

/// Filename stem used when the document has no name.
pub const DEFAULT_EXPORT_STEM: &str = "annotations";
