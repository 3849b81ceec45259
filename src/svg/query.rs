//! Selector lookup used to find elements by key.
//!
//! Only two selector forms are supported, mirroring what the browser side
//! hands to `querySelector`:
//!
//! - `#ident` where `ident` follows CSS identifier syntax, including
//!   backslash escapes (`#a\:b` matches `id="a:b"`)
//! - `[name="value"]` with a quoted or bare value
//!
//! [`css_escape`] implements the CSSOM `CSS.escape()` algorithm so any id can
//! be turned into a selector that round-trips through the parser.

use std::iter::Peekable;
use std::str::Chars;

use crate::svg::dom::{Document, Element, NodeId};
use crate::svg::error::SvgError;

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `#id`
    Id(String),
    /// `[name="value"]`
    Attribute {
        /// Attribute name
        name: String,
        /// Required value
        value: String,
    },
}

impl Selector {
    /// Parse selector text.
    pub fn parse(source: &str) -> Result<Self, SvgError> {
        let mut chars = source.trim().chars().peekable();
        let selector = match chars.next() {
            Some('#') => {
                let ident = consume_ident(&mut chars, source)?;
                if ident.is_empty() {
                    return Err(SvgError::selector(source, "empty id"));
                }
                Selector::Id(ident)
            }
            Some('[') => parse_attribute(&mut chars, source)?,
            _ => return Err(SvgError::selector(source, "expected '#' or '['")),
        };

        if let Some(rest) = chars.next() {
            return Err(SvgError::selector(
                source,
                format!("unexpected '{}'", rest),
            ));
        }
        Ok(selector)
    }

    /// Whether `element` matches.
    pub fn matches(&self, element: &Element) -> bool {
        match self {
            Selector::Id(id) => element.attribute("id") == Some(id.as_str()),
            Selector::Attribute { name, value } => {
                element.attribute(name) == Some(value.as_str())
            }
        }
    }
}

impl Document {
    /// First element in document order matching `selector`, root included.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SvgError> {
        let selector = Selector::parse(selector)?;
        Ok(self.elements().into_iter().find(|&id| {
            self.element(id)
                .is_some_and(|element| selector.matches(element))
        }))
    }
}

/// Escape a string for use as a CSS identifier (CSSOM `CSS.escape`).
pub fn css_escape(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());

    for (i, &c) in chars.iter().enumerate() {
        let code = c as u32;
        if c == '\0' {
            out.push('\u{FFFD}');
        } else if (0x01..=0x1F).contains(&code)
            || code == 0x7F
            || (i == 0 && c.is_ascii_digit())
            || (i == 1 && c.is_ascii_digit() && chars[0] == '-')
        {
            out.push_str(&format!("\\{:x} ", code));
        } else if i == 0 && c == '-' && chars.len() == 1 {
            out.push_str("\\-");
        } else if code >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// Build an id selector for an arbitrary id.
pub fn id_selector(id: &str) -> String {
    format!("#{}", css_escape(id))
}

/// Build an attribute-equals selector with a quoted value.
pub fn attribute_selector(name: &str, value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    format!("[{}=\"{}\"]", name, quoted)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c as u32 >= 0x80
}

fn consume_ident(chars: &mut Peekable<Chars<'_>>, source: &str) -> Result<String, SvgError> {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if c == '\\' {
            chars.next();
            ident.push(consume_escape(chars, source)?);
        } else if is_ident_char(c) {
            ident.push(c);
            chars.next();
        } else {
            break;
        }
    }
    Ok(ident)
}

/// Consume the part of an escape sequence after the backslash.
fn consume_escape(chars: &mut Peekable<Chars<'_>>, source: &str) -> Result<char, SvgError> {
    let Some(&first) = chars.peek() else {
        return Ok('\u{FFFD}');
    };

    if first == '\n' {
        return Err(SvgError::selector(source, "escaped newline"));
    }

    if !first.is_ascii_hexdigit() {
        chars.next();
        return Ok(first);
    }

    let mut hex = String::new();
    while hex.len() < 6 {
        match chars.peek() {
            Some(&c) if c.is_ascii_hexdigit() => {
                hex.push(c);
                chars.next();
            }
            _ => break,
        }
    }
    // A single whitespace terminates a hex escape
    if matches!(chars.peek(), Some(' ' | '\t' | '\n')) {
        chars.next();
    }

    let code = u32::from_str_radix(&hex, 16).unwrap_or(0xFFFD);
    Ok(match char::from_u32(code) {
        Some('\0') | None => '\u{FFFD}',
        Some(c) => c,
    })
}

fn parse_attribute(chars: &mut Peekable<Chars<'_>>, source: &str) -> Result<Selector, SvgError> {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if is_ident_char(c) || c == ':' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if name.is_empty() {
        return Err(SvgError::selector(source, "empty attribute name"));
    }
    if chars.next() != Some('=') {
        return Err(SvgError::selector(source, "expected '='"));
    }

    let value = match chars.peek().copied() {
        Some(quote @ ('"' | '\'')) => {
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some(c) if c == quote => break,
                    Some('\\') => value.push(consume_escape(chars, source)?),
                    Some(c) => value.push(c),
                    None => return Err(SvgError::selector(source, "unterminated string")),
                }
            }
            value
        }
        _ => consume_ident(chars, source)?,
    };

    if chars.next() != Some(']') {
        return Err(SvgError::selector(source, "expected ']'"));
    }
    Ok(Selector::Attribute { name, value })
}
