//! Inline `style` attribute handling.
//!
//! Styles are merged, never replaced: a merge overwrites declarations with
//! the same property name in place and appends the rest, leaving unrelated
//! declarations untouched. Merging the same declarations twice yields the
//! same string.

use std::fmt;

/// Parsed inline style declarations in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    /// Parse a `style` attribute value.
    ///
    /// Semicolons inside parentheses or quotes (e.g. `url(data:...;base64,...)`)
    /// do not split declarations. Declarations without a colon are dropped.
    pub fn parse(source: &str) -> Self {
        let mut declarations = Vec::new();
        for chunk in split_declarations(source) {
            let Some((property, value)) = chunk.split_once(':') else {
                continue;
            };
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            if property.is_empty() || value.is_empty() {
                continue;
            }
            declarations.push((property, value.to_string()));
        }
        Self { declarations }
    }

    /// Value of a property.
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value.as_str())
    }

    /// Set a property, keeping its position if already declared.
    pub fn set(&mut self, property: &str, value: &str) {
        match self
            .declarations
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
        {
            Some(slot) => slot.1 = value.to_string(),
            None => self
                .declarations
                .push((property.to_ascii_lowercase(), value.to_string())),
        }
    }

    /// Remove a property.
    pub fn remove(&mut self, property: &str) {
        self.declarations
            .retain(|(name, _)| !name.eq_ignore_ascii_case(property));
    }

    /// Set every declaration from `declarations`.
    pub fn merge(&mut self, declarations: &[(&str, &str)]) {
        for (property, value) in declarations {
            self.set(property, value);
        }
    }

    /// Whether there are no declarations.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl fmt::Display for InlineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (property, value)) in self.declarations.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}: {};", property, value)?;
        }
        Ok(())
    }
}

/// Merge `declarations` into an optional existing style attribute value.
pub fn merge_style(existing: Option<&str>, declarations: &[(&str, &str)]) -> String {
    let mut style = existing.map(InlineStyle::parse).unwrap_or_default();
    style.merge(declarations);
    style.to_string()
}

fn split_declarations(source: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in source.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                chunks.push(&source[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    chunks.push(&source[start..]);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let style = InlineStyle::parse("fill: red;STROKE:blue ; ;bogus");
        assert_eq!(style.get("fill"), Some("red"));
        assert_eq!(style.get("stroke"), Some("blue"));
        assert_eq!(style.to_string(), "fill: red; stroke: blue;");
    }

    #[test]
    fn test_merge_keeps_unrelated() {
        let merged = merge_style(Some("fill: red; cursor: default"), &[("cursor", "pointer")]);
        assert_eq!(merged, "fill: red; cursor: pointer;");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let decls = [("max-width", "100%"), ("height", "auto")];
        let once = merge_style(Some("width: 20px"), &decls);
        let twice = merge_style(Some(&once), &decls);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_semicolon_inside_url() {
        let style = InlineStyle::parse("background: url(data:image/png;base64,AAA); fill: red");
        assert_eq!(style.get("background"), Some("url(data:image/png;base64,AAA)"));
        assert_eq!(style.get("fill"), Some("red"));
    }

    #[test]
    fn test_merge_into_nothing() {
        assert_eq!(merge_style(None, &[("cursor", "pointer")]), "cursor: pointer;");
        assert!(InlineStyle::parse("").is_empty());
    }
}
