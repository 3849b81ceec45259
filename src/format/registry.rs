//! Format registry for discovering and accessing export formats.

use crate::format::error::FormatError;
use crate::format::formats::{AnnotatedSvgFormat, HtmlPackageFormat, JsonDumpFormat};
use crate::format::traits::ExportFormat;

/// Registry of available export formats.
///
/// All built-in formats are registered automatically on creation, in the
/// order they are offered to the user.
pub struct FormatRegistry {
    formats: Vec<Box<dyn ExportFormat>>,
}

impl FormatRegistry {
    /// Id of the format used when none is chosen.
    pub const DEFAULT_ID: &'static str = "html";

    /// Create a new registry with all built-in formats registered.
    pub fn new() -> Self {
        let mut registry = Self {
            formats: Vec::new(),
        };

        registry.register(Box::new(HtmlPackageFormat));
        registry.register(Box::new(AnnotatedSvgFormat));
        registry.register(Box::new(JsonDumpFormat));

        registry
    }

    /// Register a format implementation, replacing one with the same id.
    pub fn register(&mut self, format: Box<dyn ExportFormat>) {
        self.formats.retain(|f| f.id() != format.id());
        self.formats.push(format);
    }

    /// Get a format by its ID.
    pub fn get(&self, id: &str) -> Option<&dyn ExportFormat> {
        self.formats
            .iter()
            .find(|f| f.id() == id)
            .map(|f| f.as_ref())
    }

    /// Get a format by its ID, as an error if unknown.
    pub fn require(&self, id: &str) -> Result<&dyn ExportFormat, FormatError> {
        self.get(id)
            .ok_or_else(|| FormatError::UnknownFormat(id.to_string()))
    }

    /// Find a format by its filename extension (e.g. "svg" or "annotated.svg").
    pub fn by_extension(&self, ext: &str) -> Option<&dyn ExportFormat> {
        let ext = ext.trim_start_matches('.');
        self.formats
            .iter()
            .find(|f| f.extension() == ext || f.extension().ends_with(&format!(".{}", ext)))
            .map(|f| f.as_ref())
    }

    /// Get all format IDs.
    pub fn ids(&self) -> Vec<&'static str> {
        self.formats.iter().map(|f| f.id()).collect()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_formats() {
        let registry = FormatRegistry::new();

        assert!(registry.get("html").is_some());
        assert!(registry.get("svg").is_some());
        assert!(registry.get("json").is_some());
        assert!(registry.get(FormatRegistry::DEFAULT_ID).is_some());
        assert_eq!(registry.ids(), vec!["html", "svg", "json"]);
    }

    #[test]
    fn test_unknown_format() {
        let registry = FormatRegistry::new();
        assert!(matches!(
            registry.require("pdf"),
            Err(FormatError::UnknownFormat(id)) if id == "pdf"
        ));
    }

    #[test]
    fn test_by_extension() {
        let registry = FormatRegistry::new();
        assert_eq!(registry.by_extension("svg").map(|f| f.id()), Some("svg"));
        assert_eq!(registry.by_extension(".html").map(|f| f.id()), Some("html"));
        assert_eq!(
            registry.by_extension("annotations.json").map(|f| f.id()),
            Some("json")
        );
        assert!(registry.by_extension("png").is_none());
    }
}
