//! Error types for SVG parsing and querying.

use thiserror::Error;

/// Errors that can occur while reading, querying or writing SVG markup.
#[derive(Error, Debug)]
pub enum SvgError {
    /// Underlying XML parse or write failure
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The document parsed but contains no `<svg>` element
    #[error("No <svg> root element found")]
    MissingRoot,

    /// The markup is not well formed
    #[error("Malformed SVG: {message}")]
    Malformed {
        /// Description of the problem
        message: String,
    },

    /// A selector could not be parsed
    #[error("Invalid selector '{selector}': {message}")]
    Selector {
        /// The selector text
        selector: String,
        /// Why it was rejected
        message: String,
    },

    /// Serialized output was not valid UTF-8
    #[error("Serialized SVG is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl SvgError {
    /// Create a malformed-markup error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Create a selector error.
    pub fn selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.into(),
        }
    }
}
