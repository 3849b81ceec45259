//! Export system.
//!
//! Each export format implements the [`ExportFormat`] trait. Every generator
//! re-sanitizes its input first, so callers may pass raw markup.
//!
//! ## Supported Formats
//!
//! - **HTML package**: standalone page with the drawing, the annotations and
//!   an embedded viewer script
//! - **Annotated SVG**: `<title>`/`<desc>` per annotated element plus a
//!   `<metadata>` block holding the full snapshot
//! - **JSON**: `{exportedAt, svgText, annotations}`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use svat::format::{ExportInput, FormatRegistry};
//!
//! let registry = FormatRegistry::new();
//! let format = registry.require("html")?;
//! let output = format.export(&ExportInput::new(&markup, &annotations, now_utc()));
//! ```

mod error;
pub mod formats;
mod registry;
mod traits;

pub use error::FormatError;
pub use formats::JsonDump;
pub use registry::FormatRegistry;
pub use traits::{ExportFormat, ExportInput, ExportOutput, FormatWarning, WarningSeverity};
