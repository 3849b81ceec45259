//! Export format implementations.

mod annotated_svg;
mod html_package;
mod json_dump;

#[cfg(test)]
mod tests;

pub use annotated_svg::AnnotatedSvgFormat;
pub use html_package::{HtmlPackageFormat, VIEWER_SCRIPT};
pub use json_dump::{JsonDump, JsonDumpFormat};

use crate::format::FormatWarning;

/// Report script elements dropped while sanitizing the export input.
fn warn_removed_scripts(removed: usize, warnings: &mut Vec<FormatWarning>) {
    if removed > 0 {
        warnings.push(FormatWarning::warning(format!(
            "Removed {} script element(s) from the drawing",
            removed
        )));
    }
}
