//! SVAT - SVG Annotation Tool
//!
//! Load an SVG drawing, click its elements, attach a label, notes and a
//! comment thread to each, and export the result as a standalone HTML
//! page, an SVG with embedded metadata, or a JSON dump.
//!
//! The pipeline:
//!
//! - [`svg`] parses and sanitizes the upload and gives every annotatable
//!   element a key
//! - [`state`] holds the [`Session`](state::Session): document, annotation
//!   store and selection, persisted through [`storage`] after every change
//! - [`format`] turns a session snapshot into one of the export formats
//! - [`delivery`] hands the export to the user (file, clipboard, preview)
//!
//! The same library backs the native CLI and the browser build (`wasm`).

pub mod clock;
pub mod config;
pub mod constants;
pub mod delivery;
pub mod format;
pub mod model;
pub mod state;
pub mod storage;
pub mod svg;

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
