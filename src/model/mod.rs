//! Data models for SVAT.

mod annotation;

pub use annotation::{Annotation, AnnotationMap, Comment, FieldUpdate};
