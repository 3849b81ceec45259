//! Application state management modules.

mod selection;
mod session;
mod store;

pub use selection::{Selection, SelectionController};
pub use session::{LoadedDocument, Session, SessionError};
pub use store::AnnotationStore;
