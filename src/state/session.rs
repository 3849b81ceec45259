//! The application session.
//!
//! [`Session`] owns everything the editor works on: the loaded document,
//! the annotation store, the selection and the storage backend. All
//! mutations go through it, and each one that changes the store is
//! followed by a wholesale write of the document text and annotations.
//! Write failures are logged and otherwise ignored; the in-memory state
//! stays authoritative.

use thiserror::Error;

use crate::clock::now_utc;
use crate::format::{ExportFormat, ExportInput, ExportOutput, FormatError, FormatRegistry};
use crate::model::{Annotation, AnnotationMap, Comment, FieldUpdate};
use crate::state::selection::{Selection, SelectionController};
use crate::state::store::AnnotationStore;
use crate::storage::{PersistedSession, StorageBackend};
use crate::svg::{Document, KeyStrategy, NodeId, SvgError, SvgSurface, sanitize_document};

/// Errors returned by session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The operation needs a loaded document
    #[error("No SVG document is loaded")]
    NoDocument,

    /// The operation needs a selected element
    #[error("No element is selected")]
    NothingSelected,

    /// No element of the loaded document has this key
    #[error("No element with key '{0}'")]
    UnknownKey(String),

    /// The uploaded text is not a usable SVG
    #[error("Invalid SVG: {0}")]
    Svg(#[from] SvgError),

    /// Export format lookup failed
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// A sanitized document ready for annotation.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Uploaded file name.
    pub name: Option<String>,
    /// Sanitized markup, without any highlight.
    pub markup: String,
    /// Rendered document that selection operates on.
    pub document: Document,
    /// Keys of interactive elements in document order.
    pub keys: Vec<String>,
    /// How the keys were obtained.
    pub strategy: KeyStrategy,
}

impl LoadedDocument {
    /// Sanitize `raw` into a loaded document.
    pub fn from_svg(name: Option<&str>, raw: &str) -> Result<Self, SvgError> {
        let (document, report) = sanitize_document(raw)?;
        let markup = document.serialize()?;
        Ok(Self {
            name: name.map(str::to_string),
            markup,
            document,
            keys: report.keys,
            strategy: report.strategy,
        })
    }

    /// Whether an element has this key.
    pub fn has_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

/// Explicit application state.
pub struct Session<B: StorageBackend> {
    storage: B,
    document: Option<LoadedDocument>,
    store: AnnotationStore,
    selection: SelectionController,
    persist_failed: bool,
}

impl<B: StorageBackend> Session<B> {
    /// Create an empty session that writes to `storage`.
    pub fn new(storage: B) -> Self {
        Self {
            storage,
            document: None,
            store: AnnotationStore::new(),
            selection: SelectionController::new(),
            persist_failed: false,
        }
    }

    /// Create a session from the record saved in `storage`, if any.
    ///
    /// An unreadable record or a saved document that no longer sanitizes
    /// is dropped; saved annotations are kept either way.
    pub fn restore(storage: B) -> Self {
        let mut session = Self::new(storage);
        let Some(saved) = PersistedSession::load(&session.storage) else {
            log::debug!("No saved session");
            return session;
        };

        if !saved.svg_text.trim().is_empty() {
            match LoadedDocument::from_svg(saved.name.as_deref(), &saved.svg_text) {
                Ok(document) => session.document = Some(document),
                Err(e) => log::warn!("Discarding saved document: {}", e),
            }
        }
        session.store.replace_all(saved.annotations);

        log::info!(
            "Restored session: {} annotation(s), document {}",
            session.store.len(),
            if session.document.is_some() { "loaded" } else { "absent" }
        );
        session
    }

    /// Replace the document.
    ///
    /// Selection and annotations are reset before the new document is
    /// installed. On error the session is left untouched.
    pub fn load_svg(&mut self, name: Option<&str>, raw: &str) -> Result<&LoadedDocument, SessionError> {
        let loaded = LoadedDocument::from_svg(name, raw)?;
        log::info!(
            "Loaded {} with {} interactive element(s)",
            name.unwrap_or("SVG"),
            loaded.keys.len()
        );

        self.selection.reset();
        self.store.clear_all();
        self.persist_with(&loaded);
        Ok(self.document.insert(loaded))
    }

    /// The loaded document.
    pub fn document(&self) -> Option<&LoadedDocument> {
        self.document.as_ref()
    }

    /// The loaded document, or [`SessionError::NoDocument`].
    pub fn require_document(&self) -> Result<&LoadedDocument, SessionError> {
        self.document.as_ref().ok_or(SessionError::NoDocument)
    }

    /// Fail with [`SessionError::UnknownKey`] unless the document has `key`.
    pub fn require_key(&self, key: &str) -> Result<(), SessionError> {
        if self.require_document()?.has_key(key) {
            Ok(())
        } else {
            Err(SessionError::UnknownKey(key.to_string()))
        }
    }

    /// Every annotation.
    pub fn annotations(&self) -> &AnnotationMap {
        self.store.snapshot()
    }

    /// Annotation for `key`, empty if none.
    pub fn annotation(&self, key: &str) -> Annotation {
        self.store.get(key)
    }

    /// Current selection.
    pub fn selection(&self) -> &Selection {
        self.selection.state()
    }

    /// Selected key, if any.
    pub fn selected_key(&self) -> Option<&str> {
        self.selection.selected_key()
    }

    /// Whether the last write to storage failed.
    pub fn persist_failed(&self) -> bool {
        self.persist_failed
    }

    /// The storage backend.
    pub fn storage(&self) -> &B {
        &self.storage
    }

    // Selection

    /// Click on a node of the loaded document.
    pub fn click(&mut self, target: NodeId) -> Option<String> {
        let document = &mut self.document.as_mut()?.document;
        self.selection.click(document, &target)
    }

    /// Select by key in the loaded document.
    pub fn select_key(&mut self, key: &str) -> Result<(), SessionError> {
        let document = &mut self
            .document
            .as_mut()
            .ok_or(SessionError::NoDocument)?
            .document;
        if self.selection.select(document, key) {
            Ok(())
        } else {
            Err(SessionError::UnknownKey(key.to_string()))
        }
    }

    /// Return to idle.
    pub fn deselect(&mut self) {
        if let Some(loaded) = self.document.as_mut() {
            self.selection.deselect(&mut loaded.document);
        } else {
            self.selection.reset();
        }
    }

    /// Click on a node of another rendering of the loaded document.
    pub fn click_on<S: SvgSurface>(&mut self, surface: &mut S, target: &S::Node) -> Option<String> {
        self.selection.click(surface, target)
    }

    /// Select by key on another rendering of the loaded document.
    pub fn select_on<S: SvgSurface>(&mut self, surface: &mut S, key: &str) -> bool {
        self.selection.select(surface, key)
    }

    /// Return to idle on another rendering of the loaded document.
    pub fn deselect_on<S: SvgSurface>(&mut self, surface: &mut S) {
        self.selection.deselect(surface);
    }

    // Annotation edits

    /// Update title and notes of `key`. Returns whether anything changed.
    pub fn set_fields(&mut self, key: &str, update: FieldUpdate) -> bool {
        let changed = self.store.set_fields(key, update);
        if changed {
            self.persist();
        }
        changed
    }

    /// Update title and notes of the selected element.
    pub fn set_selected_fields(&mut self, update: FieldUpdate) -> Result<bool, SessionError> {
        let key = self.selected_owned()?;
        Ok(self.set_fields(&key, update))
    }

    /// Append a comment to `key`. Blank text is ignored.
    pub fn append_comment(&mut self, key: &str, text: &str) -> Option<Comment> {
        let comment = self.store.append_comment(key, text)?;
        self.persist();
        Some(comment)
    }

    /// Append a comment to the selected element.
    pub fn append_selected_comment(&mut self, text: &str) -> Result<Option<Comment>, SessionError> {
        let key = self.selected_owned()?;
        Ok(self.append_comment(&key, text))
    }

    /// Delete one comment. Returns whether it existed.
    pub fn delete_comment(&mut self, key: &str, comment_id: &str) -> bool {
        let removed = self.store.delete_comment(key, comment_id);
        if removed {
            self.persist();
        }
        removed
    }

    /// Remove every annotation.
    pub fn clear_all(&mut self) -> bool {
        let had_any = !self.store.is_empty();
        self.store.clear_all();
        self.persist();
        had_any
    }

    // Export

    /// Export the loaded document and annotations with `format`.
    ///
    /// Markup and annotations are read together from the current state.
    pub fn export(&self, format: &dyn ExportFormat) -> Result<ExportOutput, SessionError> {
        let loaded = self.require_document()?;
        let input = ExportInput::new(&loaded.markup, self.store.snapshot(), now_utc())
            .with_name(loaded.name.as_deref());
        Ok(format.export(&input))
    }

    /// Export with the format registered under `id`.
    pub fn export_as(&self, registry: &FormatRegistry, id: &str) -> Result<ExportOutput, SessionError> {
        let format = registry.require(id)?;
        self.export(format)
    }

    fn selected_owned(&self) -> Result<String, SessionError> {
        self.selection
            .selected_key()
            .map(str::to_string)
            .ok_or(SessionError::NothingSelected)
    }

    fn persist(&mut self) {
        let record = PersistedSession::new(
            self.document.as_ref().and_then(|d| d.name.clone()),
            self.document
                .as_ref()
                .map(|d| d.markup.clone())
                .unwrap_or_default(),
            self.store.snapshot().clone(),
        );
        self.write(&record);
    }

    fn persist_with(&mut self, loaded: &LoadedDocument) {
        let record = PersistedSession::new(
            loaded.name.clone(),
            loaded.markup.clone(),
            self.store.snapshot().clone(),
        );
        self.write(&record);
    }

    fn write(&mut self, record: &PersistedSession) {
        match record.save(&mut self.storage) {
            Ok(()) => self.persist_failed = false,
            Err(e) => {
                log::warn!("Failed to save session, continuing in memory: {}", e);
                self.persist_failed = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SESSION_STORAGE_KEY;
    use crate::format::JsonDump;
    use crate::storage::MemoryStorage;

    const ICONS: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><g id="iconA"><g><path d="M0 0h4v4z"/></g></g><g id="iconB"><rect width="4" height="4"/></g></svg>"#;

    fn first_named(session: &Session<MemoryStorage>, name: &str) -> NodeId {
        let doc = &session.document().unwrap().document;
        doc.elements()
            .into_iter()
            .find(|&id| doc.element(id).unwrap().local_name() == name)
            .unwrap()
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut session = Session::new(MemoryStorage::new());
        session.load_svg(Some("icons.svg"), ICONS).unwrap();

        let path = first_named(&session, "path");
        assert_eq!(session.click(path).as_deref(), Some("iconA"));

        assert!(session
            .set_selected_fields(FieldUpdate::new().title("Gear").description("Settings icon"))
            .unwrap());
        session.append_selected_comment("needs review").unwrap();

        let output = session.export_as(&FormatRegistry::new(), "json").unwrap();
        assert_eq!(output.filename, "icons.annotations.json");
        let dump = JsonDump::from_json(&output.content).unwrap();

        let icon = &dump.annotations["iconA"];
        assert_eq!(icon.title, "Gear");
        assert_eq!(icon.description, "Settings icon");
        assert_eq!(icon.comments.len(), 1);
        assert_eq!(icon.comments[0].text, "needs review");
        assert!(!dump.annotations.contains_key("iconB"));
    }

    #[test]
    fn test_every_change_is_persisted() {
        let mut session = Session::new(MemoryStorage::new());
        session.load_svg(None, ICONS).unwrap();
        session.set_fields("iconB", FieldUpdate::new().title("Box"));

        let saved = PersistedSession::load(session.storage()).unwrap();
        assert_eq!(saved.annotations["iconB"].title, "Box");
        assert_eq!(saved.svg_text, session.document().unwrap().markup);

        session.clear_all();
        let saved = PersistedSession::load(session.storage()).unwrap();
        assert!(saved.annotations.is_empty());
    }

    #[test]
    fn test_highlight_is_not_persisted() {
        let mut session = Session::new(MemoryStorage::new());
        session.load_svg(None, ICONS).unwrap();
        session.select_key("iconA").unwrap();
        session.set_fields("iconA", FieldUpdate::new().title("Gear"));

        let saved = PersistedSession::load(session.storage()).unwrap();
        assert!(!saved.svg_text.contains("drop-shadow"));
    }

    #[test]
    fn test_restore_round_trip() {
        let mut session = Session::new(MemoryStorage::new());
        session.load_svg(Some("icons.svg"), ICONS).unwrap();
        session.append_comment("iconA", "hello");

        let restored = Session::restore(session.storage().clone());
        assert_eq!(restored.annotations(), session.annotations());
        assert_eq!(
            restored.document().unwrap().markup,
            session.document().unwrap().markup
        );
        assert_eq!(restored.document().unwrap().name.as_deref(), Some("icons.svg"));
        assert_eq!(restored.selection(), &Selection::Idle);
    }

    #[test]
    fn test_restore_ignores_garbage() {
        let storage = MemoryStorage::new().with_value(SESSION_STORAGE_KEY, "{broken");
        let session = Session::restore(storage);
        assert!(session.document().is_none());
        assert!(session.annotations().is_empty());
    }

    #[test]
    fn test_loading_resets_selection_and_annotations() {
        let mut session = Session::new(MemoryStorage::new());
        session.load_svg(None, ICONS).unwrap();
        session.select_key("iconA").unwrap();
        session.set_fields("iconA", FieldUpdate::new().title("Gear"));

        session.load_svg(None, "<svg><rect/></svg>").unwrap();
        assert_eq!(session.selection(), &Selection::Idle);
        assert!(session.annotations().is_empty());
        assert_eq!(session.document().unwrap().keys, vec!["svat-0"]);
    }

    #[test]
    fn test_bad_upload_leaves_state_untouched() {
        let mut session = Session::new(MemoryStorage::new());
        session.load_svg(None, ICONS).unwrap();
        session.select_key("iconA").unwrap();
        session.set_fields("iconA", FieldUpdate::new().title("Gear"));

        assert!(matches!(
            session.load_svg(None, "<html/>"),
            Err(SessionError::Svg(SvgError::MissingRoot))
        ));
        assert_eq!(session.selected_key(), Some("iconA"));
        assert_eq!(session.annotation("iconA").title, "Gear");
        assert!(session.document().unwrap().has_key("iconB"));
    }

    #[test]
    fn test_storage_failure_is_swallowed() {
        let mut session = Session::new(MemoryStorage::full());
        session.load_svg(None, ICONS).unwrap();
        assert!(session.persist_failed());

        assert!(session.set_fields("iconA", FieldUpdate::new().title("Gear")));
        assert!(session.append_comment("iconA", "still works").is_some());
        assert_eq!(session.annotation("iconA").comments.len(), 1);
        assert!(PersistedSession::load(session.storage()).is_none());
    }

    #[test]
    fn test_selected_edits_need_selection() {
        let mut session = Session::new(MemoryStorage::new());
        assert!(matches!(
            session.set_selected_fields(FieldUpdate::new().title("x")),
            Err(SessionError::NothingSelected)
        ));
        assert!(matches!(session.select_key("a"), Err(SessionError::NoDocument)));
        assert!(matches!(
            session.export_as(&FormatRegistry::new(), "json"),
            Err(SessionError::NoDocument)
        ));
    }

    #[test]
    fn test_key_validation() {
        let mut session = Session::new(MemoryStorage::new());
        session.load_svg(None, ICONS).unwrap();
        assert!(session.require_key("iconA").is_ok());
        assert!(matches!(
            session.require_key("nope"),
            Err(SessionError::UnknownKey(key)) if key == "nope"
        ));
        assert!(matches!(
            session.select_key("nope"),
            Err(SessionError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_blank_comment_is_not_written() {
        let mut session = Session::new(MemoryStorage::new());
        session.load_svg(None, ICONS).unwrap();
        assert!(session.append_comment("iconA", "   ").is_none());
        assert!(session.annotation("iconA").comments.is_empty());
        assert!(!session.annotations().contains_key("iconA"));
    }

    #[test]
    fn test_delete_comment_through_session() {
        let mut session = Session::new(MemoryStorage::new());
        session.load_svg(None, ICONS).unwrap();
        let comment = session.append_comment("iconA", "one").unwrap();
        assert!(session.delete_comment("iconA", &comment.id));
        assert!(!session.delete_comment("iconA", &comment.id));

        let saved = PersistedSession::load(session.storage()).unwrap();
        assert!(saved.annotations["iconA"].comments.is_empty());
    }
}
