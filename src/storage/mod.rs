//! Durable key-value storage for session state.
//!
//! The session is written as one JSON record under
//! [`SESSION_STORAGE_KEY`](crate::constants::SESSION_STORAGE_KEY). Backends:
//!
//! - [`MemoryStorage`]: in-process, used by tests and as a fallback
//! - [`FileStorage`]: one file per key in a directory (native only)
//! - [`LocalStorage`]: the browser's `localStorage` (WASM only)

mod error;
#[cfg(not(target_arch = "wasm32"))]
mod file;
#[cfg(target_arch = "wasm32")]
mod local;
mod memory;
mod persisted;

pub use error::StorageError;
#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use persisted::PersistedSession;

/// A string key-value store.
pub trait StorageBackend {
    /// Read a value. `Ok(None)` when the key is absent.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing an absent key succeeds.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for Box<B> {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).write(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}
