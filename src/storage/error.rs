//! Error types for storage backends.

use thiserror::Error;

/// Errors that can occur when reading or writing persisted state.
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O error from a file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend cannot be used at all
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the write for lack of space
    #[error("Storage quota exceeded")]
    QuotaExceeded,
}
