//! In-memory storage backend.

use std::collections::HashMap;

use super::{StorageBackend, StorageError};

/// Storage kept in a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
    /// Writes fail with [`StorageError::QuotaExceeded`] when set.
    reject_writes: bool,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose writes always fail, as a full browser store would.
    pub fn full() -> Self {
        Self {
            values: HashMap::new(),
            reject_writes: true,
        }
    }

    /// Seed a value directly.
    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.reject_writes {
            return Err(StorageError::QuotaExceeded);
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_remove() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.read("k").unwrap(), None);
        storage.write("k", "v").unwrap();
        assert_eq!(storage.read("k").unwrap().as_deref(), Some("v"));
        storage.remove("k").unwrap();
        assert_eq!(storage.read("k").unwrap(), None);
    }

    #[test]
    fn test_full_store_rejects_writes() {
        let mut storage = MemoryStorage::full();
        assert!(matches!(
            storage.write("k", "v"),
            Err(StorageError::QuotaExceeded)
        ));
    }
}
