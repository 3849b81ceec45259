//! File-backed storage for native builds.

use std::path::{Path, PathBuf};

use super::{StorageBackend, StorageError};

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir` as the storage directory. It is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default directory under the platform data directory.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .map(|dir| dir.join("svat"))
    }

    /// Storage in [`default_dir`](Self::default_dir).
    pub fn open_default() -> Result<Self, StorageError> {
        Self::default_dir().map(Self::new).ok_or_else(|| {
            StorageError::Unavailable("could not determine a data directory".to_string())
        })
    }

    /// The storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl StorageBackend for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        // Write then rename so a crash never leaves a truncated record
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        log::trace!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("nested"));

        assert_eq!(storage.read("svat.session.v1").unwrap(), None);
        storage.write("svat.session.v1", "{}").unwrap();
        assert_eq!(storage.read("svat.session.v1").unwrap().as_deref(), Some("{}"));
        assert!(dir.path().join("nested/svat.session.v1.json").exists());

        storage.remove("svat.session.v1").unwrap();
        storage.remove("svat.session.v1").unwrap();
        assert_eq!(storage.read("svat.session.v1").unwrap(), None);
    }

    #[test]
    fn test_key_is_sanitized_for_filesystem() {
        let storage = FileStorage::new("/tmp/x");
        assert_eq!(storage.path_for("../evil/key"), PathBuf::from("/tmp/x/.._evil_key.json"));
    }
}
