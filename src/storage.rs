use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, trace};
use thiserror::Error;

/// Key the collection is stored under.
pub const STORAGE_KEY: &str = "linkhub-favorites";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage lock poisoned")]
    Poisoned,
}

/// A single key-value slot holding the serialized collection.
pub trait StorageBackend {
    /// `None` when nothing has been written yet.
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replaces the stored bytes wholesale.
    fn write(&self, bytes: &[u8]) -> Result<(), StorageError>;

    fn is_available(&self) -> bool {
        true
    }
}

impl<B: StorageBackend + ?Sized> StorageBackend for &B {
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).read()
    }

    fn write(&self, bytes: &[u8]) -> Result<(), StorageError> {
        (**self).write(bytes)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

/// Stores the collection as `<dir>/<key>.json`.
pub struct FileBackend {
    dir: PathBuf,
    path: PathBuf,
}

impl FileBackend {
    pub fn new<P: AsRef<Path>>(dir: P, key: &str) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let path = dir.join(format!("{}.json", key));
        FileBackend { dir, path }
    }

    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        FileBackend::new(dir, STORAGE_KEY)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StorageBackend for FileBackend {
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!("No stored favorites at {:?}", self.path);
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(|e| self.io_error(e))?;
        debug!("Read {} bytes from {:?}", contents.len(), self.path);
        Ok(Some(contents))
    }

    fn write(&self, bytes: &[u8]) -> Result<(), StorageError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(|e| self.io_error(e))?;
            debug!("Created storage directory {:?}", self.dir);
        }
        let mut file = File::create(&self.path).map_err(|e| self.io_error(e))?;
        file.write_all(bytes).map_err(|e| self.io_error(e))?;
        debug!("Wrote {} bytes to {:?}", bytes.len(), self.path);
        Ok(())
    }
}

/// In-process slot. Each instance is isolated from every other one.
#[derive(Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        MemoryBackend {
            slot: Mutex::new(Some(bytes.into())),
        }
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError> {
        let slot = self.slot.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(slot.clone())
    }

    fn write(&self, bytes: &[u8]) -> Result<(), StorageError> {
        let mut slot = self.slot.lock().map_err(|_| StorageError::Poisoned)?;
        *slot = Some(bytes.to_vec());
        Ok(())
    }
}

/// No persistence available: reads are empty, writes are dropped.
#[derive(Default, Clone, Copy)]
pub struct NullBackend;

impl StorageBackend for NullBackend {
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(None)
    }

    fn write(&self, bytes: &[u8]) -> Result<(), StorageError> {
        trace!("Discarding {} bytes, no storage backend", bytes.len());
        Ok(())
    }

    fn is_available(&self) -> bool {
        false
    }
}

// test module
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_backend_missing_file_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::in_dir(dir.path());
        assert!(backend.read().unwrap().is_none());
        assert_eq!(backend.path(), dir.path().join("linkhub-favorites.json"));
    }

    #[test]
    fn test_file_backend_creates_dir_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("nested").join("data"), "test-key");
        backend.write(b"[1]").unwrap();
        backend.write(b"[]").unwrap();
        assert_eq!(backend.read().unwrap(), Some(b"[]".to_vec()));
    }

    #[test]
    fn test_memory_backends_do_not_share_state() {
        let first = MemoryBackend::new();
        let second = MemoryBackend::new();
        first.write(b"[]").unwrap();
        assert_eq!(first.contents(), Some(b"[]".to_vec()));
        assert!(second.read().unwrap().is_none());
    }

    #[test]
    fn test_null_backend_discards_writes() {
        let backend = NullBackend;
        backend.write(b"[{\"url\":\"http://a.com\"}]").unwrap();
        assert!(backend.read().unwrap().is_none());
        assert!(!backend.is_available());
    }
}
