//! Object storage collaborators.
//!
//! The pipeline only needs three calls: `get`, `exists` and `put`. Two
//! backends ship here: an in-memory map for tests and embedding, and a
//! directory tree (`<root>/<container>/<path>`) for local runs.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use obf_common::SourceLocator;

/// Errors from storage backends.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object '{path}' not found in container '{container}'")]
    NotFound { container: String, path: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("object path '{0}' escapes the storage root")]
    InvalidPath(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    fn not_found(locator: &SourceLocator) -> Self {
        StorageError::NotFound {
            container: locator.container().to_string(),
            path: locator.path().to_string(),
        }
    }
}

impl From<StorageError> for obf_common::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { container, path } => {
                obf_common::Error::SourceNotFound { container, path }
            }
            other => obf_common::Error::Storage(other.to_string()),
        }
    }
}

/// Minimal object-store interface used by the pipeline.
pub trait ObjectStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Fetch an object. A missing object is [`StorageError::NotFound`].
    fn get(&self, locator: &SourceLocator) -> Result<Vec<u8>, StorageError>;

    fn exists(&self, locator: &SourceLocator) -> Result<bool, StorageError>;

    /// Create or replace an object.
    fn put(&self, locator: &SourceLocator, bytes: &[u8]) -> Result<(), StorageError>;
}

impl<T: ObjectStore + ?Sized> ObjectStore for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn get(&self, locator: &SourceLocator) -> Result<Vec<u8>, StorageError> {
        (**self).get(locator)
    }

    fn exists(&self, locator: &SourceLocator) -> Result<bool, StorageError> {
        (**self).exists(locator)
    }

    fn put(&self, locator: &SourceLocator, bytes: &[u8]) -> Result<(), StorageError> {
        (**self).put(locator, bytes)
    }
}

impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn get(&self, locator: &SourceLocator) -> Result<Vec<u8>, StorageError> {
        (**self).get(locator)
    }

    fn exists(&self, locator: &SourceLocator) -> Result<bool, StorageError> {
        (**self).exists(locator)
    }

    fn put(&self, locator: &SourceLocator, bytes: &[u8]) -> Result<(), StorageError> {
        (**self).put(locator, bytes)
    }
}

/// In-memory object store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<SourceLocator, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object.
    pub fn insert(&self, locator: &SourceLocator, bytes: impl Into<Vec<u8>>) -> Result<(), StorageError> {
        self.put(locator, &bytes.into())
    }

    /// Snapshot of an object's bytes.
    pub fn object(&self, locator: &SourceLocator) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(locator).cloned())
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<SourceLocator, Vec<u8>>>, StorageError> {
        self.objects
            .lock()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".to_string()))
    }
}

impl ObjectStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, locator: &SourceLocator) -> Result<Vec<u8>, StorageError> {
        self.lock()?
            .get(locator)
            .cloned()
            .ok_or_else(|| StorageError::not_found(locator))
    }

    fn exists(&self, locator: &SourceLocator) -> Result<bool, StorageError> {
        Ok(self.lock()?.contains_key(locator))
    }

    fn put(&self, locator: &SourceLocator, bytes: &[u8]) -> Result<(), StorageError> {
        self.lock()?.insert(locator.clone(), bytes.to_vec());
        Ok(())
    }
}

/// Directory-backed object store: `<root>/<container>/<path>`.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for a locator. Rejects `..` and absolute segments.
    pub fn object_path(&self, locator: &SourceLocator) -> Result<PathBuf, StorageError> {
        let relative = Path::new(locator.path());
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe {
            return Err(StorageError::InvalidPath(locator.path().to_string()));
        }
        Ok(self.root.join(locator.container()).join(relative))
    }
}

impl ObjectStore for FsStore {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn get(&self, locator: &SourceLocator) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(locator)?;
        fs::read(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => StorageError::not_found(locator),
            _ => StorageError::Io { path, source },
        })
    }

    fn exists(&self, locator: &SourceLocator) -> Result<bool, StorageError> {
        Ok(self.object_path(locator)?.is_file())
    }

    fn put(&self, locator: &SourceLocator, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.object_path(locator)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        // Write beside the target, then rename into place.
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| StorageError::InvalidPath(locator.path().to_string()))?;
        let temp_path = path.with_file_name(format!(
            ".{}.{}.tmp",
            file_name,
            &uuid::Uuid::new_v4().simple().to_string()[..12]
        ));
        fs::write(&temp_path, bytes).map_err(|source| StorageError::Io {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &path).map_err(|source| {
            let _ = fs::remove_file(&temp_path);
            StorageError::Io {
                path: path.clone(),
                source,
            }
        })
    }
}
