//! Flat-file blob storage for chat state
//!
//! Every persisted object (the chat catalog and the per-chat session logs)
//! is one JSON blob stored under a well-known key. Keys map to files in a
//! single data directory; writes always replace the whole blob.

use crate::error::{Result, XzchatError};
use anyhow::Context;
use directories::ProjectDirs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Minimal key-to-bytes storage interface
///
/// A missing blob is reported as `Ok(None)` from [`Store::get`]; it is the
/// only storage condition callers handle specially. All other failures are
/// errors.
pub trait Store: Send + Sync {
    /// Fetch the blob stored under `key`
    ///
    /// # Returns
    ///
    /// `Some(bytes)` when the blob exists, `None` when it was never written.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Create or completely overwrite the blob stored under `key`
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;
}

/// Storage backend keeping one file per key under a root directory
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a new storage instance
    ///
    /// Resolves the root from the `XZCHAT_DATA_DIR` environment variable
    /// when set, otherwise the platform data directory. The directory is
    /// created if it does not exist.
    pub fn new() -> Result<Self> {
        // Allow override of the data directory via environment variable.
        // This makes it easy to point the binary at a test directory without
        // changing the user's application data dir.
        if let Ok(override_dir) = std::env::var("XZCHAT_DATA_DIR") {
            return Self::new_with_path(override_dir);
        }

        let proj_dirs = ProjectDirs::from("com", "xbcsmith", "xzchat")
            .ok_or_else(|| XzchatError::Storage("Could not determine data directory".into()))?;

        Self::new_with_path(proj_dirs.data_dir())
    }

    /// Create a new storage instance rooted at the specified directory.
    ///
    /// This is primarily useful for tests where the default application data
    /// directory is not desirable (for example, using a temporary directory).
    ///
    /// # Examples
    ///
    /// ```
    /// use xzchat::storage::FileStore;
    ///
    /// let store = FileStore::new_with_path("/tmp/xzchat_doctest").unwrap();
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(root: P) -> Result<Self> {
        let root = root.into();

        std::fs::create_dir_all(&root)
            .context("Failed to create data directory")
            .map_err(|e| XzchatError::Storage(e.to_string()))?;

        tracing::debug!("Using data directory {}", root.display());
        Ok(Self { root })
    }

    /// The directory holding the blob files
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match std::fs::read(self.blob_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(XzchatError::Storage(format!("Failed to read blob '{}': {}", key, e)).into())
            }
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        std::fs::write(self.blob_path(key), value)
            .map_err(|e| XzchatError::Storage(format!("Failed to write blob '{}': {}", key, e)))?;
        tracing::debug!("Wrote {} bytes to blob '{}'", value.len(), key);
        Ok(())
    }
}
