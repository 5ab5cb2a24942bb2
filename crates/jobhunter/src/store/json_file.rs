//! Flat JSON collection on disk.
//!
//! The whole collection is read on every access and rewritten on every
//! mutation. Writes land in a sibling temp file first and are renamed into
//! place, so readers see either the old or the new collection.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the parent directory and an empty `[]` collection if the file is absent.
    pub fn ensure_exists(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            return Ok(());
        }
        self.ensure_parent()?;
        std::fs::write(&self.path, b"[]").map_err(|e| StoreError::Write {
            path: self.path.clone(),
            source: e,
        })?;
        debug!("Created empty collection at {}", self.path.display());
        Ok(())
    }

    /// Reads the collection, treating a missing or malformed file as empty.
    pub fn read<T: DeserializeOwned>(&self) -> Vec<T> {
        self.try_read().unwrap_or_default()
    }

    /// Reads the collection, returning `None` when the file is missing or malformed.
    pub fn try_read<T: DeserializeOwned>(&self) -> Option<Vec<T>> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_slice(&content) {
            Ok(items) => Some(items),
            Err(e) => {
                warn!(
                    "Collection at {} is malformed, treating as empty: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Reads the collection ahead of a rewrite.
    ///
    /// A missing file or one that is not JSON at all counts as empty, as in
    /// [`JsonFile::read`]. A well-formed array whose items do not decode as `T`
    /// is an error, so a caller never replaces records it failed to understand.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Vec<T>, StoreError> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let value: serde_json::Value = match serde_json::from_slice(&content) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    "Collection at {} is malformed, treating as empty: {}",
                    self.path.display(),
                    e
                );
                return Ok(Vec::new());
            }
        };

        serde_json::from_value(value).map_err(|e| StoreError::Decode {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Replaces the whole collection.
    pub fn write<T: Serialize>(&self, items: &[T]) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(items)?;
        self.ensure_parent()?;

        let tmp_path = self.tmp_path();
        std::fs::write(&tmp_path, &content).map_err(|e| StoreError::Write {
            path: tmp_path.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp_path);
            StoreError::Write {
                path: self.path.clone(),
                source: e,
            }
        })
    }

    fn ensure_parent(&self) -> Result<(), StoreError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                    path: parent.to_path_buf(),
                    source: e,
                })
            }
            _ => Ok(()),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("collection"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
