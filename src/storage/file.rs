//! File-backed [`KeyValueStore`].
//!
//! The whole store is one JSON object on disk:
//!
//! ```json
//! {
//!   "images": "[{\"showBorders\":true, ...}]",
//!   "hb-label-template-v1": "{\"brand\": ...}"
//! }
//! ```
//!
//! Values are opaque strings, exactly as browser local storage would hold
//! them.  The file is read once on open and rewritten on every write.

use crate::traits::KeyValueStore;
use log::{debug, warn};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Errors produced by the file store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json encode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A [`KeyValueStore`] persisted as a single JSON object file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RefCell<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`.
    ///
    /// A missing file yields an empty store.  A file that cannot be parsed
    /// is logged and also treated as empty; it is overwritten on the next
    /// write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<BTreeMap<String, String>>(&text) {
                Ok(map) => {
                    debug!("opened store {} ({} keys)", path.display(), map.len());
                    map
                }
                Err(e) => {
                    warn!("store {} is corrupt ({}), starting empty", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        Ok(Self {
            path,
            entries: RefCell::new(entries),
        })
    }

    /// The filesystem path of the store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let text = serde_json::to_string_pretty(&*self.entries.borrow())?;
        std::fs::write(&self.path, text).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for JsonFileStore {
    type Error = StorageError;

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let removed = self.entries.borrow_mut().remove(key).is_some();
        if removed {
            self.flush()
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("storage.json")).unwrap();
        assert_eq!(store.get("images").unwrap(), None);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set("images", r#"[{"flipped":true}]"#).unwrap();
            store.set("other", "x").unwrap();
            store.remove("other").unwrap();
        }
        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            store.get("images").unwrap().as_deref(),
            Some(r#"[{"flipped":true}]"#)
        );
        assert_eq!(store.get("other").unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_treated_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("images").unwrap(), None);

        store.set("images", "[]").unwrap();
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("images").unwrap().as_deref(), Some("[]"));
    }
}
