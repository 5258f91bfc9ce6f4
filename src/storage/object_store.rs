//! Fast-tier object store
//!
//! Objects live as plain files under `<bucket>/objects/`, keyed by name.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::backend::StorageBackend;
use super::credentials::{authorize, Credentials};
use super::file_io::write_bytes_atomic;
use crate::error::{StashError, StashResult};
use crate::models::Tier;

const OBJECTS_DIR: &str = "objects";

/// Keyed object store rooted at a directory
#[derive(Debug)]
pub struct LocalObjectStore {
    root: PathBuf,
    container: String,
}

impl LocalObjectStore {
    /// Open the bucket at `root`, checking `credentials` against it
    pub fn open(root: impl Into<PathBuf>, credentials: &Credentials) -> StashResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(OBJECTS_DIR)).map_err(|e| {
            StashError::Storage(format!("Failed to create bucket {}: {}", root.display(), e))
        })?;
        authorize(&root, credentials)?;

        Ok(Self {
            container: root.display().to_string(),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check whether an object exists
    pub fn exists(&self, key: &str) -> StashResult<bool> {
        Ok(self.object_path(key)?.exists())
    }

    fn object_path(&self, key: &str) -> StashResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(OBJECTS_DIR).join(key))
    }
}

/// Object keys are flat file names
fn validate_key(key: &str) -> StashResult<()> {
    if key.is_empty()
        || key.contains('/')
        || key.contains('\\')
        || key.contains("..")
        || key.starts_with('.')
    {
        return Err(StashError::Validation(format!(
            "invalid object key '{}'",
            key
        )));
    }
    Ok(())
}

impl StorageBackend for LocalObjectStore {
    fn tier(&self) -> Tier {
        Tier::Fast
    }

    fn container(&self) -> &str {
        &self.container
    }

    fn put(&self, name: &str, bytes: &[u8]) -> StashResult<String> {
        let path = self.object_path(name)?;
        write_bytes_atomic(&path, bytes)?;
        debug!(key = name, size = bytes.len(), "Stored object");
        Ok(name.to_string())
    }

    fn get(&self, id: &str) -> StashResult<Vec<u8>> {
        let path = self.object_path(id)?;
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StashError::object_not_found(id),
            _ => StashError::Storage(format!("Failed to read object {}: {}", id, e)),
        })
    }

    fn delete(&self, id: &str) -> StashResult<()> {
        let path = self.object_path(id)?;
        fs::remove_file(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StashError::object_not_found(id),
            _ => StashError::Storage(format!("Failed to delete object {}: {}", id, e)),
        })?;
        debug!(key = id, "Deleted object");
        Ok(())
    }

    fn list(&self) -> StashResult<Vec<String>> {
        let dir = self.root.join(OBJECTS_DIR);
        let mut keys = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.ends_with(".tmp") {
                    keys.push(name.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> LocalObjectStore {
        LocalObjectStore::open(dir.path(), &Credentials::new("AKIA", "secret")).unwrap()
    }

    #[test]
    fn test_put_get_delete() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let id = store.put("photos.20240101000000.tgz", b"data").unwrap();
        assert_eq!(id, "photos.20240101000000.tgz");
        assert_eq!(store.get(&id).unwrap(), b"data");
        assert_eq!(store.list().unwrap(), vec![id.clone()]);

        store.delete(&id).unwrap();
        assert!(store.get(&id).unwrap_err().is_not_found());
        assert!(store.delete(&id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_put_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.put("inventory.json", b"v1").unwrap();
        store.put("inventory.json", b"v2").unwrap();
        assert_eq!(store.get("inventory.json").unwrap(), b"v2");
    }

    #[test]
    fn test_rejects_path_keys() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        for key in ["../escape", "a/b", "", ".coldstash-access"] {
            assert!(matches!(
                store.put(key, b"x"),
                Err(StashError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_list_skips_access_record() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_other_credentials_rejected() {
        let dir = TempDir::new().unwrap();
        let _ = store(&dir);
        let err = LocalObjectStore::open(dir.path(), &Credentials::new("AKIA", "nope")).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_container_is_root() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert_eq!(store.container(), dir.path().display().to_string());
        assert_eq!(store.tier(), Tier::Fast);
        assert!(store.as_cold().is_none());
    }
}
