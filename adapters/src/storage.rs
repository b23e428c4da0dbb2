//! File-backed key/value client storage.
//!
//! The whole map lives in one JSON object on disk and is rewritten on every
//! change. Writes go to a sibling temp file first and are renamed into place;
//! the in-memory copy only changes once that succeeds.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use corelib::storage::{KeyValueStore, StorageError};
use parking_lot::Mutex;
use tracing::{debug, warn};

pub struct FileKeyValueStore {
    path: PathBuf,
    cache: Mutex<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    /// Opens `path`, starting empty if it does not exist yet. A corrupt file is
    /// logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let cache = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "client storage is corrupt; starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), keys = cache.len(), "client storage opened");
        Ok(Self {
            path,
            cache: Mutex::new(cache),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.cache.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut cache = self.cache.lock();
        let mut next = cache.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *cache = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut cache = self.cache.lock();
        if !cache.contains_key(key) {
            return Ok(());
        }
        let mut next = cache.clone();
        next.remove(key);
        self.flush(&next)?;
        *cache = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("signaldesk-kv-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir.join("state.json")
    }

    #[test]
    fn values_survive_reopen() {
        let path = scratch("reopen");
        {
            let store = FileKeyValueStore::open(&path).unwrap();
            store.set("theme", "light").unwrap();
            store.set("welcome", "true").unwrap();
            store.remove("welcome").unwrap();
        }

        let store = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("light"));
        assert_eq!(store.get("welcome").unwrap(), None);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let path = scratch("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        let store = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(store.get("theme").unwrap(), None);
    }

    #[test]
    fn failed_flush_keeps_cache_in_step_with_disk() {
        let path = scratch("blocked");
        let store = FileKeyValueStore::open(&path).unwrap();
        store.set("theme", "light").unwrap();

        // A directory where the temp file should go makes every write fail.
        let tmp = path.with_extension("tmp");
        fs::create_dir_all(&tmp).unwrap();

        assert!(store.set("theme", "dark").is_err());
        assert!(store.remove("theme").is_err());
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("light"));

        fs::remove_dir_all(&tmp).unwrap();
        let reopened = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(reopened.get("theme").unwrap().as_deref(), Some("light"));
    }
}
