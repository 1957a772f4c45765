//! Key-value stores backing settings persistence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::Value;
use tracing::{debug, warn};

use crate::SettingsError;

/// Minimal JSON key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError>;
}

/// Store kept entirely in memory. Used in tests and as a last resort when
/// no file location is available.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self.values.read().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.values.write().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

/// Store persisted as a single JSON object on disk.
///
/// Values are cached in memory and the whole file is rewritten on every
/// `set`.
pub struct JsonFileStore {
    path: PathBuf,
    values: RwLock<serde_json::Map<String, Value>>,
}

impl JsonFileStore {
    /// Opens a store, loading existing values from disk.
    ///
    /// A file that is not a JSON object is logged and treated as empty; the
    /// next `set` replaces it. Read failures are errors.
    pub fn open(path: PathBuf) -> Result<Self, SettingsError> {
        let values = load_values(&path)?;
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), SettingsError> {
        let map = self.values.read().unwrap();
        let json = serde_json::to_string_pretty(&*map)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        debug!("persisted {} key(s) to {:?}", map.len(), self.path);
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self.values.read().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        {
            let mut map = self.values.write().unwrap();
            map.insert(key.to_string(), value);
        }
        self.persist()
    }
}

fn load_values(path: &Path) -> Result<serde_json::Map<String, Value>, SettingsError> {
    if !path.exists() {
        return Ok(serde_json::Map::new());
    }
    let data = std::fs::read_to_string(path)?;
    match serde_json::from_str::<serde_json::Map<String, Value>>(&data) {
        Ok(values) => {
            debug!("loaded {} key(s) from {:?}", values.len(), path);
            Ok(values)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "settings file is corrupt, starting empty");
            Ok(serde_json::Map::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("k").unwrap().is_none());
        store.set("k", json!({"a": 1})).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(json!({"a": 1})));
    }

    #[test]
    fn file_store_persists_and_reloads() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("settings.json");

        {
            let store = JsonFileStore::open(path.clone()).unwrap();
            store.set("globalSettings", json!({"photo": {}})).unwrap();
            store.set("itemOverrides", json!([["a", {}]])).unwrap();
        }

        let store = JsonFileStore::open(path).unwrap();
        assert_eq!(store.get("globalSettings").unwrap(), Some(json!({"photo": {}})));
        assert_eq!(store.get("itemOverrides").unwrap(), Some(json!([["a", {}]])));
        assert!(store.get("albumSettings").unwrap().is_none());
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(tmp.path().join("absent.json")).unwrap();
        assert!(store.get("anything").unwrap().is_none());
    }

    #[test]
    fn corrupt_file_opens_empty_and_is_replaced() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::open(path.clone()).unwrap();
        assert!(store.get("globalSettings").unwrap().is_none());
        store.set("albumSettings", json!([])).unwrap();

        let reopened = JsonFileStore::open(path).unwrap();
        assert_eq!(reopened.get("albumSettings").unwrap(), Some(json!([])));
    }

    #[test]
    fn non_object_file_opens_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("list.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let store = JsonFileStore::open(path).unwrap();
        assert!(store.get("itemOverrides").unwrap().is_none());
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            JsonFileStore::open(tmp.path().to_path_buf()),
            Err(SettingsError::Io(_))
        ));
    }
}
