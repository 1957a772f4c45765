//! Resolver state bound to a persistent store.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::media::detect_media_type;
use crate::resolver::{SettingsResolver, builtin_global_settings};
use crate::store::KeyValueStore;
use crate::types::{MediaType, ProcessingSettings, ScopeSettings};

/// Store key for the global per-media-type table (JSON object).
pub const GLOBAL_SETTINGS_KEY: &str = "globalSettings";
/// Store key for folder overrides (array of `[path, settings]` pairs).
pub const ALBUM_SETTINGS_KEY: &str = "albumSettings";
/// Store key for item overrides (array of `[path, settings]` pairs).
pub const ITEM_OVERRIDES_KEY: &str = "itemOverrides";

/// Thread-safe settings service.
///
/// Every mutator writes through to the store. Storage failures are logged
/// and swallowed: losing a saved preference must never block an upload.
pub struct SettingsManager {
    resolver: RwLock<SettingsResolver>,
    store: Arc<dyn KeyValueStore>,
}

impl SettingsManager {
    /// Loads saved state from `store`, falling back to defaults per key.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let global: BTreeMap<MediaType, ProcessingSettings> =
            read_key(store.as_ref(), GLOBAL_SETTINGS_KEY).unwrap_or_else(builtin_global_settings);
        let folders: Vec<(String, ScopeSettings)> =
            read_key(store.as_ref(), ALBUM_SETTINGS_KEY).unwrap_or_default();
        let items: Vec<(String, ScopeSettings)> =
            read_key(store.as_ref(), ITEM_OVERRIDES_KEY).unwrap_or_default();

        debug!(
            global = global.len(),
            folders = folders.len(),
            items = items.len(),
            "settings loaded"
        );

        let resolver = SettingsResolver::with_layers(
            global,
            folders.into_iter().collect(),
            items.into_iter().collect(),
        );
        Self {
            resolver: RwLock::new(resolver),
            store,
        }
    }

    /// See [`SettingsResolver::get_effective_settings`].
    pub fn get_effective_settings(
        &self,
        item_path: &str,
        folder_path: Option<&str>,
        media_type: MediaType,
    ) -> ProcessingSettings {
        self.resolver
            .read()
            .unwrap()
            .get_effective_settings(item_path, folder_path, media_type)
    }

    /// Resolves settings for a file, detecting its media type from the name.
    pub fn resolve_for_file(&self, item_path: &str, folder_path: Option<&str>) -> ProcessingSettings {
        self.get_effective_settings(item_path, folder_path, detect_media_type(item_path))
    }

    /// Returns a copy of the current resolver state.
    pub fn snapshot(&self) -> SettingsResolver {
        self.resolver.read().unwrap().clone()
    }

    pub fn set_global_settings(&self, media_type: MediaType, settings: ProcessingSettings) {
        let mut resolver = self.resolver.write().unwrap();
        resolver.set_global_settings(media_type, settings);
        self.persist_global(&resolver);
    }

    pub fn set_folder_settings(&self, folder_path: &str, settings: ScopeSettings) {
        let mut resolver = self.resolver.write().unwrap();
        resolver.set_folder_settings(folder_path, settings);
        self.persist_folders(&resolver);
    }

    pub fn remove_folder_settings(&self, folder_path: &str) -> bool {
        let mut resolver = self.resolver.write().unwrap();
        let removed = resolver.remove_folder_settings(folder_path);
        if removed {
            self.persist_folders(&resolver);
        }
        removed
    }

    pub fn set_item_override(&self, item_path: &str, settings: ScopeSettings) {
        let mut resolver = self.resolver.write().unwrap();
        resolver.set_item_override(item_path, settings);
        self.persist_items(&resolver);
    }

    pub fn remove_item_override(&self, item_path: &str) -> bool {
        let mut resolver = self.resolver.write().unwrap();
        let removed = resolver.remove_item_override(item_path);
        if removed {
            self.persist_items(&resolver);
        }
        removed
    }

    /// Writes all three layers.
    pub fn save_all(&self) {
        let resolver = self.resolver.write().unwrap();
        self.persist_global(&resolver);
        self.persist_folders(&resolver);
        self.persist_items(&resolver);
    }

    // Called with the write guard held, so store writes follow mutation order.

    fn persist_global(&self, resolver: &SettingsResolver) {
        write_key(self.store.as_ref(), GLOBAL_SETTINGS_KEY, resolver.global_settings());
    }

    fn persist_folders(&self, resolver: &SettingsResolver) {
        write_key(
            self.store.as_ref(),
            ALBUM_SETTINGS_KEY,
            &as_pairs(resolver.folder_overrides()),
        );
    }

    fn persist_items(&self, resolver: &SettingsResolver) {
        write_key(
            self.store.as_ref(),
            ITEM_OVERRIDES_KEY,
            &as_pairs(resolver.item_overrides()),
        );
    }
}

fn as_pairs(map: &BTreeMap<String, ScopeSettings>) -> Vec<(&str, &ScopeSettings)> {
    map.iter().map(|(k, v)| (k.as_str(), v)).collect()
}

fn read_key<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    match store.get(key) {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(key, error = %e, "failed to parse saved settings, using defaults");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(key, error = %e, "failed to read saved settings, using defaults");
            None
        }
    }
}

fn write_key<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    let json = match serde_json::to_value(value) {
        Ok(json) => json,
        Err(e) => {
            warn!(key, error = %e, "failed to serialize settings");
            return;
        }
    };
    if let Err(e) = store.set(key, json) {
        warn!(key, error = %e, "failed to save settings");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SettingsError;
    use crate::store::{JsonFileStore, MemoryStore};
    use crate::types::{CompressionConfig, EncryptionConfig};
    use mediastash_compression::Algorithm;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<Value>, SettingsError> {
            Err(SettingsError::Io(std::io::Error::other("disk gone")))
        }

        fn set(&self, _key: &str, _value: Value) -> Result<(), SettingsError> {
            Err(SettingsError::Io(std::io::Error::other("disk gone")))
        }
    }

    /// Memory store whose first `set` stalls.
    struct SlowFirstWrite {
        inner: MemoryStore,
        stalled: AtomicBool,
    }

    impl KeyValueStore for SlowFirstWrite {
        fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
            if !self.stalled.swap(true, Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(300));
            }
            self.inner.set(key, value)
        }
    }

    fn plain() -> ProcessingSettings {
        ProcessingSettings {
            compression: CompressionConfig {
                algorithm: Algorithm::Gzip,
                level: 9,
                ..CompressionConfig::default()
            },
            encryption: EncryptionConfig::default(),
        }
    }

    #[test]
    fn empty_store_uses_builtin_defaults() {
        let mgr = SettingsManager::load(Arc::new(MemoryStore::new()));
        let snap = mgr.snapshot();
        assert_eq!(snap.global_settings(), &builtin_global_settings());
        assert!(snap.folder_overrides().is_empty());
        assert!(snap.item_overrides().is_empty());
    }

    #[test]
    fn broken_store_never_errors() {
        let mgr = SettingsManager::load(Arc::new(BrokenStore));
        mgr.set_item_override("/a.jpg", ScopeSettings::custom(plain()));
        let s = mgr.resolve_for_file("/a.jpg", None);
        assert_eq!(s, plain());
    }

    #[test]
    fn corrupt_key_falls_back_individually() {
        let store = Arc::new(MemoryStore::new());
        store.set(GLOBAL_SETTINGS_KEY, json!("garbage")).unwrap();
        store
            .set(
                ITEM_OVERRIDES_KEY,
                json!([["/a.jpg", {"useCustomSettings": true, "settings": {}}]]),
            )
            .unwrap();

        let mgr = SettingsManager::load(store);
        let snap = mgr.snapshot();
        assert_eq!(snap.global_settings(), &builtin_global_settings());
        assert!(snap.item_override("/a.jpg").unwrap().use_custom_settings);
    }

    #[test]
    fn overrides_are_stored_as_pairs() {
        let store = Arc::new(MemoryStore::new());
        let mgr = SettingsManager::load(store.clone());
        mgr.set_folder_settings("/album", ScopeSettings::custom(plain()));

        let saved = store.get(ALBUM_SETTINGS_KEY).unwrap().unwrap();
        let arr = saved.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0][0], json!("/album"));
        assert_eq!(arr[0][1]["useCustomSettings"], json!(true));
    }

    #[test]
    fn concurrent_mutators_persist_in_order() {
        let store = Arc::new(SlowFirstWrite {
            inner: MemoryStore::new(),
            stalled: AtomicBool::new(false),
        });
        let mgr = Arc::new(SettingsManager::load(store.clone()));

        let first = {
            let mgr = mgr.clone();
            std::thread::spawn(move || {
                mgr.set_folder_settings("/a", ScopeSettings::custom(plain()));
            })
        };
        std::thread::sleep(Duration::from_millis(50));
        mgr.set_folder_settings("/b", ScopeSettings::custom(plain()));
        first.join().unwrap();

        assert_eq!(mgr.snapshot().folder_overrides().len(), 2);
        let saved = store.get(ALBUM_SETTINGS_KEY).unwrap().unwrap();
        assert_eq!(saved.as_array().unwrap().len(), 2);

        let reloaded = SettingsManager::load(store);
        assert!(reloaded.snapshot().folder_settings("/a").is_some());
        assert!(reloaded.snapshot().folder_settings("/b").is_some());
    }

    #[test]
    fn state_survives_reload_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");

        {
            let store = Arc::new(JsonFileStore::open(path.clone()).unwrap());
            let mgr = SettingsManager::load(store);
            mgr.set_global_settings(MediaType::Other, plain());
            mgr.set_folder_settings("/album", ScopeSettings::custom(plain()));
            mgr.set_item_override("/album/x.png", ScopeSettings::custom(plain()));
        }

        let store = Arc::new(JsonFileStore::open(path).unwrap());
        let mgr = SettingsManager::load(store);
        let snap = mgr.snapshot();
        assert_eq!(snap.global_for(MediaType::Other), plain());
        assert!(snap.folder_settings("/album").is_some());
        assert!(snap.item_override("/album/x.png").is_some());
    }

    #[test]
    fn removal_persists() {
        let store = Arc::new(MemoryStore::new());
        let mgr = SettingsManager::load(store.clone());
        mgr.set_item_override("/a.jpg", ScopeSettings::custom(plain()));
        assert!(mgr.remove_item_override("/a.jpg"));
        assert!(!mgr.remove_item_override("/a.jpg"));
        assert_eq!(store.get(ITEM_OVERRIDES_KEY).unwrap(), Some(json!([])));
    }

    #[test]
    fn resolve_for_file_detects_media_type() {
        let mgr = SettingsManager::load(Arc::new(MemoryStore::new()));
        let video = mgr.resolve_for_file("/clips/a.mp4", None);
        assert!(!video.compression.enabled);
        let doc = mgr.resolve_for_file("/docs/a.pdf", None);
        assert_eq!(doc.compression.level, 6);
    }
}
