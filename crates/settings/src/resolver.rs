//! Effective-settings resolution.
//!
//! Precedence is item override > folder override > global default for the
//! file's media type > hardcoded default. Nothing is cached: every call
//! recomputes from the three maps, so removing an override takes effect on
//! the next resolution without touching anything else.

use std::collections::BTreeMap;

use tracing::debug;

use crate::types::{
    CompressionConfig, EncryptionConfig, MediaType, ProcessingSettings, ScopeSettings,
};

/// Holds the three settings layers.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsResolver {
    global: BTreeMap<MediaType, ProcessingSettings>,
    folders: BTreeMap<String, ScopeSettings>,
    items: BTreeMap<String, ScopeSettings>,
}

impl Default for SettingsResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Built-in global table used on first run.
pub fn builtin_global_settings() -> BTreeMap<MediaType, ProcessingSettings> {
    let mut table = BTreeMap::new();
    table.insert(
        MediaType::Photo,
        ProcessingSettings {
            compression: CompressionConfig::default(),
            encryption: EncryptionConfig::keypair(),
        },
    );
    table.insert(
        MediaType::Video,
        ProcessingSettings {
            compression: CompressionConfig {
                enabled: false,
                prefer_speed: true,
                ..CompressionConfig::default()
            },
            encryption: EncryptionConfig::keypair(),
        },
    );
    table.insert(
        MediaType::Document,
        ProcessingSettings {
            compression: CompressionConfig {
                level: 6,
                ..CompressionConfig::default()
            },
            encryption: EncryptionConfig::keypair(),
        },
    );
    table.insert(MediaType::Other, ProcessingSettings::default());
    table
}

impl SettingsResolver {
    /// Creates a resolver seeded with the built-in global table.
    pub fn new() -> Self {
        Self::with_layers(builtin_global_settings(), BTreeMap::new(), BTreeMap::new())
    }

    pub fn with_layers(
        global: BTreeMap<MediaType, ProcessingSettings>,
        folders: BTreeMap<String, ScopeSettings>,
        items: BTreeMap<String, ScopeSettings>,
    ) -> Self {
        Self {
            global,
            folders,
            items,
        }
    }

    /// Resolves the settings that apply to one file. Never fails.
    pub fn get_effective_settings(
        &self,
        item_path: &str,
        folder_path: Option<&str>,
        media_type: MediaType,
    ) -> ProcessingSettings {
        if let Some(item) = self.items.get(item_path)
            && item.use_custom_settings
        {
            debug!(item = %item_path, "using item override");
            return item.settings.clone();
        }

        if let Some(folder) = folder_path.and_then(|f| self.folders.get(f))
            && folder.use_custom_settings
        {
            debug!(item = %item_path, folder = ?folder_path, "using folder override");
            return folder.settings.clone();
        }

        self.global_for(media_type)
    }

    /// Global default for a media type, or the hardcoded default.
    pub fn global_for(&self, media_type: MediaType) -> ProcessingSettings {
        self.global.get(&media_type).cloned().unwrap_or_default()
    }

    pub fn set_global_settings(&mut self, media_type: MediaType, settings: ProcessingSettings) {
        self.global.insert(media_type, settings);
    }

    pub fn set_folder_settings(&mut self, folder_path: &str, settings: ScopeSettings) {
        self.folders.insert(folder_path.to_string(), settings);
    }

    /// Removes a folder override; returns whether one existed.
    pub fn remove_folder_settings(&mut self, folder_path: &str) -> bool {
        self.folders.remove(folder_path).is_some()
    }

    pub fn set_item_override(&mut self, item_path: &str, settings: ScopeSettings) {
        self.items.insert(item_path.to_string(), settings);
    }

    /// Removes an item override; returns whether one existed.
    pub fn remove_item_override(&mut self, item_path: &str) -> bool {
        self.items.remove(item_path).is_some()
    }

    pub fn folder_settings(&self, folder_path: &str) -> Option<&ScopeSettings> {
        self.folders.get(folder_path)
    }

    pub fn item_override(&self, item_path: &str) -> Option<&ScopeSettings> {
        self.items.get(item_path)
    }

    pub fn global_settings(&self) -> &BTreeMap<MediaType, ProcessingSettings> {
        &self.global
    }

    pub fn folder_overrides(&self) -> &BTreeMap<String, ScopeSettings> {
        &self.folders
    }

    pub fn item_overrides(&self) -> &BTreeMap<String, ScopeSettings> {
        &self.items
    }
}
