//! Settings value types.
//!
//! Persisted field names are camelCase so saved stores stay readable by the
//! UI layer that shares them.

use mediastash_compression::Algorithm;
use mediastash_protocol::KeyBundle;
use serde::{Deserialize, Serialize};

/// Coarse media classification used to key the global settings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Photo,
    Video,
    Document,
    Other,
}

impl MediaType {
    pub fn all() -> [MediaType; 4] {
        [
            MediaType::Photo,
            MediaType::Video,
            MediaType::Document,
            MediaType::Other,
        ]
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MediaType::Photo => "photo",
            MediaType::Video => "video",
            MediaType::Document => "document",
            MediaType::Other => "other",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub algorithm: Algorithm,
    pub level: i32,
    pub prefer_speed: bool,
    /// Files smaller than this many bytes are sent uncompressed.
    pub min_size_threshold: u64,
    /// Skip formats that are already compressed (JPEG, MP4, ZIP...).
    pub skip_already_compressed: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            algorithm: Algorithm::Zstd,
            level: 3,
            prefer_speed: false,
            min_size_threshold: 1024,
            skip_already_compressed: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncryptionConfig {
    pub enabled: bool,
    pub use_password: bool,
    pub use_keypair: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_key_bundle: Option<KeyBundle>,
}

impl EncryptionConfig {
    /// Hybrid encryption to the caller's own key bundle.
    pub fn keypair() -> Self {
        Self {
            enabled: true,
            use_password: false,
            use_keypair: true,
            recipient_key_bundle: None,
        }
    }

    /// Password-based encryption.
    pub fn password() -> Self {
        Self {
            enabled: true,
            use_password: true,
            use_keypair: false,
            recipient_key_bundle: None,
        }
    }
}

/// Everything that decides how one file is processed before transfer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    pub compression: CompressionConfig,
    pub encryption: EncryptionConfig,
}

/// A folder- or item-scoped override.
///
/// The override only takes part in resolution while `use_custom_settings`
/// is set; clearing the flag keeps the stored values for later.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScopeSettings {
    pub use_custom_settings: bool,
    pub settings: ProcessingSettings,
}

impl ScopeSettings {
    /// An active override carrying `settings`.
    pub fn custom(settings: ProcessingSettings) -> Self {
        Self {
            use_custom_settings: true,
            settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compression_defaults() {
        let c = CompressionConfig::default();
        assert!(c.enabled);
        assert_eq!(c.algorithm, Algorithm::Zstd);
        assert_eq!(c.level, 3);
        assert_eq!(c.min_size_threshold, 1024);
        assert!(c.skip_already_compressed);
    }

    #[test]
    fn encryption_defaults_off() {
        let e = EncryptionConfig::default();
        assert!(!e.enabled && !e.use_password && !e.use_keypair);
        assert!(e.recipient_key_bundle.is_none());
    }

    #[test]
    fn persisted_names_are_camel_case() {
        let scope = ScopeSettings::custom(ProcessingSettings::default());
        let json = serde_json::to_string(&scope).unwrap();
        assert!(json.contains("\"useCustomSettings\":true"));
        assert!(json.contains("\"minSizeThreshold\":1024"));
        assert!(json.contains("\"skipAlreadyCompressed\":true"));
        assert!(json.contains("\"usePassword\":false"));
        assert!(!json.contains("recipientKeyBundle"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: ProcessingSettings =
            serde_json::from_str(r#"{"encryption":{"enabled":true,"useKeypair":true}}"#).unwrap();
        assert!(s.encryption.use_keypair);
        assert_eq!(s.compression, CompressionConfig::default());
    }

    #[test]
    fn media_type_names() {
        assert_eq!(serde_json::to_string(&MediaType::Document).unwrap(), "\"document\"");
        assert_eq!(MediaType::Video.to_string(), "video");
    }
}
