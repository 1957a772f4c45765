//! Processing settings for uploads.
//!
//! Three layers decide what happens to a file before it is transferred:
//! a global table keyed by media type, optional per-folder overrides and
//! optional per-item overrides. [`SettingsResolver`] computes the effective
//! settings on demand; [`SettingsManager`] adds thread safety and
//! write-through persistence to a [`KeyValueStore`].

pub mod manager;
pub mod media;
pub mod resolver;
pub mod store;
pub mod types;

// Re-export primary types for convenience.
pub use manager::{
    ALBUM_SETTINGS_KEY, GLOBAL_SETTINGS_KEY, ITEM_OVERRIDES_KEY, SettingsManager,
};
pub use media::{detect_media_type, should_compress};
pub use resolver::{SettingsResolver, builtin_global_settings};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use types::{
    CompressionConfig, EncryptionConfig, MediaType, ProcessingSettings, ScopeSettings,
};

// Catalog helpers callers usually want alongside the resolver.
pub use mediastash_compression::{Recommendation, is_already_compressed, recommend};

/// Errors from settings storage.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Compression recommendation for a file (name + size only).
pub fn get_compression_recommendation(filename: &str, size: u64) -> Recommendation {
    recommend(filename, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediastash_compression::Algorithm;

    #[test]
    fn recommendation_skips_compressed_media() {
        let r = get_compression_recommendation("photo.jpg", 5_000_000);
        assert!(!r.should_compress);
        assert_eq!(r.algorithm, Algorithm::None);
    }

    #[test]
    fn recommendation_for_text_and_tiny_files() {
        let text = get_compression_recommendation("/notes/todo.txt", 10_000);
        assert!(text.should_compress);
        assert_eq!(text.algorithm, Algorithm::Zstd);
        assert_eq!(text.level, 6);

        let tiny = get_compression_recommendation("/notes/todo.txt", 512);
        assert!(!tiny.should_compress);
    }
}
