use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Opaque recipient public-key structure used for hybrid encryption.
///
/// Supplied by the key-management collaborator; this crate never looks
/// inside it beyond checking that something was loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBundle {
    #[serde(with = "crate::messages::base64_bytes")]
    pub data: Vec<u8>,
}

impl KeyBundle {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// A bundle with no key material is treated as "not loaded".
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Where the bytes for an upload come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceLocator {
    /// A file on the local filesystem.
    Path { path: PathBuf },
    /// An in-memory blob (e.g. a pasted image).
    Blob {
        name: String,
        #[serde(with = "crate::messages::base64_bytes")]
        bytes: Vec<u8>,
    },
}

impl SourceLocator {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        SourceLocator::Path { path: path.into() }
    }

    pub fn blob(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        SourceLocator::Blob {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Human-facing name: the file name for paths, the given name for blobs.
    pub fn display_name(&self) -> String {
        match self {
            SourceLocator::Path { path } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned()),
            SourceLocator::Blob { name, .. } => name.clone(),
        }
    }

    /// Key used for item-level settings overrides.
    pub fn settings_key(&self) -> String {
        match self {
            SourceLocator::Path { path } => path.to_string_lossy().into_owned(),
            SourceLocator::Blob { name, .. } => name.clone(),
        }
    }
}

/// Progress notification streamed by the backend while a transfer runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadProgress {
    pub id: String,
    pub bytes_sent: u64,
    pub total_bytes: u64,
    pub percent: u8,
}

impl UploadProgress {
    /// Builds a notification, deriving `percent` from the byte counts.
    pub fn from_bytes(id: impl Into<String>, bytes_sent: u64, total_bytes: u64) -> Self {
        let percent = if total_bytes == 0 {
            0
        } else {
            ((bytes_sent.min(total_bytes) as f64 / total_bytes as f64) * 100.0).round() as u8
        };
        Self {
            id: id.into(),
            bytes_sent,
            total_bytes,
            percent,
        }
    }

    /// Percent clamped to 0-100; backends occasionally overshoot.
    pub fn clamped_percent(&self) -> u8 {
        self.percent.min(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_field_names_are_snake_case() {
        let json = r#"{"id":"u1","bytes_sent":50,"total_bytes":200,"percent":25}"#;
        let p: UploadProgress = serde_json::from_str(json).unwrap();
        assert_eq!(p.id, "u1");
        assert_eq!(p.bytes_sent, 50);
        assert_eq!(p.percent, 25);
    }

    #[test]
    fn progress_from_bytes() {
        assert_eq!(UploadProgress::from_bytes("a", 1, 4).percent, 25);
        assert_eq!(UploadProgress::from_bytes("a", 0, 0).percent, 0);
        assert_eq!(UploadProgress::from_bytes("a", 10, 4).percent, 100);
    }

    #[test]
    fn clamped_percent_caps_overshoot() {
        let p = UploadProgress {
            id: "x".into(),
            bytes_sent: 0,
            total_bytes: 0,
            percent: 140,
        };
        assert_eq!(p.clamped_percent(), 100);
    }

    #[test]
    fn display_name_for_path_and_blob() {
        let p = SourceLocator::path("/photos/2024/beach.jpg");
        assert_eq!(p.display_name(), "beach.jpg");
        assert_eq!(p.settings_key(), "/photos/2024/beach.jpg");

        let b = SourceLocator::blob("clip.png", vec![1, 2, 3]);
        assert_eq!(b.display_name(), "clip.png");
    }

    #[test]
    fn blob_bytes_are_base64_in_json() {
        let b = SourceLocator::blob("h.txt", b"Hello".to_vec());
        let json = serde_json::to_string(&b).unwrap();
        assert!(json.contains("SGVsbG8="));
        assert!(json.contains(r#""kind":"blob""#));
    }

    #[test]
    fn empty_key_bundle() {
        assert!(KeyBundle::new(Vec::new()).is_empty());
        assert!(!KeyBundle::new(vec![7u8; 32]).is_empty());
    }
}
