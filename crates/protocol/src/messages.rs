use serde::{Deserialize, Serialize};

use crate::ProtocolError;
use crate::types::{KeyBundle, SourceLocator};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Compression block of the backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendCompression {
    pub enabled: bool,
    pub algorithm: String,
    pub level: i32,
    pub prefer_speed: bool,
    pub min_size_threshold: u64,
    pub skip_already_compressed: bool,
}

/// Encryption block of the backend settings.
///
/// `use_password` and `use_keypair` are explicit flags; the backend never
/// infers them from the presence of a secret or key bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendEncryption {
    pub enabled: bool,
    pub use_password: bool,
    pub use_keypair: bool,
}

/// Processing settings in the exact shape `transfer_item` expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    pub compression: BackendCompression,
    pub encryption: BackendEncryption,
}

/// One `transfer_item` call: compress, encrypt and store a single item.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub source: SourceLocator,
    pub destination: String,
    pub generated_name: String,
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_bundle: Option<KeyBundle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    pub settings: BackendSettings,
}

impl std::fmt::Debug for TransferRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferRequest")
            .field("source", &self.source.display_name())
            .field("destination", &self.destination)
            .field("generated_name", &self.generated_name)
            .field("item_id", &self.item_id)
            .field("key_bundle", &self.key_bundle.as_ref().map(|_| "<loaded>"))
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("settings", &self.settings)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Result of a successful transfer: where the new object lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResponse {
    pub url: String,
    pub content_id: String,
}

impl TransferResponse {
    /// Parses a raw backend reply, rejecting replies without a URL.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ProtocolError> {
        let resp: TransferResponse = serde_json::from_value(value)?;
        if resp.url.is_empty() {
            return Err(ProtocolError::InvalidPayload(
                "transfer response did not contain a url".into(),
            ));
        }
        Ok(resp)
    }
}

pub(crate) mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(data).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_settings() -> BackendSettings {
        BackendSettings {
            compression: BackendCompression {
                enabled: true,
                algorithm: "zstd".into(),
                level: 3,
                prefer_speed: false,
                min_size_threshold: 1024,
                skip_already_compressed: true,
            },
            encryption: BackendEncryption {
                enabled: true,
                use_password: false,
                use_keypair: true,
            },
        }
    }

    #[test]
    fn request_uses_snake_case_fields() {
        let req = TransferRequest {
            source: SourceLocator::path("/tmp/a.jpg"),
            destination: "owner/repo".into(),
            generated_name: "1_a.jpg".into(),
            item_id: "i1".into(),
            key_bundle: Some(KeyBundle::new(vec![1, 2])),
            secret: None,
            settings: sample_settings(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"generated_name\""));
        assert!(json.contains("\"use_keypair\":true"));
        assert!(json.contains("\"min_size_threshold\":1024"));
        assert!(!json.contains("\"secret\""));
    }

    #[test]
    fn debug_redacts_secret() {
        let req = TransferRequest {
            source: SourceLocator::path("/tmp/a.jpg"),
            destination: String::new(),
            generated_name: String::new(),
            item_id: "i1".into(),
            key_bundle: None,
            secret: Some("hunter2".into()),
            settings: sample_settings(),
        };
        let dbg = format!("{req:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn response_requires_url() {
        let ok = TransferResponse::from_json(serde_json::json!({
            "url": "https://example.test/a",
            "content_id": "abc"
        }))
        .unwrap();
        assert_eq!(ok.content_id, "abc");

        let err = TransferResponse::from_json(serde_json::json!({
            "url": "",
            "content_id": "abc"
        }));
        assert!(matches!(err, Err(ProtocolError::InvalidPayload(_))));

        let err = TransferResponse::from_json(serde_json::json!({ "content_id": "abc" }));
        assert!(matches!(err, Err(ProtocolError::Json(_))));
    }
}
