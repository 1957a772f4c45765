//! Pipeline data types.

use mediastash_compression::Algorithm;
use mediastash_protocol::KeyBundle;
use serde::{Deserialize, Serialize};

/// Expansion factor of base64 encoding.
pub const BASE64_FACTOR: f64 = 4.0 / 3.0;

/// Size overhead of password encryption (salt, nonce, tag, header).
pub const PASSWORD_OVERHEAD: f64 = 1.05;

/// Size overhead of hybrid encryption (encapsulated keys on top).
pub const HYBRID_OVERHEAD: f64 = 1.10;

/// One transform step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineOperation {
    Compress { algorithm: Algorithm, level: i32 },
    EncryptPassword,
    EncryptHybrid {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        recipient_key_bundle: Option<KeyBundle>,
    },
    Hash,
    Base64Encode,
    Base64Decode,
}

impl PipelineOperation {
    /// Short machine name, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineOperation::Compress { .. } => "compress",
            PipelineOperation::EncryptPassword => "encrypt_password",
            PipelineOperation::EncryptHybrid { .. } => "encrypt_hybrid",
            PipelineOperation::Hash => "hash",
            PipelineOperation::Base64Encode => "base64_encode",
            PipelineOperation::Base64Decode => "base64_decode",
        }
    }

    /// Human-readable label for previews.
    pub fn describe(&self) -> String {
        match self {
            PipelineOperation::Compress { algorithm, level } => {
                format!("Compress ({algorithm}, level {level})")
            }
            PipelineOperation::EncryptPassword => "Password Encryption".into(),
            PipelineOperation::EncryptHybrid { .. } => "Hybrid Encryption".into(),
            PipelineOperation::Hash => "Hash".into(),
            PipelineOperation::Base64Encode => "Base64 Encode".into(),
            PipelineOperation::Base64Decode => "Base64 Decode".into(),
        }
    }

    /// Output/input size ratio used by the estimator.
    pub fn size_ratio(&self) -> f64 {
        match self {
            PipelineOperation::Compress { algorithm, level } => algorithm.estimated_ratio(*level),
            PipelineOperation::EncryptPassword => PASSWORD_OVERHEAD,
            PipelineOperation::EncryptHybrid { .. } => HYBRID_OVERHEAD,
            PipelineOperation::Hash => 1.0,
            PipelineOperation::Base64Encode => BASE64_FACTOR,
            PipelineOperation::Base64Decode => 1.0 / BASE64_FACTOR,
        }
    }
}

/// A step in a pipeline. Disabled layers stay in place and are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineLayer {
    pub id: String,
    pub operation: PipelineOperation,
    pub enabled: bool,
}

impl PipelineLayer {
    pub fn new(id: impl Into<String>, operation: PipelineOperation) -> Self {
        Self {
            id: id.into(),
            operation,
            enabled: true,
        }
    }
}

/// Named, ordered list of layers. Layer order is execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub layers: Vec<PipelineLayer>,
    /// Unix seconds.
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl PipelineConfig {
    /// Layers that will actually run, in order.
    pub fn enabled_layers(&self) -> impl Iterator<Item = &PipelineLayer> {
        self.layers.iter().filter(|l| l.enabled)
    }

    pub fn layer(&self, layer_id: &str) -> Option<&PipelineLayer> {
        self.layers.iter().find(|l| l.id == layer_id)
    }
}
