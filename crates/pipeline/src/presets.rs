//! Built-in pipeline presets.

use mediastash_compression::Algorithm;

use crate::types::{PipelineConfig, PipelineLayer, PipelineOperation};

fn preset(id: &str, name: &str, description: &str, layers: Vec<PipelineLayer>) -> PipelineConfig {
    PipelineConfig {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        layers,
        created_at: 0,
        updated_at: 0,
    }
}

fn compress(id: &str, algorithm: Algorithm, level: i32) -> PipelineLayer {
    PipelineLayer::new(id, PipelineOperation::Compress { algorithm, level })
}

fn hybrid(id: &str) -> PipelineLayer {
    PipelineLayer::new(
        id,
        PipelineOperation::EncryptHybrid {
            recipient_key_bundle: None,
        },
    )
}

/// The fixed preset catalog, in display order.
pub fn preset_pipelines() -> Vec<PipelineConfig> {
    vec![
        preset(
            "preset-fast-compress",
            "Fast Compression",
            "LZ4 compression for speed",
            vec![compress("lz4-compress", Algorithm::Lz4, 1)],
        ),
        preset(
            "preset-max-compress",
            "Maximum Compression",
            "Zstd level 19 for best ratio",
            vec![compress("zstd-max", Algorithm::Zstd, 19)],
        ),
        preset(
            "preset-password-encrypt",
            "Secure Storage",
            "Compress + password encryption",
            vec![
                compress("zstd-compress", Algorithm::Zstd, 3),
                PipelineLayer::new("password-encrypt", PipelineOperation::EncryptPassword),
            ],
        ),
        preset(
            "preset-pq-secure",
            "Post-Quantum Secure",
            "Compress, hybrid post-quantum encryption, integrity hash",
            vec![
                compress("zstd-compress", Algorithm::Zstd, 3),
                hybrid("pq-encrypt"),
                PipelineLayer::new("integrity-hash", PipelineOperation::Hash),
            ],
        ),
        preset(
            "preset-max-security",
            "Maximum Security",
            "Compress + password + hybrid encryption, text-safe output",
            vec![
                compress("zstd-compress", Algorithm::Zstd, 6),
                PipelineLayer::new("password-layer", PipelineOperation::EncryptPassword),
                hybrid("pq-layer"),
                PipelineLayer::new("base64-layer", PipelineOperation::Base64Encode),
            ],
        ),
    ]
}

/// Looks up a preset by id.
pub fn find_preset(preset_id: &str) -> Option<PipelineConfig> {
    preset_pipelines().into_iter().find(|p| p.id == preset_id)
}
