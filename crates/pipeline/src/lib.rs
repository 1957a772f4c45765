//! Transform pipelines and size estimation.
//!
//! A pipeline is an ordered list of layers (compress, encrypt, hash,
//! base64). Nothing in this crate executes the operations; the native
//! backend does that. The composer edits pipelines and the estimator
//! previews their effect on size.

pub mod composer;
pub mod estimate;
pub mod presets;
pub mod types;

// Re-export primary types for convenience.
pub use composer::PipelineComposer;
pub use estimate::{LayerEstimate, PipelineEstimate, estimate};
pub use presets::{find_preset, preset_pipelines};
pub use types::{PipelineConfig, PipelineLayer, PipelineOperation};

/// Highest compression level any pipeline layer may carry.
pub const MAX_COMPRESSION_LEVEL: i32 = 22;

/// Errors from pipeline editing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("pipeline not found: {0}")]
    NotFound(String),

    #[error("layer not found: {0}")]
    LayerNotFound(String),

    #[error("duplicate layer id: {0}")]
    DuplicateLayer(String),

    #[error("invalid compression level {level} (expected 0-22)")]
    InvalidLevel { level: i32 },

    #[error("reorder must list each of the {expected} layers exactly once")]
    ReorderMismatch { expected: usize },
}

/// Checks structural rules: unique layer ids and compression levels in range.
pub fn validate(pipeline: &PipelineConfig) -> Result<(), PipelineError> {
    let mut seen = std::collections::HashSet::new();
    for layer in &pipeline.layers {
        if !seen.insert(layer.id.as_str()) {
            return Err(PipelineError::DuplicateLayer(layer.id.clone()));
        }
        validate_operation(&layer.operation)?;
    }
    Ok(())
}

pub(crate) fn validate_operation(operation: &PipelineOperation) -> Result<(), PipelineError> {
    if let PipelineOperation::Compress { level, .. } = operation
        && !(0..=MAX_COMPRESSION_LEVEL).contains(level)
    {
        return Err(PipelineError::InvalidLevel { level: *level });
    }
    Ok(())
}
