//! Closed-form output size preview.
//!
//! The numbers are approximations for the UI. Nothing here runs the
//! operations, and real output sizes will differ.

use serde::Serialize;

use crate::types::PipelineConfig;

/// Effect of one enabled layer on the running size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerEstimate {
    pub layer_id: String,
    pub operation: String,
    pub ratio: f64,
    pub size_after: u64,
}

/// Predicted effect of a whole pipeline on an input of `input_size` bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineEstimate {
    pub input_size: u64,
    pub estimated_size: u64,
    /// Unrounded `estimated_size / input_size`; 1.0 for empty input.
    pub overall_ratio: f64,
    pub layers: Vec<LayerEstimate>,
}

/// Walks enabled layers in order, multiplying the running size by each
/// operation's ratio.
///
/// Reported sizes are whole bytes. An expanding layer always reports at
/// least one byte more than the layer before it and a shrinking layer at
/// least one byte less, so tiny inputs still move in the right direction.
pub fn estimate(input_size: u64, pipeline: &PipelineConfig) -> PipelineEstimate {
    let mut running = input_size as f64;
    let mut reported = input_size;
    let mut layers = Vec::new();

    for layer in pipeline.enabled_layers() {
        let ratio = layer.operation.size_ratio();
        running *= ratio;
        reported = step_size(reported, running, ratio);
        layers.push(LayerEstimate {
            layer_id: layer.id.clone(),
            operation: layer.operation.describe(),
            ratio,
            size_after: reported,
        });
    }

    let overall_ratio = if input_size == 0 {
        1.0
    } else {
        running / input_size as f64
    };

    PipelineEstimate {
        input_size,
        estimated_size: reported,
        overall_ratio,
        layers,
    }
}

/// Rounds `running` to bytes, nudged so it moves away from `previous` in
/// the direction of `ratio`. Zero stays zero and neutral layers keep
/// the previous size.
fn step_size(previous: u64, running: f64, ratio: f64) -> u64 {
    let rounded = running.round() as u64;
    if previous == 0 {
        0
    } else if ratio > 1.0 {
        rounded.max(previous + 1)
    } else if ratio < 1.0 {
        rounded.min(previous - 1)
    } else {
        previous
    }
}
