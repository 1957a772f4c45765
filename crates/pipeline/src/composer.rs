//! In-memory pipeline editor.

use tracing::{debug, info};

use crate::estimate::{PipelineEstimate, estimate};
use crate::presets::find_preset;
use crate::types::{PipelineConfig, PipelineLayer, PipelineOperation};
use crate::{PipelineError, validate_operation};

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Owns the user's pipelines and which one is active.
#[derive(Debug, Default)]
pub struct PipelineComposer {
    pipelines: Vec<PipelineConfig>,
    active: Option<String>,
}

impl PipelineComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All pipelines in creation order.
    pub fn pipelines(&self) -> &[PipelineConfig] {
        &self.pipelines
    }

    pub fn get(&self, pipeline_id: &str) -> Option<&PipelineConfig> {
        self.pipelines.iter().find(|p| p.id == pipeline_id)
    }

    fn get_mut(&mut self, pipeline_id: &str) -> Result<&mut PipelineConfig, PipelineError> {
        self.pipelines
            .iter_mut()
            .find(|p| p.id == pipeline_id)
            .ok_or_else(|| PipelineError::NotFound(pipeline_id.into()))
    }

    /// Creates an empty pipeline and returns a copy of it.
    pub fn create_pipeline(&mut self, name: &str) -> PipelineConfig {
        let ts = now();
        let pipeline = PipelineConfig {
            id: new_id(),
            name: name.into(),
            description: String::new(),
            layers: Vec::new(),
            created_at: ts,
            updated_at: ts,
        };
        info!(pipeline = %pipeline.id, name, "pipeline created");
        self.pipelines.push(pipeline.clone());
        pipeline
    }

    /// Copies a preset into a new editable pipeline.
    pub fn clone_preset(&mut self, preset_id: &str) -> Result<PipelineConfig, PipelineError> {
        let mut pipeline =
            find_preset(preset_id).ok_or_else(|| PipelineError::NotFound(preset_id.into()))?;
        let ts = now();
        pipeline.id = new_id();
        pipeline.created_at = ts;
        pipeline.updated_at = ts;
        info!(preset = preset_id, pipeline = %pipeline.id, "preset cloned");
        self.pipelines.push(pipeline.clone());
        Ok(pipeline)
    }

    pub fn rename_pipeline(&mut self, pipeline_id: &str, name: &str) -> Result<(), PipelineError> {
        let pipeline = self.get_mut(pipeline_id)?;
        pipeline.name = name.into();
        pipeline.updated_at = now();
        Ok(())
    }

    /// Deletes a pipeline. Deleting the active one leaves nothing active.
    pub fn delete_pipeline(&mut self, pipeline_id: &str) -> Result<(), PipelineError> {
        let before = self.pipelines.len();
        self.pipelines.retain(|p| p.id != pipeline_id);
        if self.pipelines.len() == before {
            return Err(PipelineError::NotFound(pipeline_id.into()));
        }
        if self.active.as_deref() == Some(pipeline_id) {
            self.active = None;
        }
        info!(pipeline = pipeline_id, "pipeline deleted");
        Ok(())
    }

    /// Appends a layer and returns its generated id.
    pub fn add_layer(
        &mut self,
        pipeline_id: &str,
        operation: PipelineOperation,
    ) -> Result<String, PipelineError> {
        validate_operation(&operation)?;
        let pipeline = self.get_mut(pipeline_id)?;
        let layer = PipelineLayer::new(new_id(), operation);
        let layer_id = layer.id.clone();
        debug!(pipeline = pipeline_id, layer = %layer_id, kind = layer.operation.kind(), "layer added");
        pipeline.layers.push(layer);
        pipeline.updated_at = now();
        Ok(layer_id)
    }

    pub fn remove_layer(&mut self, pipeline_id: &str, layer_id: &str) -> Result<(), PipelineError> {
        let pipeline = self.get_mut(pipeline_id)?;
        let before = pipeline.layers.len();
        pipeline.layers.retain(|l| l.id != layer_id);
        if pipeline.layers.len() == before {
            return Err(PipelineError::LayerNotFound(layer_id.into()));
        }
        pipeline.updated_at = now();
        Ok(())
    }

    /// Enables or disables a layer in place.
    pub fn toggle_layer(
        &mut self,
        pipeline_id: &str,
        layer_id: &str,
        enabled: bool,
    ) -> Result<(), PipelineError> {
        let pipeline = self.get_mut(pipeline_id)?;
        let layer = pipeline
            .layers
            .iter_mut()
            .find(|l| l.id == layer_id)
            .ok_or_else(|| PipelineError::LayerNotFound(layer_id.into()))?;
        layer.enabled = enabled;
        pipeline.updated_at = now();
        Ok(())
    }

    /// Reorders layers to match `ordered_ids`, which must be a permutation
    /// of the current layer ids. On error the pipeline is unchanged.
    pub fn reorder_layers(
        &mut self,
        pipeline_id: &str,
        ordered_ids: &[String],
    ) -> Result<(), PipelineError> {
        let pipeline = self.get_mut(pipeline_id)?;
        let expected = pipeline.layers.len();
        if ordered_ids.len() != expected {
            return Err(PipelineError::ReorderMismatch { expected });
        }

        let mut remaining = pipeline.layers.clone();
        let mut reordered = Vec::with_capacity(expected);
        for id in ordered_ids {
            let pos = remaining
                .iter()
                .position(|l| &l.id == id)
                .ok_or(PipelineError::ReorderMismatch { expected })?;
            reordered.push(remaining.swap_remove(pos));
        }

        pipeline.layers = reordered;
        pipeline.updated_at = now();
        Ok(())
    }

    pub fn set_active_pipeline(&mut self, pipeline_id: &str) -> Result<(), PipelineError> {
        if self.get(pipeline_id).is_none() {
            return Err(PipelineError::NotFound(pipeline_id.into()));
        }
        self.active = Some(pipeline_id.into());
        Ok(())
    }

    pub fn clear_active_pipeline(&mut self) {
        self.active = None;
    }

    pub fn active_pipeline(&self) -> Option<&PipelineConfig> {
        self.active.as_deref().and_then(|id| self.get(id))
    }

    /// Estimates the active pipeline for `input_size`, if one is active.
    pub fn estimate_active(&self, input_size: u64) -> Option<PipelineEstimate> {
        self.active_pipeline().map(|p| estimate(input_size, p))
    }
}
