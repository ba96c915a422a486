use expertkit_config::ValidationConfig;
use expertkit_validation::{ArtifactLimits, ArtifactPipeline, Sandbox, ValidationError, ValidationReport, Validator, WasmSandbox};

use crate::models::TransformCode;
use crate::task::TransformTask;

/// Runs generated transform code through the artifact pipeline, using the
/// task's own source document as input.
#[derive(Debug)]
pub struct TransformCodeValidator<S = WasmSandbox> {
    pipeline: ArtifactPipeline<S>,
}

impl TransformCodeValidator<WasmSandbox> {
    pub fn from_config(config: &ValidationConfig) -> Result<Self, ValidationError> {
        let limits = ArtifactLimits {
            max_fuel: config.max_fuel,
            max_memory_bytes: config.max_memory_bytes,
        };
        Ok(Self::new(ArtifactPipeline::wasm(limits, config.entry_point.clone())?))
    }
}

impl<S: Sandbox> TransformCodeValidator<S> {
    pub fn new(pipeline: ArtifactPipeline<S>) -> Self {
        Self { pipeline }
    }

    pub fn entry_point(&self) -> &str {
        self.pipeline.entry_point()
    }
}

impl<S: Sandbox> Validator<TransformTask> for TransformCodeValidator<S> {
    fn validate(&self, result: &TransformCode, task: &TransformTask) -> ValidationReport {
        self.pipeline.validate(&result.module_source(), &task.source_json)
    }
}
