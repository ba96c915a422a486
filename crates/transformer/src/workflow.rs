//! The end-to-end two-phase run.

use std::sync::Arc;

use expertkit_config::AppConfig;
use expertkit_core::error::ExpertError;
use expertkit_core::provider::Provider;
use expertkit_core::task::Task;
use expertkit_expert::{Expert, InferenceEngine, invoke_with_validation};
use expertkit_validation::{ValidationReport, Validator};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::TransformerError;
use crate::experts::{mapping_expert, model_for, transform_expert};
use crate::models::{MappingReport, TransformCode};
use crate::task::{MappingTask, TransformTask};
use crate::tools::{mapping_tool_bundle, transform_tool_bundle};
use crate::validator::TransformCodeValidator;

/// Everything a run produced, including both tasks for inspection.
#[derive(Debug)]
pub struct TransformOutcome {
    pub mapping: MappingReport,
    pub code: TransformCode,
    /// Report for the last validated version of `code`.
    pub report: ValidationReport,
    /// Transform-phase invocations, at least one.
    pub attempts: usize,
    pub mapping_task: MappingTask,
    pub transform_task: TransformTask,
}

impl TransformOutcome {
    pub fn passed(&self) -> bool {
        self.report.passed()
    }

    /// The transformed document, empty unless the code passed validation.
    pub fn output(&self) -> &Map<String, Value> {
        self.report.output()
    }
}

pub struct JsonTransformer {
    mapping: Expert<MappingTask>,
    transform: Expert<TransformTask>,
    validator: Box<dyn Validator<TransformTask>>,
    max_attempts: usize,
}

impl JsonTransformer {
    pub fn new(
        mapping: Expert<MappingTask>,
        transform: Expert<TransformTask>,
        validator: impl Validator<TransformTask> + 'static,
        max_attempts: usize,
    ) -> Self {
        Self {
            mapping,
            transform,
            validator: Box::new(validator),
            max_attempts,
        }
    }

    /// Build both experts and the sandbox validator from configuration.
    pub fn from_config(config: &AppConfig, provider: Arc<dyn Provider>) -> Result<Self, TransformerError> {
        let engine = match config.inference.max_concurrency {
            Some(n) => InferenceEngine::new().with_max_concurrency(n),
            None => InferenceEngine::new(),
        };

        let mapping_model = model_for(&config.mapping, provider.clone(), &mapping_tool_bundle());
        let transform_model = model_for(&config.transform, provider, &transform_tool_bundle());

        let mapping = mapping_expert(Arc::new(mapping_model)).with_engine(engine.clone());
        let transform =
            transform_expert(Arc::new(transform_model), &config.validation.entry_point).with_engine(engine);
        let validator = TransformCodeValidator::from_config(&config.validation)?;

        Ok(Self::new(mapping, transform, validator, config.correction.max_attempts))
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Map `source` onto `target_schema`, then generate and validate the
    /// transform code.
    ///
    /// Code that never validates is not an error: the outcome's report says
    /// why it failed.
    pub async fn run(&self, source: &str, target_schema: &str) -> Result<TransformOutcome, TransformerError> {
        let mut mapping_task = MappingTask::new(source, target_schema);
        info!(task_id = %mapping_task.id(), "Starting mapping phase");
        self.mapping.invoke(&mut mapping_task).await?;
        debug!(task = %mapping_task.snapshot(), "Mapping phase complete");

        let mut transform_task = TransformTask::from_mapping(&mapping_task)?;
        info!(
            task_id = %transform_task.id(),
            mappings = transform_task.mappings.len(),
            "Starting transform phase"
        );
        let correction = invoke_with_validation(
            &self.transform,
            &mut transform_task,
            self.validator.as_ref(),
            self.max_attempts,
        )
        .await?;
        debug!(task = %transform_task.snapshot(), "Transform phase complete");

        if correction.passed() {
            info!(attempts = correction.attempts, "Transform code validated");
        } else {
            warn!(attempts = correction.attempts, "Transform code never passed validation");
        }

        let mapping = mapping_task
            .mapping_report
            .clone()
            .ok_or_else(|| TransformerError::MissingMapping(mapping_task.id.to_string()))?;
        let code = transform_task
            .transform_code
            .clone()
            .ok_or_else(|| ExpertError::MissingResult(transform_task.id.to_string()))?;

        Ok(TransformOutcome {
            mapping,
            code,
            report: correction.report,
            attempts: correction.attempts,
            mapping_task,
            transform_task,
        })
    }
}

impl std::fmt::Debug for JsonTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonTransformer")
            .field("mapping", &self.mapping)
            .field("transform", &self.transform)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}
