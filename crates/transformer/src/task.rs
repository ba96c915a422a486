//! The two task kinds of the transformer.

use expertkit_core::message::Conversation;
use expertkit_core::task::{Task, TaskId};
use serde_json::json;

use crate::error::TransformerError;
use crate::models::{FieldMapping, MappingReport, TransformCode};
use crate::tools::{CREATE_MAPPING_REPORT, GENERATE_TRANSFORM_CODE};

/// Identify field mappings between a source document and a target schema.
#[derive(Debug, Clone)]
pub struct MappingTask {
    pub id: TaskId,
    pub context: Conversation,
    pub source_json: String,
    pub target_schema: String,
    pub mapping_report: Option<MappingReport>,
}

impl MappingTask {
    pub fn new(source_json: impl Into<String>, target_schema: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            context: Conversation::new(),
            source_json: source_json.into(),
            target_schema: target_schema.into(),
            mapping_report: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = TaskId::from(id);
        self
    }
}

impl Task for MappingTask {
    type Output = MappingReport;

    fn id(&self) -> &TaskId {
        &self.id
    }

    fn context(&self) -> &Conversation {
        &self.context
    }

    fn context_mut(&mut self) -> &mut Conversation {
        &mut self.context
    }

    fn result(&self) -> Option<&MappingReport> {
        self.mapping_report.as_ref()
    }

    fn result_slot(&mut self) -> &mut Option<MappingReport> {
        &mut self.mapping_report
    }

    fn tool_key(&self) -> &str {
        CREATE_MAPPING_REPORT
    }

    fn snapshot(&self) -> serde_json::Value {
        json!({
            "task_id": self.id,
            "source_json": self.source_json,
            "target_schema": self.target_schema,
            "context": self.context,
            "mapping_report": self.mapping_report,
        })
    }
}

/// Generate the module that converts the source document, given the
/// mappings found in the first phase.
#[derive(Debug, Clone)]
pub struct TransformTask {
    pub id: TaskId,
    pub context: Conversation,
    pub source_json: String,
    pub target_schema: String,
    pub mappings: Vec<FieldMapping>,
    pub transform_code: Option<TransformCode>,
}

impl TransformTask {
    pub fn new(
        source_json: impl Into<String>,
        target_schema: impl Into<String>,
        mappings: Vec<FieldMapping>,
    ) -> Self {
        Self {
            id: TaskId::new(),
            context: Conversation::new(),
            source_json: source_json.into(),
            target_schema: target_schema.into(),
            mappings,
            transform_code: None,
        }
    }

    /// Start the transform phase from a completed mapping task.
    ///
    /// The new task gets a fresh context; only the inputs and the mappings
    /// carry over.
    pub fn from_mapping(mapping: &MappingTask) -> Result<Self, TransformerError> {
        let report = mapping
            .mapping_report
            .as_ref()
            .ok_or_else(|| TransformerError::MissingMapping(mapping.id.to_string()))?;

        Ok(Self::new(
            mapping.source_json.clone(),
            mapping.target_schema.clone(),
            report.mappings.clone(),
        ))
    }
}

impl Task for TransformTask {
    type Output = TransformCode;

    fn id(&self) -> &TaskId {
        &self.id
    }

    fn context(&self) -> &Conversation {
        &self.context
    }

    fn context_mut(&mut self) -> &mut Conversation {
        &mut self.context
    }

    fn result(&self) -> Option<&TransformCode> {
        self.transform_code.as_ref()
    }

    fn result_slot(&mut self) -> &mut Option<TransformCode> {
        &mut self.transform_code
    }

    fn tool_key(&self) -> &str {
        GENERATE_TRANSFORM_CODE
    }

    fn snapshot(&self) -> serde_json::Value {
        json!({
            "task_id": self.id,
            "source_json": self.source_json,
            "target_schema": self.target_schema,
            "mappings": self.mappings,
            "context": self.context,
            "transform_code": self.transform_code,
        })
    }
}
