//! The artifact validation pipeline.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Stage, ValidationError};
use crate::report::{Severity, ValidationReport};
use crate::sandbox::{ArtifactLimits, EntryPoint, Sandbox, WasmSandbox};

/// Runs an artifact through syntax, resolve, invoke and output-shape stages.
///
/// Stages run in order and the first failure stops the run; later stages
/// are never attempted. The outcome is always a [`ValidationReport`].
#[derive(Debug)]
pub struct ArtifactPipeline<S = WasmSandbox> {
    sandbox: S,
    entry_point: String,
}

impl ArtifactPipeline<WasmSandbox> {
    /// A pipeline running artifacts in wasmtime with the given limits.
    pub fn wasm(limits: ArtifactLimits, entry_point: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self::new(WasmSandbox::new(limits)?, entry_point))
    }
}

impl<S: Sandbox> ArtifactPipeline<S> {
    pub fn new(sandbox: S, entry_point: impl Into<String>) -> Self {
        Self {
            sandbox,
            entry_point: entry_point.into(),
        }
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn sandbox(&self) -> &S {
        &self.sandbox
    }

    /// Validate `source` by running it on `input`.
    ///
    /// The report's input snapshot is `input` parsed as JSON, or the raw text
    /// when it does not parse.
    pub fn validate(&self, source: &str, input: &str) -> ValidationReport {
        let snapshot = serde_json::from_str(input).unwrap_or_else(|_| Value::String(input.to_string()));
        let mut report = ValidationReport::new(snapshot);

        match self.run_stages(source, input, &mut report) {
            Ok(output) => {
                report.append("Artifact passed all validation stages", Severity::Info);
                report.pass(output);
            }
            Err(err) => {
                report.append(format!("{} stage failed: {err}", err.stage()), Severity::Error);
            }
        }
        report
    }

    fn run_stages(
        &self,
        source: &str,
        input: &str,
        report: &mut ValidationReport,
    ) -> Result<Map<String, Value>, ValidationError> {
        let module = self.sandbox.compile(source)?;
        report.append(format!("{}: artifact parsed and compiled", Stage::Syntax), Severity::Info);

        let mut entry = self.sandbox.resolve(&module, &self.entry_point)?;
        report.append(
            format!("{}: entry point '{}' bound", Stage::Resolve, self.entry_point),
            Severity::Info,
        );

        let raw = entry.call(input)?;
        debug!(entry_point = %self.entry_point, output_len = raw.len(), "Artifact produced output");
        report.append(format!("{}: entry point returned", Stage::Invoke), Severity::Info);

        check_output_shape(&raw)
    }
}

/// The output must be a JSON object. Deeper schema conformance is not checked.
pub fn check_output_shape(raw: &str) -> Result<Map<String, Value>, ValidationError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ValidationError::OutputShapeMismatch(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(ValidationError::OutputShapeMismatch(format!("output is not valid JSON: {e}"))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
