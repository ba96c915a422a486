//! The validation report — verdict plus ordered, human-readable entries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub message: String,
    pub severity: Severity,
}

/// Outcome of validating one artifact against one input.
///
/// `passed` stays false until every stage has succeeded. `output` is empty
/// until then. Entries are append-only and in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    input: Value,
    output: Map<String, Value>,
    entries: Vec<ReportEntry>,
    passed: bool,
}

impl ValidationReport {
    pub fn new(input: Value) -> Self {
        Self {
            input,
            output: Map::new(),
            entries: Vec::new(),
            passed: false,
        }
    }

    /// Record an entry and log it at the matching level.
    pub fn append(&mut self, message: impl Into<String>, severity: Severity) {
        let message = message.into();
        match severity {
            Severity::Info => info!(%message, "validation"),
            Severity::Warning => warn!(%message, "validation"),
            Severity::Error => error!(%message, "validation"),
        }
        self.entries.push(ReportEntry { message, severity });
    }

    /// Mark the report as passed with the artifact's output.
    pub fn pass(&mut self, output: Map<String, Value>) {
        self.output = output;
        self.passed = true;
    }

    pub fn input(&self) -> &Value {
        &self.input
    }

    pub fn output(&self) -> &Map<String, Value> {
        &self.output
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn errors(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| e.severity == Severity::Error)
    }

    /// All entries, one per line, for feeding back to a model or a user.
    pub fn feedback(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("- [{}] {}", e.severity, e.message))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
