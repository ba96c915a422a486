//! Values produced by the two phases.

use serde::{Deserialize, Serialize};

/// One source path feeding one target path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Dot-delimited path in the source document, e.g. `user.email`.
    pub source_path: String,
    /// Dot-delimited path in the target schema, e.g. `contact.email_address`.
    pub target_path: String,
    pub rationale: String,
}

/// Output of the mapping phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingReport {
    pub mappings: Vec<FieldMapping>,
    /// Short description of what kind of data the source is.
    pub data_type_analysis: String,
}

impl MappingReport {
    pub fn target_paths(&self) -> impl Iterator<Item = &str> {
        self.mappings.iter().map(|m| m.target_path.as_str())
    }
}

/// Output of the transform phase: a WebAssembly text module split into its
/// supporting declarations and its entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformCode {
    /// Memory, data segments, globals and helper functions.
    pub dependency_setup: String,
    /// The exported entry point function.
    pub transform_logic: String,
    pub rationale: String,
}

impl TransformCode {
    /// The complete module text handed to the sandbox.
    ///
    /// Both parts are joined in order. If the result is not already a
    /// `(module ...)` form it is wrapped in one.
    pub fn module_source(&self) -> String {
        let body = [self.dependency_setup.trim(), self.transform_logic.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if body.starts_with("(module") {
            body
        } else {
            format!("(module\n{body}\n)")
        }
    }
}
