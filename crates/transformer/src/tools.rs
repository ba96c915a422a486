//! Structured tools for both phases.
//!
//! The argument structs are the model-facing schemas; their doc comments
//! become the parameter descriptions the model sees. Each native function
//! converts arguments into the domain models in [`crate::models`].

use expertkit_core::error::ToolError;
use expertkit_core::tool::{ToolBundle, TypedTool};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::models::{FieldMapping, MappingReport, TransformCode};

pub const CREATE_MAPPING_REPORT: &str = "CreateMappingReport";
pub const GENERATE_TRANSFORM_CODE: &str = "GenerateTransformCode";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FieldMappingInput {
    /// Dot-delimited path in the source JSON (e.g., 'user.email'). Must be an
    /// exact path that exists in the source data.
    pub source_path: String,
    /// Dot-delimited path in the target schema (e.g., 'contact.email_address').
    /// Must match a field defined in the target schema.
    pub target_path: String,
    /// A clear explanation of why this mapping makes sense. Explain the
    /// semantic relationship between source and target fields.
    pub rationale: String,
}

/// Create a report of field mappings between source JSON and target schema.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateMappingReport {
    /// List of identified field mappings. Include ALL fields that can be
    /// meaningfully mapped from source to target.
    pub mappings: Vec<FieldMappingInput>,
    /// Brief analysis of the source data type and structure. What kind of
    /// data is this? (e.g., 'User login event', 'E-commerce transaction')
    pub data_type_analysis: String,
}

/// Generate a WebAssembly text module that transforms the source JSON into
/// the target schema format.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateTransformCode {
    /// Module-level declarations the entry point needs: the exported memory,
    /// the exported 'alloc' function, data segments, globals and helper
    /// functions. Keep it minimal.
    pub dependency_setup: String,
    /// The exported entry point function. It takes (ptr, len) of the UTF-8
    /// source JSON and returns a pointer to a NUL-terminated UTF-8 JSON
    /// object matching the target schema.
    pub transform_logic: String,
    /// Explanation of the transformation approach. Describe any data type
    /// conversions, format changes, or special handling.
    pub rationale: String,
}

fn reject(tool_name: &str, reason: impl Into<String>) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: tool_name.to_string(),
        reason: reason.into(),
    }
}

pub fn create_mapping_report(args: CreateMappingReport) -> Result<MappingReport, ToolError> {
    let mut mappings = Vec::with_capacity(args.mappings.len());
    for (i, m) in args.mappings.into_iter().enumerate() {
        if m.source_path.trim().is_empty() || m.target_path.trim().is_empty() {
            return Err(reject(
                CREATE_MAPPING_REPORT,
                format!("mapping {i} has an empty source or target path"),
            ));
        }
        mappings.push(FieldMapping {
            source_path: m.source_path,
            target_path: m.target_path,
            rationale: m.rationale,
        });
    }

    Ok(MappingReport {
        mappings,
        data_type_analysis: args.data_type_analysis,
    })
}

pub fn generate_transform_code(args: GenerateTransformCode) -> Result<TransformCode, ToolError> {
    if args.transform_logic.trim().is_empty() {
        return Err(reject(GENERATE_TRANSFORM_CODE, "transform_logic must not be empty"));
    }

    Ok(TransformCode {
        dependency_setup: args.dependency_setup,
        transform_logic: args.transform_logic,
        rationale: args.rationale,
    })
}

pub fn mapping_tool_bundle() -> ToolBundle {
    ToolBundle::new(TypedTool::new(
        CREATE_MAPPING_REPORT,
        "Create a report of field mappings between source JSON and target schema.",
        create_mapping_report,
    ))
}

pub fn transform_tool_bundle() -> ToolBundle {
    ToolBundle::new(TypedTool::new(
        GENERATE_TRANSFORM_CODE,
        "Generate a WebAssembly text module that transforms the source JSON into the target schema format.",
        generate_transform_code,
    ))
}
