//! JSON transformer expert.
//!
//! Turns a source JSON document into one matching a target schema in two
//! phases:
//!
//! 1. **Mapping**: a sampled expert identifies which source paths feed which
//!    target paths and produces a [`MappingReport`].
//! 2. **Transform**: a deterministic expert sees only the mapped part of the
//!    target schema and generates a WebAssembly text module ([`TransformCode`])
//!    that performs the conversion. The module is run in the validation
//!    sandbox against the source document; failures are fed back until it
//!    passes or the attempt budget runs out.

pub mod error;
pub mod experts;
pub mod models;
pub mod prompts;
pub mod task;
pub mod tools;
pub mod validator;
pub mod workflow;

pub use error::TransformerError;
pub use experts::{mapping_expert, model_for, transform_expert};
pub use models::{FieldMapping, MappingReport, TransformCode};
pub use prompts::filter_schema;
pub use task::{MappingTask, TransformTask};
pub use tools::{mapping_tool_bundle, transform_tool_bundle};
pub use validator::TransformCodeValidator;
pub use workflow::{JsonTransformer, TransformOutcome};
