//! Expert orchestration — one forced structured answer per invocation.
//!
//! An invocation runs a fixed sequence:
//!
//! 1. **Build** the inference request from the task (seeding the system
//!    prompt on first use)
//! 2. **Infer** through the [`InferenceEngine`]
//! 3. **Validate** that the response carries at least one tool call
//! 4. **Select** one call according to the [`ToolCallSelection`] policy
//! 5. **Execute** the selected tool from the expert's bundle
//! 6. **Commit** the typed result and the exchange into the task's context
//!
//! [`correction::invoke_with_validation`] wraps this in a bounded
//! validate-and-retry loop for experts whose output must pass a validator.

pub mod correction;
pub mod expert;
pub mod inference;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use correction::{CorrectionOutcome, invoke_with_validation};
pub use expert::{Expert, ToolCallSelection};
pub use inference::InferenceEngine;
