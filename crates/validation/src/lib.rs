//! Validation of generated artifacts.
//!
//! A generated artifact is a WebAssembly text module. Before its output is
//! trusted it goes through four ordered stages, stopping at the first
//! failure:
//!
//! 1. **Syntax** — parse and compile the module
//! 2. **Resolve** — find the entry point, instantiate, bind memory and allocator
//! 3. **Invoke** — run the entry point on the original input inside the sandbox
//! 4. **Output shape** — the output must be a JSON object
//!
//! Every run produces a [`ValidationReport`]; failures never escape as
//! errors.
//!
//! # Artifact interface
//!
//! ```wat
//! (memory (export "memory") 1)
//! (func (export "alloc") (param i32) (result i32))
//! (func (export "transform") (param i32 i32) (result i32))
//! ```
//!
//! The entry point receives a pointer + length to the UTF-8 input and returns
//! a pointer to a NUL-terminated UTF-8 JSON string.

pub mod error;
pub mod pipeline;
pub mod report;
pub mod sandbox;
pub mod validator;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{Stage, ValidationError};
pub use pipeline::ArtifactPipeline;
pub use report::{ReportEntry, Severity, ValidationReport};
pub use sandbox::{ArtifactLimits, EntryPoint, Sandbox, WasmEntryPoint, WasmSandbox};
pub use validator::Validator;
