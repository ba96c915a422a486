//! # expertkit core
//!
//! Domain types, traits, and error definitions for expert orchestration.
//! This crate knows nothing about any particular LLM provider — it defines
//! the model that the expert, validation and provider crates build on.
//!
//! ## Design Philosophy
//!
//! Every seam is a trait here: the transport ([`Provider`]), the invocation
//! capability ([`LanguageModel`]), structured tools ([`StructuredTool`]) and
//! units of work ([`Task`]). Implementations live in their own crates, and
//! tests swap them for scripted stand-ins.

pub mod error;
pub mod inference;
pub mod message;
pub mod model;
pub mod provider;
pub mod task;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ExpertError, InferenceError, ProviderError, TaskError, ToolError};
pub use inference::{InferenceRequest, InferenceResult};
pub use message::{Conversation, Message, MessageToolCall, Role};
pub use model::{BoundModel, LanguageModel};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolChoice, ToolDefinition, Usage};
pub use task::{Task, TaskId};
pub use tool::{StructuredTool, ToolBundle, ToolOutput, TypedTool};
