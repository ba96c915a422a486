//! Error types for the expertkit domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for expertkit operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Task errors ---
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    // --- Inference errors ---
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    // --- Expert errors ---
    #[error("Expert error: {0}")]
    Expert(#[from] ExpertError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Arguments did not match the tool's parameter schema.
    #[error("Arguments for {tool_name} violate its schema: {reason}")]
    SchemaViolation { tool_name: String, reason: String },

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    /// The tool produced a value that cannot be snapshotted for logging.
    #[error("Tool output of {tool_name} is not serializable: {reason}")]
    UnserializableOutput { tool_name: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum TaskError {
    #[error("Result type mismatch: task expects {expected}, tool produced {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    /// One invocation failed, so the whole batch failed.
    #[error("Invocation for task {task_id} failed: {source}")]
    Invocation {
        task_id: String,
        #[source]
        source: ProviderError,
    },
}

#[derive(Debug, Error)]
pub enum ExpertError {
    #[error("The model did not produce a tool call. Final message: {content}")]
    NoToolCallProduced { content: String },

    #[error("The model produced {count} tool calls but the selection policy accepts exactly one")]
    MultipleToolCalls { count: usize },

    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Raised by the tool itself; passed through untouched.
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("Inference returned no result for task {0}")]
    MissingResult(String),
}
