//! Inference request/result pair exchanged with the inference engine.
//!
//! Requests and results correlate strictly by `task_id`.

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::task::TaskId;

/// Input to the inference engine: a snapshot of one task's context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub task_id: TaskId,
    pub context: Vec<Message>,
}

impl InferenceRequest {
    pub fn new(task_id: TaskId, context: Vec<Message>) -> Self {
        Self { task_id, context }
    }

    /// Serialize for logging/debugging.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "task_id": self.task_id,
            "context": self.context,
        })
    }
}

/// Output of the inference engine for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceResult {
    pub task_id: TaskId,
    pub response: Message,
}

impl InferenceResult {
    /// Serialize for logging/debugging.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "task_id": self.task_id,
            "response": self.response,
        })
    }
}
