//! Task — the unit of work an expert fills in.
//!
//! A task owns its input, its conversation context and a result slot. Each
//! kind of work (mapping, transform, ...) is its own type implementing
//! [`Task`]; orchestration code is generic over the trait.

use std::any::Any;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TaskError;
use crate::inference::InferenceRequest;
use crate::message::Conversation;
use crate::tool::ToolOutput;

/// Unique identifier for a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of work with input, conversation state and a typed result slot.
///
/// Tasks are owned by one orchestration flow at a time and are not meant to
/// be shared across threads while being mutated.
pub trait Task: Send {
    /// The value the expert's tool produces for this task.
    type Output: Any + Send + Serialize;

    fn id(&self) -> &TaskId;

    fn context(&self) -> &Conversation;

    fn context_mut(&mut self) -> &mut Conversation;

    /// The current result, `None` until an invocation has filled it.
    fn result(&self) -> Option<&Self::Output>;

    /// Mutable access to the result slot, used by [`Task::set_result`].
    fn result_slot(&mut self) -> &mut Option<Self::Output>;

    /// Name of the structured tool whose output fills the result.
    fn tool_key(&self) -> &str;

    /// Structured snapshot for logging. Must include the full context and the
    /// result, as an explicit `null` when absent.
    fn snapshot(&self) -> serde_json::Value;

    /// Store a tool's output as the result.
    ///
    /// Fails with [`TaskError::TypeMismatch`] if the output is not
    /// `Self::Output`; the previous result is left untouched in that case.
    fn set_result(&mut self, output: ToolOutput) -> Result<(), TaskError> {
        let value = output.downcast::<Self::Output>()?;
        *self.result_slot() = Some(value);
        Ok(())
    }

    /// Project the task into a read-only inference request.
    fn to_inference_request(&self) -> InferenceRequest {
        InferenceRequest::new(self.id().clone(), self.context().messages().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[derive(Debug, PartialEq, Serialize)]
    struct Summary {
        text: String,
    }

    struct SummaryTask {
        id: TaskId,
        context: Conversation,
        document: String,
        summary: Option<Summary>,
    }

    impl SummaryTask {
        fn new(document: &str) -> Self {
            Self {
                id: TaskId::from("summary-1"),
                context: Conversation::new(),
                document: document.into(),
                summary: None,
            }
        }
    }

    impl Task for SummaryTask {
        type Output = Summary;

        fn id(&self) -> &TaskId {
            &self.id
        }
        fn context(&self) -> &Conversation {
            &self.context
        }
        fn context_mut(&mut self) -> &mut Conversation {
            &mut self.context
        }
        fn result(&self) -> Option<&Summary> {
            self.summary.as_ref()
        }
        fn result_slot(&mut self) -> &mut Option<Summary> {
            &mut self.summary
        }
        fn tool_key(&self) -> &str {
            "WriteSummary"
        }
        fn snapshot(&self) -> serde_json::Value {
            serde_json::json!({
                "task_id": self.id,
                "document": self.document,
                "context": self.context,
                "summary": self.summary,
            })
        }
    }

    #[test]
    fn result_absent_until_set() {
        let mut task = SummaryTask::new("doc");
        assert!(task.result().is_none());

        let output = ToolOutput::new(Summary { text: "short".into() }).unwrap();
        task.set_result(output).unwrap();
        assert_eq!(task.result().map(|s| s.text.as_str()), Some("short"));
    }

    #[test]
    fn mismatched_type_keeps_prior_result() {
        let mut task = SummaryTask::new("doc");
        task.set_result(ToolOutput::new(Summary { text: "first".into() }).unwrap())
            .unwrap();

        let err = task
            .set_result(ToolOutput::new("not a summary".to_string()).unwrap())
            .unwrap_err();
        assert!(matches!(err, TaskError::TypeMismatch { expected: "Summary", actual: "String" }));
        assert_eq!(task.result().map(|s| s.text.as_str()), Some("first"));
    }

    #[test]
    fn second_set_overwrites() {
        let mut task = SummaryTask::new("doc");
        task.set_result(ToolOutput::new(Summary { text: "a".into() }).unwrap()).unwrap();
        task.set_result(ToolOutput::new(Summary { text: "b".into() }).unwrap()).unwrap();
        assert_eq!(task.result().map(|s| s.text.as_str()), Some("b"));
    }

    #[test]
    fn empty_snapshot_has_explicit_null_result() {
        let task = SummaryTask::new("doc");
        let snapshot = task.snapshot();
        let obj = snapshot.as_object().unwrap();
        assert!(obj.contains_key("summary"));
        assert!(obj["summary"].is_null());
        assert_eq!(obj["context"], serde_json::json!([]));
    }

    #[test]
    fn inference_request_copies_context() {
        let mut task = SummaryTask::new("doc");
        task.context_mut().push(Message::system("summarize"));
        let request = task.to_inference_request();
        assert_eq!(request.task_id, TaskId::from("summary-1"));
        assert_eq!(request.context.len(), 1);

        task.context_mut().push(Message::user("more"));
        assert_eq!(request.context.len(), 1);
    }
}
