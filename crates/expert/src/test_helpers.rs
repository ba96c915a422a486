//! Shared test helpers for expert tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use expertkit_core::error::ProviderError;
use expertkit_core::message::{Message, MessageToolCall};
use expertkit_core::model::LanguageModel;
use expertkit_core::task::{Task, TaskId};
use expertkit_core::message::Conversation;
use serde::Serialize;

/// A mock model that returns a sequence of scripted responses.
///
/// Each call to `invoke` returns the next response in the queue and records
/// the context it was given. Panics if more calls are made than responses
/// provided.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<Message, ProviderError>>>,
    contexts: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<Message>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<Result<Message, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(results.into()),
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.contexts.lock().unwrap().len()
    }

    /// The context passed to each call, in call order.
    pub fn contexts(&self) -> Vec<Vec<Message>> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn invoke(&self, context: &[Message]) -> Result<Message, ProviderError> {
        self.contexts.lock().unwrap().push(context.to_vec());
        let mut responses = self.responses.lock().unwrap();
        responses.pop_front().unwrap_or_else(|| {
            panic!("ScriptedModel: no more responses (call #{})", self.call_count())
        })
    }
}

/// A model that waits for the number of milliseconds named in the first
/// message, then echoes it back. Tracks peak concurrency.
#[derive(Default)]
pub struct DelayedEchoModel {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl DelayedEchoModel {
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for DelayedEchoModel {
    async fn invoke(&self, context: &[Message]) -> Result<Message, ProviderError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let label = context.first().map(|m| m.content().to_string()).unwrap_or_default();
        if label == "fail" {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            return Err(ProviderError::ApiError {
                status_code: 500,
                message: "scripted failure".into(),
            });
        }
        let millis: u64 = label.parse().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(millis)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(Message::assistant(label))
    }
}

/// Helper to create a tool call.
pub fn make_tool_call(id: &str, name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall::new(id, name, args)
}

/// A response carrying the given tool calls.
pub fn tool_call_response(calls: Vec<MessageToolCall>) -> Message {
    Message::assistant_with_tool_calls("", calls)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub label: String,
    pub score: u32,
}

/// A minimal task whose tool produces a [`Verdict`].
#[derive(Debug)]
pub struct VerdictTask {
    pub id: TaskId,
    pub context: Conversation,
    pub claim: String,
    pub verdict: Option<Verdict>,
}

impl VerdictTask {
    pub fn new(id: &str, claim: &str) -> Self {
        Self {
            id: TaskId::from(id),
            context: Conversation::new(),
            claim: claim.into(),
            verdict: None,
        }
    }
}

impl Task for VerdictTask {
    type Output = Verdict;

    fn id(&self) -> &TaskId {
        &self.id
    }
    fn context(&self) -> &Conversation {
        &self.context
    }
    fn context_mut(&mut self) -> &mut Conversation {
        &mut self.context
    }
    fn result(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }
    fn result_slot(&mut self) -> &mut Option<Verdict> {
        &mut self.verdict
    }
    fn tool_key(&self) -> &str {
        "GiveVerdict"
    }
    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "task_id": self.id,
            "claim": self.claim,
            "context": self.context,
            "verdict": self.verdict,
        })
    }
}
