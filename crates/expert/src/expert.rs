//! The expert invocation orchestrator.

use std::sync::Arc;

use expertkit_core::error::ExpertError;
use expertkit_core::inference::InferenceRequest;
use expertkit_core::message::{Message, MessageToolCall};
use expertkit_core::model::LanguageModel;
use expertkit_core::task::Task;
use expertkit_core::tool::ToolBundle;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::inference::InferenceEngine;

/// Content of the tool-result message committed after a successful call.
const TOOL_RESULT_ACK: &str = "Executed the expert task";

/// Which tool call to honour when the model returns several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallSelection {
    /// Execute the final call; earlier ones are treated as visible reasoning.
    #[default]
    Last,
    First,
    /// Fail with [`ExpertError::MultipleToolCalls`] unless there is exactly one.
    RejectMultiple,
}

impl ToolCallSelection {
    pub fn select<'a>(&self, calls: &'a [MessageToolCall]) -> Result<&'a MessageToolCall, ExpertError> {
        let selected = match self {
            Self::Last => calls.last(),
            Self::First => calls.first(),
            Self::RejectMultiple if calls.len() > 1 => {
                return Err(ExpertError::MultipleToolCalls { count: calls.len() });
            }
            Self::RejectMultiple => calls.first(),
        };
        selected.ok_or_else(|| ExpertError::NoToolCallProduced {
            content: String::new(),
        })
    }
}

type PromptFactory<T> = Arc<dyn Fn(&T) -> Message + Send + Sync>;

/// A language model bound to a prompt factory and one task tool.
///
/// The expert is stateless across invocations: everything an invocation
/// learns is committed into the task it was given.
pub struct Expert<T: Task> {
    name: String,
    model: Arc<dyn LanguageModel>,
    prompt: PromptFactory<T>,
    tools: ToolBundle,
    engine: InferenceEngine,
    selection: ToolCallSelection,
}

impl<T: Task> Expert<T> {
    pub fn new(
        name: impl Into<String>,
        model: Arc<dyn LanguageModel>,
        prompt: impl Fn(&T) -> Message + Send + Sync + 'static,
        tools: ToolBundle,
    ) -> Self {
        Self {
            name: name.into(),
            model,
            prompt: Arc::new(prompt),
            tools,
            engine: InferenceEngine::new(),
            selection: ToolCallSelection::default(),
        }
    }

    pub fn with_engine(mut self, engine: InferenceEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_selection(mut self, selection: ToolCallSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tools(&self) -> &ToolBundle {
        &self.tools
    }

    pub fn selection(&self) -> ToolCallSelection {
        self.selection
    }

    /// Project the task into an inference request, seeding the system prompt
    /// if the task's context is still empty.
    pub fn build_request(&self, task: &mut T) -> InferenceRequest {
        if task.context().is_empty() {
            let system = (self.prompt)(task);
            task.context_mut().push(system);
        }
        task.to_inference_request()
    }

    /// Drive one full invocation and return the task with its result filled.
    ///
    /// On any error the task's result and context are left as they were
    /// before the call, apart from a seeded system prompt.
    pub async fn invoke<'t>(&self, task: &'t mut T) -> Result<&'t mut T, ExpertError> {
        let request = self.build_request(task);
        info!(expert = %self.name, task_id = %task.id(), "Invoking expert");

        let response = self
            .engine
            .infer(self.model.as_ref(), vec![request])
            .await?
            .pop()
            .ok_or_else(|| ExpertError::MissingResult(task.id().to_string()))?
            .response;

        self.commit(task, response)?;
        Ok(task)
    }

    /// Invoke every task in one inference batch, then commit each response.
    ///
    /// Inference is all-or-nothing. Commits run in order and stop at the
    /// first failing task; tasks before it keep their new results.
    pub async fn invoke_batch(&self, tasks: &mut [T]) -> Result<(), ExpertError> {
        let requests = tasks.iter_mut().map(|task| self.build_request(task)).collect();
        info!(expert = %self.name, batch = tasks.len(), "Invoking expert on batch");

        let results = self.engine.infer(self.model.as_ref(), requests).await?;
        if results.len() != tasks.len() {
            let missing = tasks.get(results.len()).map(|t| t.id().to_string()).unwrap_or_default();
            return Err(ExpertError::MissingResult(missing));
        }

        for (task, result) in tasks.iter_mut().zip(results) {
            if result.task_id != *task.id() {
                return Err(ExpertError::MissingResult(task.id().to_string()));
            }
            self.commit(task, result.response)?;
        }
        Ok(())
    }

    fn commit(&self, task: &mut T, response: Message) -> Result<(), ExpertError> {
        if !response.has_tool_calls() {
            warn!(
                expert = %self.name,
                task_id = %task.id(),
                "Model answered without a tool call"
            );
            return Err(ExpertError::NoToolCallProduced {
                content: response.content().to_string(),
            });
        }

        let calls = response.tool_calls();
        let call = self.selection.select(calls)?.clone();
        if calls.len() > 1 {
            debug!(
                task_id = %task.id(),
                discarded = calls.len() - 1,
                selected = %call.name,
                "Multiple tool calls; applying selection policy"
            );
        }

        let output = self.tools.execute(&call.name, call.arguments.clone())?;
        task.set_result(output)?;

        // The acknowledgement names the task's tool even when a variant ran.
        let ack = Message::tool_result(call.id, task.tool_key(), TOOL_RESULT_ACK);
        task.context_mut().push(response);
        task.context_mut().push(ack);

        debug!(task_id = %task.id(), task = %task.snapshot(), "Committed expert result");
        Ok(())
    }
}

impl<T: Task> std::fmt::Debug for Expert<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expert")
            .field("name", &self.name)
            .field("tools", &self.tools)
            .field("engine", &self.engine)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}
