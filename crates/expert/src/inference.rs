//! Inference engine — turns requests into model invocations.

use expertkit_core::error::InferenceError;
use expertkit_core::inference::{InferenceRequest, InferenceResult};
use expertkit_core::model::LanguageModel;
use futures::future::try_join_all;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, warn};

/// Dispatches batches of inference requests against one model.
///
/// Results come back in request order whatever order the invocations finish
/// in. A batch is all-or-nothing: the first failure fails the whole call and
/// no partial results are returned.
#[derive(Debug, Clone, Default)]
pub struct InferenceEngine {
    max_concurrency: Option<usize>,
}

impl InferenceEngine {
    /// An engine that dispatches every request of a batch at once.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of invocations in flight. Zero is treated as one.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit.max(1));
        self
    }

    pub fn max_concurrency(&self) -> Option<usize> {
        self.max_concurrency
    }

    /// Run all requests and return one result per request, in order.
    pub async fn infer(
        &self,
        model: &dyn LanguageModel,
        requests: Vec<InferenceRequest>,
    ) -> Result<Vec<InferenceResult>, InferenceError> {
        debug!(
            batch = requests.len(),
            max_concurrency = ?self.max_concurrency,
            "Dispatching inference batch"
        );

        let calls = requests.into_iter().map(|request| invoke_one(model, request));

        match self.max_concurrency {
            None => try_join_all(calls).await,
            Some(limit) => stream::iter(calls).buffered(limit).try_collect().await,
        }
    }
}

async fn invoke_one(
    model: &dyn LanguageModel,
    request: InferenceRequest,
) -> Result<InferenceResult, InferenceError> {
    debug!(task_id = %request.task_id, request = %request.snapshot(), "Invoking model");

    match model.invoke(&request.context).await {
        Ok(response) => {
            let result = InferenceResult {
                task_id: request.task_id,
                response,
            };
            debug!(task_id = %result.task_id, result = %result.snapshot(), "Model responded");
            Ok(result)
        }
        Err(source) => {
            warn!(task_id = %request.task_id, error = %source, "Model invocation failed");
            Err(InferenceError::Invocation {
                task_id: request.task_id.to_string(),
                source,
            })
        }
    }
}
