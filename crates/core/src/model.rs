//! The invocation capability consumed by experts.
//!
//! A [`LanguageModel`] maps conversation state to one response message. It is
//! already bound to its structured-tool contracts, so every response is either
//! free text or one of those contracts' shapes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ProviderError;
use crate::message::Message;
use crate::provider::{Provider, ProviderRequest, ToolChoice, ToolDefinition};

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Invoke the model on an ordered context and return its response.
    async fn invoke(&self, context: &[Message]) -> std::result::Result<Message, ProviderError>;
}

/// A [`Provider`] bound to a model, sampling settings and a fixed tool set.
pub struct BoundModel {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    tools: Vec<ToolDefinition>,
    tool_choice: ToolChoice,
    timeout: Option<Duration>,
}

impl BoundModel {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            tools: Vec::new(),
            tool_choice: ToolChoice::Auto,
            timeout: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Bind the structured-tool contracts the model may answer with.
    pub fn bind_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = choice;
        self
    }

    /// Fail an invocation that takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }
}

impl std::fmt::Debug for BoundModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundModel")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("tools", &self.tools.iter().map(|t| &t.name).collect::<Vec<_>>())
            .field("tool_choice", &self.tool_choice)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl LanguageModel for BoundModel {
    async fn invoke(&self, context: &[Message]) -> std::result::Result<Message, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: context.to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tools.clone(),
            tool_choice: self.tool_choice.clone(),
        };

        debug!(
            provider = %self.provider.name(),
            model = %self.model,
            messages = context.len(),
            "Invoking bound model"
        );

        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.provider.complete(request))
                .await
                .map_err(|_| {
                    ProviderError::Timeout(format!("{} did not answer within {limit:?}", self.model))
                })??,
            None => self.provider.complete(request).await?,
        };

        Ok(response.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderResponse;
    use std::sync::Mutex;

    /// Records the last request and answers with a fixed message.
    struct RecordingProvider {
        last: Mutex<Option<ProviderRequest>>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl Provider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            *self.last.lock().unwrap() = Some(request);
            Ok(ProviderResponse {
                message: Message::assistant("ok"),
                usage: None,
                model: "recorded".into(),
            })
        }
    }

    #[tokio::test]
    async fn bound_model_forwards_tools_and_settings() {
        let provider = Arc::new(RecordingProvider {
            last: Mutex::new(None),
            delay: None,
        });
        let tool = ToolDefinition {
            name: "GenerateTransformCode".into(),
            description: "emit code".into(),
            parameters: serde_json::json!({"type": "object"}),
        };
        let model = BoundModel::new(provider.clone(), "gpt-4o")
            .with_temperature(0.0)
            .with_max_tokens(512)
            .bind_tools(vec![tool.clone()])
            .with_tool_choice(ToolChoice::Required);

        let response = model.invoke(&[Message::system("hi")]).await.unwrap();
        assert_eq!(response.content(), "ok");

        let request = provider.last.lock().unwrap().clone().unwrap();
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.max_tokens, Some(512));
        assert_eq!(request.tools, vec![tool]);
        assert_eq!(request.tool_choice, ToolChoice::Required);
        assert_eq!(request.messages.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_surfaces_as_provider_error() {
        let provider = Arc::new(RecordingProvider {
            last: Mutex::new(None),
            delay: Some(Duration::from_secs(30)),
        });
        let model = BoundModel::new(provider, "slow").with_timeout(Duration::from_secs(1));

        let err = model.invoke(&[Message::user("x")]).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
    }
}
