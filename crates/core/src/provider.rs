//! Provider trait — the abstraction over LLM transport backends.
//!
//! A Provider knows how to send a conversation to an LLM and get a response
//! back. Experts never talk to a provider directly; they go through a
//! [`LanguageModel`](crate::model::LanguageModel), usually a
//! [`BoundModel`](crate::model::BoundModel) wrapping a provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-4o")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Structured-output contracts the model may answer with
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// How strongly the model is pushed towards the tools
    #[serde(default)]
    pub tool_choice: ToolChoice,
}

fn default_temperature() -> f32 {
    0.7
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// Tool selection mode passed through to the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "name")]
pub enum ToolChoice {
    /// The model answers with free text or one of the tools.
    #[default]
    Auto,
    /// The model must call one of the tools.
    Required,
    /// The model must call the named tool.
    Tool(String),
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. Wire-format types stay inside
/// the implementation; only [`Message`] crosses this boundary.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_choice_defaults_to_auto() {
        assert_eq!(ToolChoice::default(), ToolChoice::Auto);
    }

    #[test]
    fn tool_choice_serialization() {
        let json = serde_json::to_value(ToolChoice::Tool("GenerateTransformCode".into())).unwrap();
        assert_eq!(json["mode"], "tool");
        assert_eq!(json["name"], "GenerateTransformCode");

        let parsed: ToolChoice = serde_json::from_str(r#"{"mode":"required"}"#).unwrap();
        assert_eq!(parsed, ToolChoice::Required);
    }

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "CreateMappingReport".into(),
            description: "Report field mappings".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "mappings": { "type": "array" }
                },
                "required": ["mappings"]
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("CreateMappingReport"));
        assert!(json.contains("mappings"));
    }
}
