//! Expert definitions for both phases.

use std::sync::Arc;

use expertkit_config::ExpertProfile;
use expertkit_core::model::{BoundModel, LanguageModel};
use expertkit_core::provider::{Provider, ToolChoice};
use expertkit_core::tool::ToolBundle;
use expertkit_expert::Expert;

use crate::prompts::{mapping_prompt, transform_prompt};
use crate::task::{MappingTask, TransformTask};
use crate::tools::{mapping_tool_bundle, transform_tool_bundle};

/// Bind `provider` to a profile's model and sampling settings and to the
/// bundle's tools.
///
/// A single-tool bundle forces that tool; otherwise any bundled tool is
/// required.
pub fn model_for(profile: &ExpertProfile, provider: Arc<dyn Provider>, tools: &ToolBundle) -> BoundModel {
    let choice = match tools.names().as_slice() {
        [only] => ToolChoice::Tool(only.to_string()),
        _ => ToolChoice::Required,
    };

    BoundModel::new(provider, profile.model.clone())
        .with_temperature(profile.temperature)
        .with_max_tokens(profile.max_tokens)
        .bind_tools(tools.definitions())
        .with_tool_choice(choice)
}

pub fn mapping_expert(model: Arc<dyn LanguageModel>) -> Expert<MappingTask> {
    Expert::new("json_mapping", model, mapping_prompt, mapping_tool_bundle())
}

pub fn transform_expert(model: Arc<dyn LanguageModel>, entry_point: &str) -> Expert<TransformTask> {
    Expert::new(
        "json_transform",
        model,
        transform_prompt(entry_point),
        transform_tool_bundle(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{CREATE_MAPPING_REPORT, GENERATE_TRANSFORM_CODE};
    use async_trait::async_trait;
    use expertkit_core::error::ProviderError;
    use expertkit_core::message::Message;
    use expertkit_core::provider::{ProviderRequest, ProviderResponse};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProvider {
        last: Mutex<Option<ProviderRequest>>,
    }

    #[async_trait]
    impl Provider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            *self.last.lock().unwrap() = Some(request);
            Ok(ProviderResponse {
                message: Message::assistant("ok"),
                usage: None,
                model: "recorded".into(),
            })
        }
    }

    #[tokio::test]
    async fn profile_settings_and_forced_tool_reach_the_provider() {
        let provider = Arc::new(RecordingProvider::default());
        let model = model_for(&ExpertProfile::transform(), provider.clone(), &transform_tool_bundle());

        model.invoke(&[Message::system("go")]).await.unwrap();

        let request = provider.last.lock().unwrap().take().unwrap();
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.max_tokens, Some(16_000));
        assert_eq!(request.tools.len(), 1);
        assert_eq!(request.tool_choice, ToolChoice::Tool(GENERATE_TRANSFORM_CODE.into()));
    }

    #[test]
    fn experts_carry_their_phase_tool() {
        let provider: Arc<dyn Provider> = Arc::new(RecordingProvider::default());
        let bundle = mapping_tool_bundle();
        let model = Arc::new(model_for(&ExpertProfile::mapping(), provider, &bundle));

        let mapping = mapping_expert(model.clone());
        assert_eq!(mapping.tools().names(), [CREATE_MAPPING_REPORT]);

        let transform = transform_expert(model, "transform");
        assert_eq!(transform.tools().names(), [GENERATE_TRANSFORM_CODE]);
        assert_eq!(transform.name(), "json_transform");
    }
}
