use async_trait::async_trait;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        CreateChatCompletionRequestArgs,
    },
    Client,
};

use crate::config::ChatModelConfig;
use crate::error::{Result, VoiceForgeError};
use crate::interfaces::providers::LlmProvider;

/// Chat-completion provider for any OpenAI-compatible endpoint. The
/// original deployment pointed this at DeepSeek; the base URL override
/// keeps that working unchanged.
#[derive(Clone)]
pub struct OpenAiProvider {
    model: String,
    client: Client<OpenAIConfig>,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| "deepseek-chat".to_string());
        let base_url = base_url.unwrap_or_else(|| "https://api.deepseek.com/v1".to_string());
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        Self {
            model,
            client: Client::with_config(config),
        }
    }

    pub fn from_config(config: &ChatModelConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| VoiceForgeError::Config("chat api key is required".to_string()))?;
        Ok(Self::new(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
        ))
    }

    fn build_system_message(system_prompt: &str) -> Result<Option<ChatCompletionRequestMessage>> {
        if system_prompt.is_empty() {
            return Ok(None);
        }
        let message = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt)
            .build()
            .map_err(|e| VoiceForgeError::Runtime(e.to_string()))?;
        Ok(Some(ChatCompletionRequestMessage::System(message)))
    }

    fn build_user_text_message(prompt: &str) -> Result<ChatCompletionRequestMessage> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Text(
                prompt.to_string(),
            ))
            .build()
            .map_err(|e| VoiceForgeError::Runtime(e.to_string()))?;
        Ok(ChatCompletionRequestMessage::User(message))
    }

    fn extract_text_from_response(
        response: &async_openai::types::chat::CreateChatCompletionResponse,
    ) -> Result<String> {
        let message = response
            .choices
            .first()
            .ok_or_else(|| VoiceForgeError::Runtime("No choices returned".to_string()))?
            .message
            .content
            .clone()
            .unwrap_or_default();
        Ok(message)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        let mut messages = Vec::new();
        if let Some(system) = Self::build_system_message(system_prompt)? {
            messages.push(system);
        }
        messages.push(Self::build_user_text_message(prompt)?);

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.clone())
            .messages(messages)
            .temperature(0.7)
            .build()
            .map_err(|e| VoiceForgeError::Runtime(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| VoiceForgeError::Http(e.to_string()))?;
        Self::extract_text_from_response(&response)
    }
}
