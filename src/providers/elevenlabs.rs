use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::config::{voice_id_for_style, VoiceVendorConfig};
use crate::domains::agent::VoiceStyle;
use crate::error::{Result, VoiceForgeError};
use crate::interfaces::providers::VoiceProvisioner;

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";

/// Provisions a conversational voice agent with ElevenLabs.
pub struct ElevenLabsProvisioner {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl ElevenLabsProvisioner {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &VoiceVendorConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| VoiceForgeError::Config("voice vendor api key is required".to_string()))?;
        Ok(Self::new(api_key, config.base_url.clone()))
    }
}

#[async_trait]
impl VoiceProvisioner for ElevenLabsProvisioner {
    async fn provision(
        &self,
        entity_name: &str,
        system_prompt: &str,
        voice_style: VoiceStyle,
    ) -> Result<Option<String>> {
        let voice_id = voice_id_for_style(voice_style);
        info!(entity_name, voice = voice_style.as_str(), "creating voice agent");

        let url = format!("{}/v1/convai/agents", self.base_url.trim_end_matches('/'));
        let body = json!({
            "name": format!("{entity_name} - Sales Agent"),
            "description": "An AI sales agent created from extracted profile data",
            "tts": {
                "voice_id": voice_id
            },
            "agent": {
                "prompt": {
                    "prompt": system_prompt
                },
                "language": "en",
                "first_message": format!("Hi there! I'm {entity_name}, your AI assistant. How can I help you today?")
            }
        });

        let response = self
            .client
            .post(url)
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VoiceForgeError::Http(format!("Voice agent request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| VoiceForgeError::Http(format!("Voice agent read failed: {e}")))?;
        if !status.is_success() {
            return Err(VoiceForgeError::Http(format!(
                "Voice agent creation failed ({status}): {body}"
            )));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| VoiceForgeError::Serialization(format!("Voice agent decode failed: {e}")))?;
        Ok(value
            .get("agent_id")
            .and_then(|v| v.as_str())
            .map(|id| id.to_string()))
    }
}
