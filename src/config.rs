use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domains::agent::VoiceStyle;
use crate::error::{Result, VoiceForgeError};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatModelConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VoiceVendorConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoreConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub table: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub chat: Option<ChatModelConfig>,
    pub voice: Option<VoiceVendorConfig>,
    pub store: Option<StoreConfig>,
}

impl Config {
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| VoiceForgeError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())
            .map_err(|e| VoiceForgeError::Config(e.to_string()))?;
        let value: Value =
            serde_json::from_str(&raw).map_err(|e| VoiceForgeError::Config(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn chat(&self) -> ChatModelConfig {
        self.chat.clone().unwrap_or_default()
    }

    pub fn voice(&self) -> VoiceVendorConfig {
        self.voice.clone().unwrap_or_default()
    }

    pub fn store(&self) -> StoreConfig {
        self.store.clone().unwrap_or_default()
    }
}

/// Fixed table mapping a voice-style label to the speech vendor's voice
/// id. Unknown styles are handled by the caller falling back to
/// `VoiceStyle::Professional` at parse time.
pub fn voice_id_for_style(style: VoiceStyle) -> &'static str {
    match style {
        VoiceStyle::Professional => "pNInz6obpgDQGcFmaJgB",
        VoiceStyle::Friendly => "EXAVITQu4vr4xnSDxMaL",
        VoiceStyle::Energetic => "yoZ06aMxZJJ28mfd3POQ",
        VoiceStyle::Calm => "ThT5KcBeYPX3keUQqHPh",
    }
}
