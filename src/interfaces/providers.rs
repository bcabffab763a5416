use async_trait::async_trait;
use serde_json::Value;

use crate::domains::agent::{AgentRecord, VoiceStyle};
use crate::error::Result;

/// Chat-completion model used for conversation flow synthesis.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String>;
}

/// Returns a structured profile for a URL, in whichever of the two known
/// wire shapes the upstream produces. `Profile::from_extraction` folds the
/// result into the canonical shape at this boundary.
#[async_trait]
pub trait ProfileExtractor: Send + Sync {
    async fn extract(
        &self,
        url: &str,
        is_company: bool,
        name: &str,
        email: &str,
    ) -> Result<Value>;
}

/// Provisions a synthetic voice agent with the speech vendor. `Ok(None)`
/// means the vendor accepted the request without returning an agent id.
#[async_trait]
pub trait VoiceProvisioner: Send + Sync {
    async fn provision(
        &self,
        entity_name: &str,
        system_prompt: &str,
        voice_style: VoiceStyle,
    ) -> Result<Option<String>>;
}

/// Persistence for finished agents: single-row insert returning the
/// stored row, and a newest-first listing for the saved-agents view.
#[async_trait]
pub trait AgentStore: Send + Sync {
    async fn insert(&self, record: &AgentRecord) -> Result<Value>;

    async fn list(&self) -> Result<Vec<Value>>;
}
