use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::config::StoreConfig;
use crate::domains::agent::AgentRecord;
use crate::error::{Result, VoiceForgeError};
use crate::interfaces::providers::AgentStore;

/// PostgREST-style row store: a single JSON insert into a hosted table.
pub struct RestAgentStore {
    base_url: String,
    api_key: String,
    table: String,
    client: reqwest::Client,
}

impl RestAgentStore {
    pub fn new(base_url: String, api_key: String, table: Option<String>) -> Self {
        Self {
            base_url,
            api_key,
            table: table.unwrap_or_else(|| "agents".to_string()),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| VoiceForgeError::Config("store base url is required".to_string()))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| VoiceForgeError::Config("store api key is required".to_string()))?;
        Ok(Self::new(base_url, api_key, config.table.clone()))
    }
}

#[async_trait]
impl AgentStore for RestAgentStore {
    async fn insert(&self, record: &AgentRecord) -> Result<Value> {
        let url = format!(
            "{}/rest/v1/{}",
            self.base_url.trim_end_matches('/'),
            self.table
        );
        info!(table = %self.table, "persisting agent record");

        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .json(&[record])
            .send()
            .await
            .map_err(|e| VoiceForgeError::Http(format!("Agent insert failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| VoiceForgeError::Http(format!("Agent insert read failed: {e}")))?;
        if !status.is_success() {
            return Err(VoiceForgeError::Http(format!(
                "Agent insert failed ({status}): {body}"
            )));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| VoiceForgeError::Serialization(format!("Agent insert decode failed: {e}")))?;
        // PostgREST returns the representation as a one-element array.
        Ok(value
            .as_array()
            .and_then(|rows| rows.first().cloned())
            .unwrap_or(value))
    }

    async fn list(&self) -> Result<Vec<Value>> {
        let url = format!(
            "{}/rest/v1/{}",
            self.base_url.trim_end_matches('/'),
            self.table
        );

        let response = self
            .client
            .get(url)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| VoiceForgeError::Http(format!("Agent list failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| VoiceForgeError::Http(format!("Agent list read failed: {e}")))?;
        if !status.is_success() {
            return Err(VoiceForgeError::Http(format!(
                "Agent list failed ({status}): {body}"
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| VoiceForgeError::Serialization(format!("Agent list decode failed: {e}")))
    }
}
