use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domains::agent::AgentRecord;
use crate::error::{Result, VoiceForgeError};
use crate::interfaces::providers::AgentStore;

/// In-memory agent store for tests and offline runs.
#[derive(Debug, Default)]
pub struct InMemoryAgentStore {
    rows: RwLock<Vec<Value>>,
}

impl InMemoryAgentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentStore for InMemoryAgentStore {
    async fn insert(&self, record: &AgentRecord) -> Result<Value> {
        let mut row = serde_json::to_value(record)
            .map_err(|e| VoiceForgeError::Serialization(e.to_string()))?;
        let mut rows = self.rows.write().await;
        if let Some(object) = row.as_object_mut() {
            object.insert("id".to_string(), Value::from(rows.len() as u64 + 1));
        }
        rows.push(row.clone());
        Ok(row)
    }

    /// Rows are appended in insertion order, so newest-first is the
    /// reverse of storage order.
    async fn list(&self) -> Result<Vec<Value>> {
        Ok(self.rows.read().await.iter().rev().cloned().collect())
    }
}
