use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domains::flow::ConversationFlow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UseCase {
    #[default]
    Sales,
    CustomerSupport,
    LeadQualification,
    Other,
}

impl UseCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            UseCase::Sales => "sales",
            UseCase::CustomerSupport => "customer-support",
            UseCase::LeadQualification => "lead-qualification",
            UseCase::Other => "other",
        }
    }

    pub fn parse(value: &str) -> UseCase {
        match value {
            "sales" => UseCase::Sales,
            "customer-support" => UseCase::CustomerSupport,
            "lead-qualification" => UseCase::LeadQualification,
            _ => UseCase::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceStyle {
    #[default]
    Professional,
    Friendly,
    Energetic,
    Calm,
}

impl VoiceStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceStyle::Professional => "professional",
            VoiceStyle::Friendly => "friendly",
            VoiceStyle::Energetic => "energetic",
            VoiceStyle::Calm => "calm",
        }
    }
}

/// The multi-step form's input fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormData {
    pub full_name: String,
    pub email: String,
    pub is_company: bool,
    pub url: String,
    pub use_case: UseCase,
    pub voice_style: VoiceStyle,
}

/// One persisted agent row: identity, classification, the raw profile
/// snapshot, the derived prompt material, the conversation flow, and the
/// opaque id the voice vendor returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    pub name: String,
    pub email: String,
    pub is_company: bool,
    pub url: String,
    pub use_case: UseCase,
    pub voice_style: VoiceStyle,
    pub scraped_data: Value,
    pub agent_prompt: String,
    pub knowledge_base: Value,
    pub conversation_flow: ConversationFlow,
    pub voice_agent_id: Option<String>,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
