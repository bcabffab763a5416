#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use serde_json::{json, Value};

use voiceforge::domains::agent::VoiceStyle;
use voiceforge::error::{Result, VoiceForgeError};
use voiceforge::interfaces::providers::{LlmProvider, ProfileExtractor, VoiceProvisioner};

static INIT_LOGGING: Once = Once::new();

/// Installs the tracing subscriber once per test binary.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| voiceforge::logging::init_tracing("integration"));
}

/// Chat model mock that replays queued replies in order. An exhausted
/// queue turns into an upstream error, which keeps tests honest about
/// how many model calls they expect.
pub struct QueueLlmProvider {
    replies: Mutex<Vec<Result<String>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl QueueLlmProvider {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for QueueLlmProvider {
    async fn generate(&self, prompt: &str, _system_prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(VoiceForgeError::Http("reply queue exhausted".to_string()));
        }
        replies.remove(0)
    }
}

/// Extractor mock returning a fixed payload.
pub struct StaticExtractor(pub Value);

#[async_trait]
impl ProfileExtractor for StaticExtractor {
    async fn extract(&self, _: &str, _: bool, _: &str, _: &str) -> Result<Value> {
        Ok(self.0.clone())
    }
}

/// Extractor mock replaying queued results, one per call.
pub struct QueueExtractor {
    replies: Mutex<Vec<Result<Value>>>,
}

impl QueueExtractor {
    pub fn new(replies: Vec<Result<Value>>) -> Self {
        Self {
            replies: Mutex::new(replies),
        }
    }
}

#[async_trait]
impl ProfileExtractor for QueueExtractor {
    async fn extract(&self, _: &str, _: bool, _: &str, _: &str) -> Result<Value> {
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(VoiceForgeError::Http("reply queue exhausted".to_string()));
        }
        replies.remove(0)
    }
}

/// Extractor mock that parks until released, so a test can interleave
/// other session calls while an extraction is suspended mid-flight.
pub struct GatedExtractor {
    pub gate: Arc<tokio::sync::Notify>,
    pub calls: Arc<Mutex<usize>>,
    pub data: Value,
}

impl GatedExtractor {
    pub fn new(data: Value) -> Self {
        Self {
            gate: Arc::new(tokio::sync::Notify::new()),
            calls: Arc::new(Mutex::new(0)),
            data,
        }
    }
}

#[async_trait]
impl ProfileExtractor for GatedExtractor {
    async fn extract(&self, _: &str, _: bool, _: &str, _: &str) -> Result<Value> {
        *self.calls.lock().unwrap() += 1;
        self.gate.notified().await;
        Ok(self.data.clone())
    }
}

/// Provisioner mock that records every call and returns a fixed id.
pub struct RecordingProvisioner {
    pub agent_id: Option<String>,
    pub calls: Arc<Mutex<Vec<(String, VoiceStyle)>>>,
}

impl RecordingProvisioner {
    pub fn returning(agent_id: Option<&str>) -> Self {
        Self {
            agent_id: agent_id.map(|id| id.to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl VoiceProvisioner for RecordingProvisioner {
    async fn provision(
        &self,
        entity_name: &str,
        _system_prompt: &str,
        voice_style: VoiceStyle,
    ) -> Result<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((entity_name.to_string(), voice_style));
        Ok(self.agent_id.clone())
    }
}

/// Canonical company extraction payload used across suites.
pub fn acme_extraction() -> Value {
    json!({
        "companyProfile": {
            "name": "Acme Robotics",
            "tagline": "Automation that just works",
            "toneOfVoice": "Confident, Practical",
            "about": "Acme Robotics builds warehouse automation for mid-size logistics companies.",
            "productsServices": [
                { "name": "PickBot", "description": "Autonomous picking robot" },
                { "name": "FleetOS", "description": "Fleet orchestration software" }
            ],
            "industriesServed": ["Logistics", "Manufacturing"],
            "faqs": [
                {
                    "question": "How long does installation take?",
                    "answer": "Most sites are live within six weeks."
                }
            ],
            "contactInfo": {
                "website": "https://acme-robotics.example.com",
                "email": "sales@acme-robotics.example.com"
            }
        }
    })
}

/// A minimal well-formed flow as the model would return it.
pub fn model_flow_reply() -> String {
    json!([
        {
            "scenario": "Introduction",
            "userInputs": ["Hello", "Who are you?"],
            "responses": ["Hi, I'm the Acme Robotics assistant."],
            "followUps": ["Would you like to hear about our products?"]
        },
        {
            "scenario": "Products",
            "userInputs": ["What do you sell?"],
            "responses": ["We build PickBot and FleetOS."],
            "followUps": ["Want a demo?"],
            "nextScenarioId": "scenario-1"
        }
    ])
    .to_string()
}
