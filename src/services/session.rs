use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::domains::agent::{AgentRecord, FormData, UseCase, VoiceStyle};
use crate::domains::flow::{ConversationFlow, ConversationScenario};
use crate::domains::profile::Profile;
use crate::error::Result;
use crate::interfaces::notify::{Notifier, Severity};
use crate::interfaces::providers::{AgentStore, ProfileExtractor, VoiceProvisioner};
use crate::services::generator::FlowGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormTab {
    #[default]
    Details,
    Flow,
}

#[derive(Default)]
struct SessionState {
    form: FormData,
    custom_prompt: Option<String>,
    raw_profile: Option<Value>,
    profile: Option<Profile>,
    system_prompt: Option<String>,
    knowledge_base: Option<Value>,
    flow: ConversationFlow,
    flow_generated: bool,
    active_tab: FormTab,
    is_extracting: bool,
    is_generating_flow: bool,
    is_submitting: bool,
    error: Option<String>,
    epoch: u64,
    user_id: Option<String>,
}

/// One user's agent-building workflow: the form fields, the extracted
/// profile, the generated flow, and the busy/error flags the front end
/// renders from.
///
/// State sits behind a mutex so a `reset()` can land while an action is
/// suspended at a provider call. Long-running actions capture the epoch
/// before awaiting and drop a completion whose epoch no longer matches;
/// each action also refuses to start while a previous run of itself is
/// still in flight. The guard is only ever held between awaits.
pub struct AgentSession {
    extractor: Arc<dyn ProfileExtractor>,
    generator: FlowGenerator,
    provisioner: Arc<dyn VoiceProvisioner>,
    store: Arc<dyn AgentStore>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<SessionState>,
}

impl AgentSession {
    pub fn new(
        extractor: Arc<dyn ProfileExtractor>,
        generator: FlowGenerator,
        provisioner: Arc<dyn VoiceProvisioner>,
        store: Arc<dyn AgentStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            extractor,
            generator,
            provisioner,
            store,
            notifier,
            state: Mutex::new(SessionState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn form(&self) -> FormData {
        self.state().form.clone()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.state().profile.clone()
    }

    pub fn raw_profile(&self) -> Option<Value> {
        self.state().raw_profile.clone()
    }

    pub fn system_prompt(&self) -> Option<String> {
        self.state().system_prompt.clone()
    }

    pub fn flow(&self) -> ConversationFlow {
        self.state().flow.clone()
    }

    pub fn flow_generated(&self) -> bool {
        self.state().flow_generated
    }

    pub fn active_tab(&self) -> FormTab {
        self.state().active_tab
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn is_extracting(&self) -> bool {
        self.state().is_extracting
    }

    pub fn is_generating_flow(&self) -> bool {
        self.state().is_generating_flow
    }

    pub fn is_submitting(&self) -> bool {
        self.state().is_submitting
    }

    pub fn set_full_name(&self, value: impl Into<String>) {
        self.state().form.full_name = value.into();
    }

    pub fn set_email(&self, value: impl Into<String>) {
        self.state().form.email = value.into();
    }

    pub fn set_url(&self, value: impl Into<String>) {
        self.state().form.url = value.into();
    }

    pub fn set_is_company(&self, value: bool) {
        self.state().form.is_company = value;
    }

    pub fn set_use_case(&self, value: UseCase) {
        self.state().form.use_case = value;
    }

    pub fn set_voice_style(&self, value: VoiceStyle) {
        self.state().form.voice_style = value;
    }

    pub fn set_custom_prompt(&self, value: Option<String>) {
        self.state().custom_prompt = value.filter(|p| !p.trim().is_empty());
    }

    pub fn set_user_id(&self, value: Option<String>) {
        self.state().user_id = value;
    }

    /// Tab switching is gated: the flow tab needs a profile, and no tab
    /// change is allowed while a submission is in flight.
    pub fn set_active_tab(&self, tab: FormTab) -> bool {
        let needs_profile_notice;
        {
            let mut state = self.state();
            if state.is_submitting {
                return false;
            }
            if tab == FormTab::Flow && state.profile.is_none() {
                needs_profile_notice = true;
            } else {
                state.active_tab = tab;
                return true;
            }
        }
        if needs_profile_notice {
            self.notifier.notify(
                Severity::Error,
                "Missing Information",
                "Please extract profile information first.",
            );
        }
        false
    }

    /// Extracts a structured profile for the form's URL, backfills an
    /// empty name from the result, and chains straight into flow
    /// generation. A missing URL aborts before any provider call.
    pub async fn extract_profile(&self) -> Result<()> {
        let (url, is_company, name, email, epoch) = {
            let mut state = self.state();
            if state.is_extracting {
                return Ok(());
            }
            if state.form.url.trim().is_empty() {
                drop(state);
                self.notifier.notify(
                    Severity::Error,
                    "Missing Information",
                    "Please enter a URL to extract profile information.",
                );
                return Ok(());
            }
            state.error = None;
            state.is_extracting = true;
            (
                state.form.url.clone(),
                state.form.is_company,
                state.form.full_name.clone(),
                state.form.email.clone(),
                state.epoch,
            )
        };
        self.notifier.notify(
            Severity::Info,
            "Extracting Information",
            "Analyzing your profile data...",
        );

        let outcome = self.extractor.extract(&url, is_company, &name, &email).await;

        let chain_into_generation = {
            let mut state = self.state();
            if state.epoch != epoch {
                info!("discarding stale extraction result");
                return Ok(());
            }
            state.is_extracting = false;

            let raw = match outcome {
                Ok(raw) => raw,
                Err(err) => {
                    let message = err.to_string();
                    state.error = Some(message.clone());
                    drop(state);
                    self.notifier.notify(
                        Severity::Error,
                        "Error",
                        &format!("Failed to extract profile information: {message}"),
                    );
                    return Ok(());
                }
            };

            match Profile::from_extraction(&raw, is_company) {
                Ok(profile) => {
                    if state.form.full_name.trim().is_empty() {
                        let extracted = profile.display_name();
                        if !extracted.is_empty() {
                            state.form.full_name = extracted.to_string();
                        }
                    }
                    state.raw_profile = Some(raw);
                    state.profile = Some(profile);
                    true
                }
                Err(err) => {
                    let message = err.to_string();
                    state.error = Some(message.clone());
                    drop(state);
                    self.notifier.notify(
                        Severity::Error,
                        "Error",
                        &format!("Failed to extract profile information: {message}"),
                    );
                    return Ok(());
                }
            }
        };

        if chain_into_generation {
            self.notifier.notify(
                Severity::Success,
                "Information Extracted",
                "Profile data has been analyzed successfully.",
            );
            // Extraction success flows straight into generation.
            return self.generate_flow().await;
        }
        Ok(())
    }

    /// Generates the conversation flow from the current profile. Model
    /// failures degrade through two layers: the generator's use-case
    /// templates first, then a single greeting scenario if even those
    /// inputs are unavailable.
    pub async fn generate_flow(&self) -> Result<()> {
        let (profile, use_case, entity_name, voice_style, custom_prompt, epoch) = {
            let mut state = self.state();
            if state.is_generating_flow {
                return Ok(());
            }
            state.error = None;
            if state.profile.is_none() {
                drop(state);
                self.notifier.notify(
                    Severity::Error,
                    "Missing Information",
                    "Please extract profile information first.",
                );
                return Ok(());
            }
            state.is_generating_flow = true;
            (
                state.profile.clone(),
                state.form.use_case,
                state.form.full_name.clone(),
                state.form.voice_style,
                state.custom_prompt.clone(),
                state.epoch,
            )
        };
        self.notifier.notify(
            Severity::Info,
            "Generating Flow",
            "Creating a conversation flow based on the profile...",
        );

        let outcome = self
            .generator
            .generate_or_fallback(
                profile.as_ref(),
                use_case,
                &entity_name,
                voice_style,
                custom_prompt.as_deref(),
            )
            .await;

        let mut state = self.state();
        if state.epoch != epoch {
            info!("discarding stale flow generation result");
            return Ok(());
        }
        state.is_generating_flow = false;

        match outcome {
            Ok(generated) => {
                state.system_prompt = Some(generated.system_prompt);
                state.knowledge_base = Some(generated.knowledge_base);
                state.flow = generated.flow;
                state.flow_generated = true;
                state.active_tab = FormTab::Flow;
                drop(state);
                self.notifier.notify(
                    Severity::Success,
                    "Flow Generated",
                    "Conversation flow has been created successfully.",
                );
            }
            Err(err) => {
                warn!("flow generation failed: {err}");
                state.error = Some(err.to_string());
                state.flow = greeting_fallback(&state.form.full_name);
                state.flow_generated = true;
                drop(state);
                self.notifier.notify(
                    Severity::Error,
                    "Error",
                    &format!("Failed to generate conversation flow: {err}"),
                );
                self.notifier.notify(
                    Severity::Info,
                    "Fallback Used",
                    "Using basic conversation flow template due to error.",
                );
            }
        }
        Ok(())
    }

    /// Accepts an edited flow back from the editor.
    pub fn save_flow(&self, flow: ConversationFlow) {
        self.state().flow = flow;
    }

    /// Validates the form, provisions the voice agent, and persists the
    /// finished record. Voice provisioning is tolerated to fail; the
    /// record is stored without an agent id in that case.
    pub async fn submit(&self) -> Result<Option<Value>> {
        let (record_input, epoch) = {
            let mut state = self.state();
            if state.is_submitting {
                return Ok(None);
            }
            if state.form.full_name.trim().is_empty() {
                drop(state);
                self.notifier.notify(
                    Severity::Error,
                    "Missing Information",
                    "Please enter your full name or company name.",
                );
                return Ok(None);
            }
            if state.form.email.trim().is_empty() {
                drop(state);
                self.notifier.notify(
                    Severity::Error,
                    "Missing Information",
                    "Please enter your email address.",
                );
                return Ok(None);
            }
            if state.form.url.trim().is_empty() {
                let kind = if state.form.is_company {
                    "company"
                } else {
                    "personal"
                };
                drop(state);
                self.notifier.notify(
                    Severity::Error,
                    "Missing Information",
                    &format!("Please enter your {kind} URL."),
                );
                return Ok(None);
            }

            state.error = None;
            state.is_submitting = true;
            let system_prompt = state.system_prompt.clone().unwrap_or_else(|| {
                format!(
                    "You are a helpful AI assistant representing {}.",
                    state.form.full_name
                )
            });
            let input = (
                state.form.clone(),
                state.raw_profile.clone(),
                state.knowledge_base.clone(),
                state.flow.clone(),
                system_prompt,
                state.user_id.clone(),
            );
            (input, state.epoch)
        };
        let (form, raw_profile, knowledge_base, flow, system_prompt, user_id) = record_input;
        self.notifier.notify(
            Severity::Info,
            "Agent Generation Started",
            "We're creating your AI sales agent now. This might take a minute or two.",
        );

        let voice_agent_id = match self
            .provisioner
            .provision(&form.full_name, &system_prompt, form.voice_style)
            .await
        {
            Ok(id) => id,
            Err(err) => {
                warn!("voice provisioning failed, continuing without agent id: {err}");
                None
            }
        };
        if self.state().epoch != epoch {
            info!("discarding stale submission");
            return Ok(None);
        }

        let record = AgentRecord {
            name: form.full_name.clone(),
            email: form.email.clone(),
            is_company: form.is_company,
            url: form.url.clone(),
            use_case: form.use_case,
            voice_style: form.voice_style,
            scraped_data: raw_profile.unwrap_or(Value::Null),
            agent_prompt: system_prompt,
            knowledge_base: knowledge_base.unwrap_or(Value::Null),
            conversation_flow: flow,
            voice_agent_id,
            user_id,
            created_at: Utc::now(),
        };

        let stored = self.store.insert(&record).await;

        let mut state = self.state();
        if state.epoch != epoch {
            info!("discarding stale submission result");
            return Ok(None);
        }
        state.is_submitting = false;

        match stored {
            Ok(row) => {
                drop(state);
                self.notifier.notify(
                    Severity::Success,
                    "Success!",
                    "Your AI agent has been created successfully.",
                );
                Ok(Some(row))
            }
            Err(err) => {
                warn!("agent persistence failed: {err}");
                state.error = Some("Failed to create agent".to_string());
                drop(state);
                self.notifier.notify(
                    Severity::Error,
                    "Error",
                    "There was a problem creating your AI agent. Please try again.",
                );
                Ok(None)
            }
        }
    }

    /// Clears the workflow back to an empty form. Bumping the epoch makes
    /// any in-flight action discard its result instead of repopulating
    /// the cleared session.
    pub fn reset(&self) {
        let mut state = self.state();
        let epoch = state.epoch + 1;
        *state = SessionState {
            epoch,
            ..SessionState::default()
        };
    }

    /// Loads a canned sample agent so the workflow can be tried without
    /// a real URL.
    pub fn load_demo(&self) -> Result<()> {
        let raw = json!({
            "companyProfile": {
                "name": "Tech Innovations",
                "tagline": "Building the future of enterprise software",
                "toneOfVoice": "Professional, Innovative, Trustworthy",
                "about": "Tech Innovations was founded in 2015 with the mission to make enterprise software more accessible and user-friendly. We focus on cloud-native solutions that help businesses transform digitally.",
                "productsServices": [
                    { "name": "CloudManage", "description": "Cloud resource management platform" },
                    { "name": "DataSync Pro", "description": "Enterprise data synchronization tool" },
                    { "name": "SecureBiz", "description": "Business security and compliance solution" }
                ],
                "industriesServed": ["Technology", "Finance", "Healthcare", "Manufacturing"],
                "faqs": [
                    {
                        "question": "What makes your solutions different?",
                        "answer": "Our solutions are built with user-experience first, ensuring high adoption rates and ROI."
                    },
                    {
                        "question": "Do you offer custom implementations?",
                        "answer": "Yes, we provide tailored implementations to meet your specific business needs."
                    }
                ],
                "contactInfo": {
                    "website": "https://www.techinnovations.example.com",
                    "email": "info@techinnovations.example.com"
                }
            }
        });
        let profile = Profile::from_extraction(&raw, true)?;

        {
            let mut state = self.state();
            state.form = FormData {
                full_name: "Alex Johnson".to_string(),
                email: "alex@techcompany.com".to_string(),
                is_company: true,
                url: "https://www.linkedin.com/company/tech-innovations".to_string(),
                use_case: UseCase::Sales,
                voice_style: VoiceStyle::Professional,
            };
            state.profile = Some(profile);
            state.raw_profile = Some(raw);
            state.error = None;
        }
        self.notifier.notify(
            Severity::Success,
            "Demo Agent Loaded",
            "We've loaded a sample AI agent for you to try.",
        );
        Ok(())
    }
}

fn greeting_fallback(full_name: &str) -> ConversationFlow {
    ConversationFlow::new(vec![ConversationScenario {
        scenario: "Default Greeting".to_string(),
        user_inputs: vec![
            "Hello".to_string(),
            "Hi there".to_string(),
            "Hey".to_string(),
        ],
        responses: vec![format!(
            "Hi, I'm {full_name}'s AI assistant. How can I help you today?"
        )],
        follow_ups: vec!["Is there something specific you'd like to know?".to_string()],
        ..Default::default()
    }])
}
