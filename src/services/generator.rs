use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domains::agent::{UseCase, VoiceStyle};
use crate::domains::flow::{ConversationFlow, ConversationScenario};
use crate::domains::profile::Profile;
use crate::error::VoiceForgeError;
use crate::interfaces::providers::LlmProvider;

static FENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?\s*").unwrap());

const DESIGNER_SYSTEM_PROMPT: &str =
    "You are an expert AI conversation designer who creates well-structured conversation flows.";

/// Which stage of flow generation failed. The caller decides whether a
/// failure becomes a user-facing error or a silent fallback.
#[derive(Debug, Error)]
pub enum GenerateFlowError {
    #[error("profile data is required")]
    MissingProfile,
    #[error("flow model call failed: {0}")]
    Upstream(String),
    #[error("flow model returned unparseable output: {0}")]
    Unparseable(String),
}

impl From<GenerateFlowError> for VoiceForgeError {
    fn from(err: GenerateFlowError) -> Self {
        match err {
            GenerateFlowError::MissingProfile => VoiceForgeError::Validation(err.to_string()),
            GenerateFlowError::Upstream(message) => VoiceForgeError::Http(message),
            GenerateFlowError::Unparseable(message) => VoiceForgeError::Serialization(message),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedFlow {
    pub system_prompt: String,
    pub knowledge_base: Value,
    pub flow: ConversationFlow,
}

/// Synthesizes a conversation flow from a profile: builds the system
/// prompt and knowledge base, asks the chat model for scenario JSON, and
/// falls back to deterministic use-case templates when the model call or
/// its output cannot be used.
pub struct FlowGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl FlowGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Generate a flow, surfacing a typed error for the failed stage.
    /// Nothing is mutated on failure.
    pub async fn generate(
        &self,
        profile: Option<&Profile>,
        use_case: UseCase,
        entity_name: &str,
        voice_style: VoiceStyle,
        custom_prompt: Option<&str>,
    ) -> std::result::Result<GeneratedFlow, GenerateFlowError> {
        let profile = profile.ok_or(GenerateFlowError::MissingProfile)?;
        let system_prompt = Self::build_system_prompt(profile, entity_name, custom_prompt);
        let knowledge_base = Self::knowledge_base(profile);
        let prompt = Self::flow_prompt(
            &system_prompt,
            &knowledge_base,
            profile.is_company(),
            use_case,
            voice_style,
        );

        let raw = self
            .llm
            .generate(&prompt, DESIGNER_SYSTEM_PROMPT)
            .await
            .map_err(|e| GenerateFlowError::Upstream(e.to_string()))?;
        debug!(bytes = raw.len(), "flow model responded");

        let mut flow = Self::parse_flow(&raw)?;
        flow.assign_positional_ids();
        Ok(GeneratedFlow {
            system_prompt,
            knowledge_base,
            flow,
        })
    }

    /// Generate a flow, substituting the deterministic use-case templates
    /// when the model call fails or returns unusable output. A missing
    /// profile still fails: there is nothing to ground either path on.
    pub async fn generate_or_fallback(
        &self,
        profile: Option<&Profile>,
        use_case: UseCase,
        entity_name: &str,
        voice_style: VoiceStyle,
        custom_prompt: Option<&str>,
    ) -> std::result::Result<GeneratedFlow, GenerateFlowError> {
        match self
            .generate(profile, use_case, entity_name, voice_style, custom_prompt)
            .await
        {
            Ok(generated) => Ok(generated),
            Err(GenerateFlowError::MissingProfile) => Err(GenerateFlowError::MissingProfile),
            Err(err) => {
                warn!("flow generation failed, using use-case templates: {err}");
                let profile = profile.ok_or(GenerateFlowError::MissingProfile)?;
                let system_prompt = Self::build_system_prompt(profile, entity_name, custom_prompt);
                let knowledge_base = Self::knowledge_base(profile);
                let mut flow =
                    Self::fallback_flow(use_case, &knowledge_base, profile.is_company());
                flow.assign_positional_ids();
                Ok(GeneratedFlow {
                    system_prompt,
                    knowledge_base,
                    flow,
                })
            }
        }
    }

    /// The system prompt conditioning the voice agent. A non-empty custom
    /// prompt replaces the synthesized template verbatim.
    pub fn build_system_prompt(
        profile: &Profile,
        fallback_name: &str,
        custom_prompt: Option<&str>,
    ) -> String {
        if let Some(custom) = custom_prompt {
            if !custom.trim().is_empty() {
                return custom.to_string();
            }
        }

        match profile {
            Profile::Company(company) => {
                let name = if company.name.is_empty() {
                    fallback_name
                } else {
                    &company.name
                };
                let industry = company
                    .industries_served
                    .first()
                    .map(String::as_str)
                    .unwrap_or("technology");
                let tone = company
                    .tone_of_voice
                    .as_deref()
                    .unwrap_or("professional, friendly, helpful");

                format!(
                    "You are an AI voice agent representing {name}, a business that specializes in {industry}.\n\n\
                     Your goal is to introduce the company, explain its services/products, answer client inquiries, and direct people to the right resource.\n\n\
                     Your tone is {tone}, and you speak clearly and confidently about the company's:\n\
                     - Mission and values\n\
                     - Products or services\n\
                     - Client success stories\n\
                     - How to get started or speak to a real person\n\n\
                     When uncertain, answer generally or offer to connect the user to support or sales."
                )
            }
            Profile::Individual(individual) => {
                let name = if individual.name.is_empty() {
                    fallback_name
                } else {
                    &individual.name
                };
                let profession = individual.title.as_deref().unwrap_or("Professional");
                let skills = if individual.core_skills.is_empty() {
                    "Professional skills".to_string()
                } else {
                    individual.core_skills.join(", ")
                };
                let tone = individual
                    .tone_of_voice
                    .as_deref()
                    .unwrap_or("friendly, professional");

                format!(
                    "You are an AI voice assistant representing {name}, a {profession} with expertise in {skills}.\n\n\
                     Your goal is to explain their background, services, and value clearly and confidently. Your personality is {tone}, and your responses should reflect {name}'s tone, achievements, and personal brand.\n\n\
                     You answer questions about {name}'s:\n\
                     - Work experience\n\
                     - Skills and achievements\n\
                     - Projects or clients\n\
                     - Availability or how to get in touch\n\n\
                     If the question is unrelated, respond politely or guide the person back to relevant topics. Offer to share links or book a meeting when appropriate."
                )
            }
        }
    }

    /// Flattened key/value projection of the profile used as grounding
    /// context. The schema differs between the two entity kinds.
    pub fn knowledge_base(profile: &Profile) -> Value {
        match profile {
            Profile::Company(company) => {
                let products: Vec<&str> = company
                    .products_services
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect();
                json!({
                    "company_name": non_empty(&company.name, "Company Name"),
                    "industry": company.industries_served.first().map(String::as_str).unwrap_or("Technology"),
                    "summary": company.about.as_deref().unwrap_or("Company description"),
                    "products": if products.is_empty() { json!(["Products and services"]) } else { json!(products) },
                    "ideal_clients": if company.industries_served.is_empty() { json!(["Businesses"]) } else { json!(company.industries_served) },
                    "case_study": "We have helped numerous clients achieve their goals through our innovative solutions.",
                    "website": company.contact.website.as_deref().unwrap_or("company.com"),
                    "contact": company.contact.email.as_deref().unwrap_or("contact@example.com"),
                })
            }
            Profile::Individual(individual) => json!({
                "name": non_empty(&individual.name, "Professional Name"),
                "title": individual.title.as_deref().unwrap_or("Professional"),
                "summary": individual.about.as_deref().unwrap_or("Professional description"),
                "top_skills": if individual.core_skills.is_empty() { json!(["Professional skills"]) } else { json!(individual.core_skills) },
                "clients": if individual.services_offered.is_empty() { json!(["Clients"]) } else { json!(individual.services_offered) },
                "portfolio_url": individual.contact.website.as_deref().unwrap_or("personal-website.com"),
                "contact": individual.contact.email.as_deref().unwrap_or("contact@example.com"),
            }),
        }
    }

    fn flow_prompt(
        system_prompt: &str,
        knowledge_base: &Value,
        is_company: bool,
        use_case: UseCase,
        voice_style: VoiceStyle,
    ) -> String {
        let knowledge = serde_json::to_string_pretty(knowledge_base).unwrap_or_default();
        let agent_type = if is_company { "Company" } else { "Individual" };
        let use_case = use_case.as_str();
        let voice_style = voice_style.as_str();

        format!(
            r#"
You are an expert AI conversation designer. Create a detailed conversation flow for an AI voice agent based on the following information:

SYSTEM PROMPT:
{system_prompt}

KNOWLEDGE BASE:
{knowledge}

AGENT TYPE: {agent_type}
USE CASE: {use_case}
VOICE STYLE: {voice_style}

Create a comprehensive conversation flow with at least 8 different conversation scenarios that this AI voice agent would handle.
Each scenario should include:
1. The scenario name/type (e.g., "Introduction", "Product Questions", "Pricing", etc.)
2. 2-4 example user inputs/questions for this scenario
3. 2-4 diverse AI responses for this scenario, matching the specified voice style
4. Next steps or follow-up questions the AI might ask

Format your response as a valid JSON array like this example:
[
  {{
    "scenario": "Introduction",
    "userInputs": ["Hi there", "Hello", "Who are you?"],
    "responses": ["Hi, I'm Sarah's AI assistant. How can I help you today?", "Hello! I'm an AI assistant for ABC Company. How may I assist you?"],
    "followUps": ["Would you like to learn more about our services?", "Is there something specific I can help you with today?"]
  }},
  {{
    "scenario": "Another scenario name",
    "userInputs": ["example question 1", "example question 2"],
    "responses": ["example response 1", "example response 2"],
    "followUps": ["follow-up 1", "follow-up 2"]
  }}
]

Important: Make sure the conversation flow:
1. Is highly personalized to the specific knowledge base and system prompt
2. Matches the selected voice style ({voice_style})
3. Is optimized for the use case ({use_case})
4. Uses natural, conversational language
5. Has responses that sound like they come from a real person
6. Returns ONLY valid JSON that can be parsed (no explanations or other text)
"#
        )
    }

    /// Parse model output into a flow: direct JSON first, then once more
    /// with Markdown code fences stripped.
    pub fn parse_flow(raw: &str) -> std::result::Result<ConversationFlow, GenerateFlowError> {
        let trimmed = raw.trim();
        let scenarios = match serde_json::from_str::<Vec<ConversationScenario>>(trimmed) {
            Ok(scenarios) => scenarios,
            Err(first_err) => {
                let stripped = FENCE_RE.replace_all(trimmed, "");
                serde_json::from_str::<Vec<ConversationScenario>>(stripped.trim())
                    .map_err(|_| GenerateFlowError::Unparseable(first_err.to_string()))?
            }
        };

        let scenarios: Vec<ConversationScenario> = scenarios
            .into_iter()
            .filter(|scenario| !scenario.user_inputs.is_empty() && !scenario.responses.is_empty())
            .collect();
        if scenarios.is_empty() {
            return Err(GenerateFlowError::Unparseable(
                "no usable scenarios in model output".to_string(),
            ));
        }
        Ok(ConversationFlow::new(scenarios))
    }

    /// Deterministic fallback keyed only on use case: an Introduction
    /// scenario plus use-case-specific templates, personalized with the
    /// knowledge-base name fields.
    pub fn fallback_flow(
        use_case: UseCase,
        knowledge_base: &Value,
        is_company: bool,
    ) -> ConversationFlow {
        let name = knowledge_base
            .get(if is_company { "company_name" } else { "name" })
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let mut scenarios = vec![ConversationScenario {
            scenario: "Introduction".to_string(),
            user_inputs: vec![
                "Hi there".to_string(),
                "Hello".to_string(),
                "Who are you?".to_string(),
            ],
            responses: vec![
                format!("Hi, I'm {name}'s AI assistant. How can I help you today?"),
                format!("Hello! I'm an AI voice agent for {name}. What can I assist you with?"),
            ],
            follow_ups: vec![
                "Is there something specific you'd like to know?".to_string(),
                "How can I help you today?".to_string(),
            ],
            ..Default::default()
        }];

        match use_case {
            UseCase::Sales => {
                let offering = if is_company {
                    let products = joined_list(knowledge_base, "products");
                    format!(
                        "At {name}, we offer a range of solutions including {products}. Would you like to learn more about any specific one?"
                    )
                } else {
                    let skills = joined_list(knowledge_base, "top_skills");
                    format!(
                        "{name} specializes in {skills}. Would you like to hear more about these services?"
                    )
                };
                scenarios.push(ConversationScenario {
                    scenario: "Products/Services".to_string(),
                    user_inputs: vec![
                        "What do you offer?".to_string(),
                        "Tell me about your products".to_string(),
                        "What services do you provide?".to_string(),
                    ],
                    responses: vec![offering],
                    follow_ups: vec![
                        "Would you like more details on any specific offering?".to_string(),
                        "Do you have any questions about our solutions?".to_string(),
                    ],
                    ..Default::default()
                });
                scenarios.push(ConversationScenario {
                    scenario: "Pricing".to_string(),
                    user_inputs: vec![
                        "How much does it cost?".to_string(),
                        "What are your prices?".to_string(),
                        "Tell me about pricing".to_string(),
                    ],
                    responses: vec![
                        "Our pricing is customized based on your specific requirements. Would you like to schedule a consultation to discuss your needs?".to_string(),
                    ],
                    follow_ups: vec![
                        "What particular service are you interested in?".to_string(),
                        "Would you like me to have someone from our team reach out with pricing details?".to_string(),
                    ],
                    ..Default::default()
                });
                scenarios.push(ConversationScenario {
                    scenario: "Call to Action".to_string(),
                    user_inputs: vec![
                        "How do we get started?".to_string(),
                        "I want to work with you".to_string(),
                        "Next steps".to_string(),
                    ],
                    responses: vec![
                        "Would you like to schedule a call to discuss how we can help you?".to_string(),
                        "What's the best way to reach you so we can provide more detailed information?".to_string(),
                    ],
                    follow_ups: vec![
                        "What's your email address?".to_string(),
                        "When would be a good time for a follow-up call?".to_string(),
                    ],
                    ..Default::default()
                });
            }
            UseCase::CustomerSupport => {
                scenarios.push(ConversationScenario {
                    scenario: "Issue Troubleshooting".to_string(),
                    user_inputs: vec![
                        "I have a problem".to_string(),
                        "Something's not working".to_string(),
                        "Need help with an issue".to_string(),
                    ],
                    responses: vec![
                        "I'm sorry to hear you're having an issue. Could you please tell me more about what's happening so I can help you better?".to_string(),
                    ],
                    follow_ups: vec![
                        "When did you first notice this issue?".to_string(),
                        "Have you tried any solutions already?".to_string(),
                    ],
                    ..Default::default()
                });
                scenarios.push(ConversationScenario {
                    scenario: "Follow-up".to_string(),
                    user_inputs: vec![
                        "What happens next?".to_string(),
                        "Will someone contact me?".to_string(),
                        "How do I check status?".to_string(),
                    ],
                    responses: vec![
                        "Let me connect you with our support team who can help resolve this right away.".to_string(),
                        "Would you like me to have someone from our team contact you directly?".to_string(),
                    ],
                    follow_ups: vec![
                        "What's the best way to reach you?".to_string(),
                        "Do you have a case number from a previous interaction?".to_string(),
                    ],
                    ..Default::default()
                });
            }
            UseCase::LeadQualification => {
                scenarios.push(ConversationScenario {
                    scenario: "Qualification".to_string(),
                    user_inputs: vec![
                        "I'm interested in your services".to_string(),
                        "I want to know if we're a good fit".to_string(),
                        "Tell me if you can help with...".to_string(),
                    ],
                    responses: vec![
                        "To help understand if we're a good fit, may I ask about your current needs and challenges?".to_string(),
                    ],
                    follow_ups: vec![
                        "What specific problems are you trying to solve?".to_string(),
                        "What solutions have you tried before?".to_string(),
                    ],
                    ..Default::default()
                });
                scenarios.push(ConversationScenario {
                    scenario: "Next Steps".to_string(),
                    user_inputs: vec![
                        "What now?".to_string(),
                        "How do we proceed?".to_string(),
                        "I think we're a good match".to_string(),
                    ],
                    responses: vec![
                        "Based on what you've shared, I think we could definitely help. Would you be interested in speaking with one of our specialists?".to_string(),
                        "It sounds like you could benefit from our services. Would you like to schedule a demo?".to_string(),
                    ],
                    follow_ups: vec![
                        "What times work best for you?".to_string(),
                        "Who else from your team should be involved in the next discussion?".to_string(),
                    ],
                    ..Default::default()
                });
            }
            UseCase::Other => {}
        }

        ConversationFlow::new(scenarios)
    }
}

fn non_empty<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

fn joined_list(knowledge_base: &Value, key: &str) -> String {
    knowledge_base
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}
