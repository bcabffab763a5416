use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, VoiceForgeError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductService {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub website: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub date: String,
}

/// Canonical company profile. Extraction responses arrive in one of two
/// historical serializations (a nested camelCase shape and a flat
/// snake_case "normalized" shape); both are folded into this type at the
/// extractor boundary so nothing downstream has to branch on shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub tagline: Option<String>,
    pub tone_of_voice: Option<String>,
    pub about: Option<String>,
    #[serde(default)]
    pub products_services: Vec<ProductService>,
    #[serde(default)]
    pub industries_served: Vec<String>,
    #[serde(default)]
    pub faqs: Vec<Faq>,
    #[serde(default)]
    pub contact: ContactInfo,
    pub target_audience: Option<String>,
    pub use_case: Option<String>,
    pub agent_greeting: Option<String>,
    pub agent_intro: Option<String>,
    pub value_offer: Option<String>,
    pub support_actions: Option<String>,
    pub call_to_action: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndividualProfile {
    pub name: String,
    pub title: Option<String>,
    pub headline: Option<String>,
    pub tone_of_voice: Option<String>,
    pub about: Option<String>,
    #[serde(default)]
    pub core_skills: Vec<String>,
    #[serde(default)]
    pub services_offered: Vec<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub contact: ContactInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Profile {
    Company(CompanyProfile),
    Individual(IndividualProfile),
}

impl Profile {
    pub fn is_company(&self) -> bool {
        matches!(self, Profile::Company(_))
    }

    pub fn display_name(&self) -> &str {
        match self {
            Profile::Company(company) => &company.name,
            Profile::Individual(individual) => &individual.name,
        }
    }

    /// Folds an extraction response into the canonical profile.
    ///
    /// Accepts both serializations per entity kind: the nested shape
    /// (`companyProfile` / `individualProfile` with camelCase fields,
    /// optionally under an `originalData` key) and the flat normalized
    /// shape (`company_name`, `about_us`, `voice_tone`, ...). Flat fields
    /// win when both are present.
    pub fn from_extraction(data: &Value, is_company: bool) -> Result<Profile> {
        if !data.is_object() {
            return Err(VoiceForgeError::Serialization(
                "extraction response is not a JSON object".to_string(),
            ));
        }

        if is_company {
            let node = data
                .get("companyProfile")
                .or_else(|| data.get("company_profile"))
                .unwrap_or(data);
            Ok(Profile::Company(company_from_value(node)))
        } else {
            let node = data
                .get("individualProfile")
                .or_else(|| data.get("individual_profile"))
                .unwrap_or(data);
            Ok(Profile::Individual(individual_from_value(node)))
        }
    }
}

fn company_from_value(node: &Value) -> CompanyProfile {
    let original = node.get("originalData").unwrap_or(node);

    CompanyProfile {
        name: lookup_str(node, original, &["company_name", "name"]).unwrap_or_default(),
        tagline: lookup_str(node, original, &["tagline"]),
        tone_of_voice: lookup_str(node, original, &["voice_tone", "toneOfVoice", "tone_of_voice"]),
        about: lookup_str(node, original, &["about_us", "about"]),
        products_services: products_from(lookup(
            node,
            original,
            &["services_or_products", "productsServices", "products_services"],
        )),
        industries_served: string_list(lookup(
            node,
            original,
            &["industriesServed", "industries_served"],
        )),
        faqs: faqs_from(lookup(node, original, &["faqs"])),
        contact: contact_from(lookup(
            node,
            original,
            &["contactInfo", "contact_info", "contact"],
        )),
        target_audience: lookup_str(node, original, &["target_audience", "targetAudience"]),
        use_case: lookup_str(node, original, &["use_case", "useCase"]),
        agent_greeting: lookup_str(node, original, &["agent_greeting"]),
        agent_intro: lookup_str(node, original, &["agent_intro"]),
        value_offer: lookup_str(node, original, &["value_offer"]),
        support_actions: lookup_str(node, original, &["support_actions"]),
        call_to_action: lookup_str(node, original, &["call_to_action"]),
    }
}

fn individual_from_value(node: &Value) -> IndividualProfile {
    let original = node.get("originalData").unwrap_or(node);

    IndividualProfile {
        name: lookup_str(node, original, &["full_name", "name"]).unwrap_or_default(),
        title: lookup_str(node, original, &["profession_or_role", "title"]),
        headline: lookup_str(node, original, &["headline"]),
        tone_of_voice: lookup_str(node, original, &["voice_tone", "toneOfVoice", "tone_of_voice"]),
        about: lookup_str(node, original, &["bio", "about"]),
        core_skills: string_list(lookup(
            node,
            original,
            &["coreSkills", "core_skills", "top_skills"],
        )),
        services_offered: string_list(lookup(
            node,
            original,
            &["servicesOffered", "services_offered"],
        )),
        experience: experience_from(lookup(
            node,
            original,
            &["experienceHighlights", "experience_highlights", "experience"],
        )),
        contact: contact_from(lookup(
            node,
            original,
            &["contact", "contactInfo", "contact_info"],
        )),
    }
}

fn lookup<'a>(node: &'a Value, original: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| node.get(key))
        .or_else(|| keys.iter().find_map(|key| original.get(key)))
}

fn lookup_str(node: &Value, original: &Value, keys: &[&str]) -> Option<String> {
    lookup(node, original, keys)
        .and_then(|value| value.as_str())
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|text| text.to_string())
            .collect(),
        // The flat shape sometimes carries a single comma-separated string.
        Some(Value::String(text)) => text
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn products_from(value: Option<&Value>) -> Vec<ProductService> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(ProductService {
                    name: name.clone(),
                    description: String::new(),
                }),
                Value::Object(_) => {
                    let name = item.get("name").and_then(|v| v.as_str())?;
                    Some(ProductService {
                        name: name.to_string(),
                        description: item
                            .get("description")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                    })
                }
                _ => None,
            })
            .collect(),
        Some(Value::String(text)) => text
            .split(',')
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .map(|part| ProductService {
                name: part.to_string(),
                description: String::new(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn faqs_from(value: Option<&Value>) -> Vec<Faq> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let question = item.get("question").and_then(|v| v.as_str())?;
            let answer = item.get("answer").and_then(|v| v.as_str()).unwrap_or_default();
            Some(Faq {
                question: question.to_string(),
                answer: answer.to_string(),
            })
        })
        .collect()
}

fn contact_from(value: Option<&Value>) -> ContactInfo {
    let Some(node) = value else {
        return ContactInfo::default();
    };
    ContactInfo {
        website: node
            .get("website")
            .and_then(|v| v.as_str())
            .map(|text| text.to_string()),
        email: node
            .get("email")
            .and_then(|v| v.as_str())
            .map(|text| text.to_string()),
    }
}

fn experience_from(value: Option<&Value>) -> Vec<ExperienceEntry> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let title = item.get("title").and_then(|v| v.as_str())?;
            Some(ExperienceEntry {
                title: title.to_string(),
                company: item
                    .get("company")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                date: item
                    .get("date")
                    .or_else(|| item.get("duration"))
                    .or_else(|| item.get("dateRange"))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect()
}
