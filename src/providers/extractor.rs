use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;
use url::Url;

use crate::error::{Result, VoiceForgeError};
use crate::interfaces::providers::ProfileExtractor;

/// Simulated extraction service. Production would call a scraping or
/// enrichment vendor here; this implementation fills the same response
/// shape from fixed templates plus name heuristics on the URL.
#[derive(Debug, Default)]
pub struct TemplateExtractor;

impl TemplateExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProfileExtractor for TemplateExtractor {
    async fn extract(
        &self,
        url: &str,
        is_company: bool,
        name: &str,
        email: &str,
    ) -> Result<Value> {
        if url.trim().is_empty() {
            return Err(VoiceForgeError::Validation("URL is required".to_string()));
        }
        info!(
            url,
            entity = if is_company { "company" } else { "individual" },
            "extracting structured profile information"
        );

        let fallback_name = name_from_url(url);
        let name = if name.trim().is_empty() {
            fallback_name.as_str()
        } else {
            name
        };
        let email = if email.trim().is_empty() {
            if is_company {
                "contact@company.com"
            } else {
                "contact@individual.com"
            }
        } else {
            email
        };

        if is_company {
            Ok(json!({
                "companyProfile": {
                    "name": name,
                    "tagline": "AI-Powered solutions for business growth",
                    "toneOfVoice": "Professional, Insightful, Conversational",
                    "about": "A leading provider of innovative solutions helping businesses grow and succeed in the digital age. Focused on delivering exceptional value and measurable results for clients across various industries.",
                    "productsServices": [
                        { "name": "AI Sales Agents", "description": "Conversational AI that understands your products and helps close sales" },
                        { "name": "Customer Support Bots", "description": "24/7 automated customer service that feels personal" },
                        { "name": "Lead Qualification", "description": "AI-powered lead scoring and qualification" }
                    ],
                    "useCases": [
                        "AI Sales Agents for eCommerce",
                        "Support Bots for SaaS onboarding",
                        "Lead qualification and nurturing"
                    ],
                    "industriesServed": [
                        "Technology",
                        "Retail",
                        "Financial Services",
                        "Healthcare"
                    ],
                    "faqs": [
                        { "question": format!("What does {name} do?"), "answer": format!("{name} provides AI-powered sales and support automation to help businesses increase revenue and customer satisfaction.") },
                        { "question": "How do I get started?", "answer": "You can schedule a demo through our website or contact our sales team directly." },
                        { "question": "Can I talk to a real representative?", "answer": "Yes, you can schedule a call with one of our sales representatives through our website." }
                    ],
                    "contactInfo": {
                        "website": url,
                        "scheduleDemo": "#schedule-demo",
                        "email": email
                    }
                }
            }))
        } else {
            Ok(json!({
                "individualProfile": {
                    "name": name,
                    "title": "Sales Professional",
                    "headline": "Helping businesses grow through innovative solutions",
                    "toneOfVoice": "Professional, Friendly, Knowledgeable",
                    "about": "Experienced sales professional with a passion for helping businesses leverage technology to achieve their goals. Specializes in understanding client needs and providing tailored solutions that deliver measurable results.",
                    "coreSkills": [
                        "Consultative Sales",
                        "Relationship Building",
                        "Solution Design",
                        "Customer Success"
                    ],
                    "servicesOffered": [
                        "Sales Consulting",
                        "Business Development Strategy"
                    ],
                    "experienceHighlights": [
                        { "title": "Senior Sales Manager", "company": "Tech Innovations Inc.", "date": "2020 - Present" },
                        { "title": "Sales Representative", "company": "Digital Solutions Co.", "date": "2018 - 2020" }
                    ],
                    "contact": {
                        "email": email,
                        "calendly": "#schedule-meeting"
                    }
                }
            }))
        }
    }
}

/// Best-effort display name from a profile URL: LinkedIn slugs become
/// title-cased words, anything else falls back to the domain's first
/// label.
pub fn name_from_url(url: &str) -> String {
    if let Some(slug) = url
        .split("linkedin.com/company/")
        .nth(1)
        .or_else(|| url.split("linkedin.com/in/").nth(1))
    {
        let slug = slug.split('/').next().unwrap_or_default();
        if !slug.is_empty() {
            return title_case_slug(slug);
        }
    }

    match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed
                .host_str()
                .unwrap_or_default()
                .trim_start_matches("www.");
            let label = host.split('.').next().unwrap_or_default();
            if label.is_empty() {
                "Unknown".to_string()
            } else {
                title_case_slug(label)
            }
        }
        Err(_) => "Unknown".to_string(),
    }
}

fn title_case_slug(slug: &str) -> String {
    slug.replace('-', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
