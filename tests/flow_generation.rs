mod common;

use std::sync::Arc;

use voiceforge::domains::agent::{UseCase, VoiceStyle};
use voiceforge::domains::profile::Profile;
use voiceforge::error::VoiceForgeError;
use voiceforge::services::generator::{FlowGenerator, GenerateFlowError};

use common::{acme_extraction, model_flow_reply, QueueLlmProvider};

fn acme_profile() -> Profile {
    common::init_logging();
    Profile::from_extraction(&common::acme_extraction(), true).unwrap()
}

#[tokio::test]
async fn generation_produces_positional_ids_and_prompt_material() {
    let llm = Arc::new(QueueLlmProvider::new(vec![Ok(model_flow_reply())]));
    let generator = FlowGenerator::new(llm.clone());
    let profile = acme_profile();

    let generated = generator
        .generate(
            Some(&profile),
            UseCase::Sales,
            "Acme Robotics",
            VoiceStyle::Professional,
            None,
        )
        .await
        .unwrap();

    assert_eq!(generated.flow.len(), 2);
    for (index, scenario) in generated.flow.iter().enumerate() {
        assert_eq!(
            scenario.id.as_deref(),
            Some(format!("scenario-{}", index + 1).as_str())
        );
    }
    assert!(generated.system_prompt.contains("Acme Robotics"));
    assert_eq!(generated.knowledge_base["company_name"], "Acme Robotics");

    // The flow prompt handed to the model carries the profile material.
    let prompts = llm.recorded_prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Acme Robotics"));
    assert!(prompts[0].contains("sales"));
}

#[tokio::test]
async fn fenced_model_output_is_accepted() {
    let fenced = format!("```json\n{}\n```", model_flow_reply());
    let llm = Arc::new(QueueLlmProvider::new(vec![Ok(fenced)]));
    let generator = FlowGenerator::new(llm);

    let generated = generator
        .generate(
            Some(&acme_profile()),
            UseCase::Sales,
            "Acme Robotics",
            VoiceStyle::Friendly,
            None,
        )
        .await
        .unwrap();
    assert_eq!(generated.flow.len(), 2);
}

#[tokio::test]
async fn missing_profile_is_a_hard_error_even_with_fallback() {
    let llm = Arc::new(QueueLlmProvider::new(vec![]));
    let generator = FlowGenerator::new(llm);

    let err = generator
        .generate_or_fallback(None, UseCase::Sales, "Acme", VoiceStyle::Calm, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GenerateFlowError::MissingProfile));
}

#[tokio::test]
async fn upstream_failure_degrades_to_sales_templates() {
    let llm = Arc::new(QueueLlmProvider::new(vec![Err(VoiceForgeError::Http(
        "model offline".to_string(),
    ))]));
    let generator = FlowGenerator::new(llm);

    let generated = generator
        .generate_or_fallback(
            Some(&acme_profile()),
            UseCase::Sales,
            "Acme Robotics",
            VoiceStyle::Professional,
            None,
        )
        .await
        .unwrap();

    let labels: Vec<&str> = generated
        .flow
        .iter()
        .map(|scenario| scenario.scenario.as_str())
        .collect();
    assert_eq!(
        labels,
        vec!["Introduction", "Products/Services", "Pricing", "Call to Action"]
    );
    for (index, scenario) in generated.flow.iter().enumerate() {
        assert_eq!(
            scenario.id.as_deref(),
            Some(format!("scenario-{}", index + 1).as_str())
        );
    }
}

#[tokio::test]
async fn prose_output_degrades_to_use_case_templates() {
    let llm = Arc::new(QueueLlmProvider::new(vec![Ok(
        "I cannot produce JSON today.".to_string(),
    )]));
    let generator = FlowGenerator::new(llm);

    let generated = generator
        .generate_or_fallback(
            Some(&acme_profile()),
            UseCase::CustomerSupport,
            "Acme Robotics",
            VoiceStyle::Professional,
            None,
        )
        .await
        .unwrap();

    let labels: Vec<&str> = generated
        .flow
        .iter()
        .map(|scenario| scenario.scenario.as_str())
        .collect();
    assert_eq!(labels, vec!["Introduction", "Issue Troubleshooting", "Follow-up"]);
}

#[tokio::test]
async fn custom_prompt_is_used_verbatim() {
    let llm = Arc::new(QueueLlmProvider::new(vec![Ok(model_flow_reply())]));
    let generator = FlowGenerator::new(llm);

    let generated = generator
        .generate(
            Some(&acme_profile()),
            UseCase::Sales,
            "Acme Robotics",
            VoiceStyle::Professional,
            Some("You are a terse assistant."),
        )
        .await
        .unwrap();
    assert_eq!(generated.system_prompt, "You are a terse assistant.");
}

#[tokio::test]
async fn individual_extraction_feeds_individual_knowledge_base() {
    let raw = serde_json::json!({
        "individualProfile": {
            "name": "Jordan Lee",
            "title": "Freelance Data Engineer",
            "about": "Ten years of pipeline work for retail analytics teams.",
            "coreSkills": ["Airflow", "Spark", "dbt"],
            "contactInfo": { "website": "https://jordanlee.example.com" }
        }
    });
    let profile = Profile::from_extraction(&raw, false).unwrap();

    let llm = Arc::new(QueueLlmProvider::new(vec![Ok(model_flow_reply())]));
    let generator = FlowGenerator::new(llm);
    let generated = generator
        .generate(
            Some(&profile),
            UseCase::LeadQualification,
            "Jordan Lee",
            VoiceStyle::Calm,
            None,
        )
        .await
        .unwrap();

    assert_eq!(generated.knowledge_base["name"], "Jordan Lee");
    assert_eq!(generated.knowledge_base["title"], "Freelance Data Engineer");
    assert!(generated.system_prompt.contains("Jordan Lee"));
}

#[test]
fn extraction_payload_shapes_agree() {
    // The nested vendor shape and the flat normalized shape fold into the
    // same canonical profile name.
    let nested = Profile::from_extraction(&acme_extraction(), true).unwrap();
    let flat = Profile::from_extraction(
        &serde_json::json!({ "company_name": "Acme Robotics" }),
        true,
    )
    .unwrap();
    assert_eq!(nested.display_name(), flat.display_name());
}
