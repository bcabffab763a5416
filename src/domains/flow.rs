use chrono::Utc;
use rand::rngs::SysRng;
use rand::TryRng;
use serde::{Deserialize, Serialize};

/// One labeled unit of dialogue: trigger phrases, candidate agent
/// responses, follow-up questions, and an optional branch override.
///
/// Serialized camelCase to match the wire shape the flow model is asked
/// to produce and the shape persisted alongside the agent record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationScenario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub scenario: String,
    #[serde(default)]
    pub user_inputs: Vec<String>,
    #[serde(default)]
    pub responses: Vec<String>,
    #[serde(default)]
    pub follow_ups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_scenario_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<String>,
}

/// Display marker for a scenario in a list. First matching rule wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    Intro,
    Question,
    Decision,
    General,
}

impl ConversationScenario {
    pub fn kind(&self) -> ScenarioKind {
        let label = self.scenario.to_lowercase();
        if label.contains("intro") || label.contains("greeting") {
            ScenarioKind::Intro
        } else if self.user_inputs.iter().any(|input| input.contains('?'))
            || label.contains("question")
        {
            ScenarioKind::Question
        } else if self.next_scenario_id.is_some() || self.conditions.is_some() {
            ScenarioKind::Decision
        } else {
            ScenarioKind::General
        }
    }

    /// The scenario's stable id, synthesized positionally when absent.
    pub fn effective_id(&self, index: usize) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| positional_id(index))
    }
}

pub fn positional_id(index: usize) -> String {
    format!("scenario-{}", index + 1)
}

/// A unique id for a scenario created in the editor. Random bytes when the
/// system RNG cooperates, a timestamp otherwise.
pub fn fresh_scenario_id() -> String {
    let mut bytes = [0u8; 4];
    let mut rng = SysRng;
    if rng.try_fill_bytes(&mut bytes).is_err() {
        return format!("scenario-{}", Utc::now().timestamp_millis());
    }
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("scenario-{hex}")
}

/// Ordered scenario list forming the full script for a voice agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationFlow {
    scenarios: Vec<ConversationScenario>,
}

impl ConversationFlow {
    pub fn new(scenarios: Vec<ConversationScenario>) -> Self {
        Self { scenarios }
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ConversationScenario> {
        self.scenarios.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ConversationScenario> {
        self.scenarios.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConversationScenario> {
        self.scenarios.iter()
    }

    pub fn push(&mut self, scenario: ConversationScenario) {
        self.scenarios.push(scenario);
    }

    pub fn remove(&mut self, index: usize) -> ConversationScenario {
        self.scenarios.remove(index)
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        self.scenarios.swap(a, b);
    }

    /// Resolves a scenario id to its position, honoring synthesized
    /// positional ids for scenarios without one.
    pub fn index_of_id(&self, id: &str) -> Option<usize> {
        self.scenarios
            .iter()
            .enumerate()
            .find(|(index, scenario)| scenario.effective_id(*index) == id)
            .map(|(index, _)| index)
    }

    /// Stamps every scenario with a positional id, replacing whatever was
    /// there. Applied when a freshly generated flow is accepted.
    pub fn assign_positional_ids(&mut self) {
        for (index, scenario) in self.scenarios.iter_mut().enumerate() {
            scenario.id = Some(positional_id(index));
        }
    }

    /// Next index for a preview walk: a resolvable branch override wins,
    /// otherwise the sequential successor. `None` means end of flow.
    pub fn next_preview_index(&self, current: usize) -> Option<usize> {
        let scenario = self.scenarios.get(current)?;
        if let Some(target) = scenario
            .next_scenario_id
            .as_deref()
            .and_then(|id| self.index_of_id(id))
        {
            return Some(target);
        }
        let next = current + 1;
        (next < self.scenarios.len()).then_some(next)
    }
}

impl IntoIterator for ConversationFlow {
    type Item = ConversationScenario;
    type IntoIter = std::vec::IntoIter<ConversationScenario>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenarios.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(label: &str) -> ConversationScenario {
        ConversationScenario {
            scenario: label.to_string(),
            user_inputs: vec!["Hello".to_string()],
            responses: vec!["Hi".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn classification_order_is_a_tie_break() {
        let greeting = scenario("Greeting");
        assert_eq!(greeting.kind(), ScenarioKind::Intro);

        let mut pricing = scenario("Pricing FAQ");
        pricing.user_inputs = vec!["How much does it cost?".to_string()];
        assert_eq!(pricing.kind(), ScenarioKind::Question);

        let mut neutral = scenario("Handoff");
        neutral.next_scenario_id = Some("scenario-3".to_string());
        assert_eq!(neutral.kind(), ScenarioKind::Decision);

        assert_eq!(scenario("Closing").kind(), ScenarioKind::General);

        // An intro label wins even when inputs contain question marks.
        let mut intro_question = scenario("Introduction");
        intro_question.user_inputs = vec!["Who are you?".to_string()];
        assert_eq!(intro_question.kind(), ScenarioKind::Intro);
    }

    #[test]
    fn positional_ids_resolve_when_absent() {
        let flow = ConversationFlow::new(vec![scenario("A"), scenario("B")]);
        assert_eq!(flow.index_of_id("scenario-2"), Some(1));
        assert_eq!(flow.index_of_id("scenario-9"), None);
    }

    #[test]
    fn explicit_ids_shadow_positional_ones() {
        let mut flow = ConversationFlow::new(vec![scenario("A"), scenario("B")]);
        flow.get_mut(0).unwrap().id = Some("greet".to_string());
        assert_eq!(flow.index_of_id("greet"), Some(0));
        assert_eq!(flow.index_of_id("scenario-1"), None);
    }

    #[test]
    fn preview_index_follows_branch_then_sequence() {
        let mut flow =
            ConversationFlow::new(vec![scenario("A"), scenario("B"), scenario("C")]);
        flow.assign_positional_ids();
        flow.get_mut(0).unwrap().next_scenario_id = Some("scenario-3".to_string());

        assert_eq!(flow.next_preview_index(0), Some(2));
        assert_eq!(flow.next_preview_index(1), Some(2));
        assert_eq!(flow.next_preview_index(2), None);
    }

    #[test]
    fn unresolvable_branch_falls_back_to_sequence() {
        let mut flow = ConversationFlow::new(vec![scenario("A"), scenario("B")]);
        flow.get_mut(0).unwrap().next_scenario_id = Some("missing".to_string());
        assert_eq!(flow.next_preview_index(0), Some(1));
    }

    #[test]
    fn fresh_ids_are_distinct() {
        assert_ne!(fresh_scenario_id(), fresh_scenario_id());
    }

    #[test]
    fn serializes_camel_case() {
        let mut s = scenario("Intro");
        s.next_scenario_id = Some("scenario-2".to_string());
        let value = serde_json::to_value(&s).unwrap();
        assert!(value.get("userInputs").is_some());
        assert!(value.get("followUps").is_some());
        assert_eq!(
            value.get("nextScenarioId").and_then(|v| v.as_str()),
            Some("scenario-2")
        );
    }
}
