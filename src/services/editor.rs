use thiserror::Error;
use tracing::debug;

use crate::domains::agent::{UseCase, VoiceStyle};
use crate::domains::flow::{fresh_scenario_id, ConversationFlow, ConversationScenario};
use crate::domains::profile::Profile;
use crate::services::generator::{FlowGenerator, GenerateFlowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Editing,
    Previewing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarField {
    Scenario,
    NextScenarioId,
    Conditions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayField {
    UserInputs,
    Responses,
    FollowUps,
}

impl ArrayField {
    fn singular(self) -> &'static str {
        match self {
            ArrayField::UserInputs => "user input",
            ArrayField::Responses => "response",
            ArrayField::FollowUps => "follow-up",
        }
    }

    fn items(self, scenario: &mut ConversationScenario) -> &mut Vec<String> {
        match self {
            ArrayField::UserInputs => &mut scenario.user_inputs,
            ArrayField::Responses => &mut scenario.responses,
            ArrayField::FollowUps => &mut scenario.follow_ups,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("a conversation flow must keep at least one scenario")]
    LastScenario,
    #[error("a scenario must keep at least one {0}")]
    LastArrayItem(&'static str),
    #[error("scenario index {0} is out of range")]
    IndexOutOfRange(usize),
    #[error("item index {0} is out of range")]
    ItemOutOfRange(usize),
    #[error("editing is not available while previewing")]
    Previewing,
}

/// In-memory editing surface over a conversation flow. Mutations are
/// rejected with a typed error instead of being silently coerced, and the
/// preview mode locks the flow read-only until it is exited.
pub struct FlowEditor {
    flow: ConversationFlow,
    selected: usize,
    mode: EditorMode,
    preview_index: usize,
}

impl FlowEditor {
    pub fn new(flow: ConversationFlow) -> Self {
        Self {
            flow,
            selected: 0,
            mode: EditorMode::Editing,
            preview_index: 0,
        }
    }

    pub fn flow(&self) -> &ConversationFlow {
        &self.flow
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    fn ensure_editing(&self) -> Result<(), EditorError> {
        match self.mode {
            EditorMode::Editing => Ok(()),
            EditorMode::Previewing => Err(EditorError::Previewing),
        }
    }

    fn scenario_mut(&mut self, index: usize) -> Result<&mut ConversationScenario, EditorError> {
        self.flow
            .get_mut(index)
            .ok_or(EditorError::IndexOutOfRange(index))
    }

    /// Appends a placeholder scenario and moves the selection to it.
    pub fn add_scenario(&mut self) -> Result<(), EditorError> {
        self.ensure_editing()?;
        self.flow.push(ConversationScenario {
            id: Some(fresh_scenario_id()),
            scenario: "New Scenario".to_string(),
            user_inputs: vec![
                "Sample question 1".to_string(),
                "Sample question 2".to_string(),
            ],
            responses: vec!["Sample response".to_string()],
            follow_ups: vec!["Sample follow-up question".to_string()],
            next_scenario_id: None,
            conditions: None,
        });
        self.selected = self.flow.len() - 1;
        Ok(())
    }

    /// Removes a scenario; the last remaining scenario cannot be deleted.
    /// The selection stays at the same position, clamped to the new end.
    pub fn delete_scenario(&mut self, index: usize) -> Result<(), EditorError> {
        self.ensure_editing()?;
        if index >= self.flow.len() {
            return Err(EditorError::IndexOutOfRange(index));
        }
        if self.flow.len() <= 1 {
            return Err(EditorError::LastScenario);
        }
        self.flow.remove(index);
        if self.selected > index {
            self.selected -= 1;
        }
        self.selected = self.selected.min(self.flow.len() - 1);
        Ok(())
    }

    /// Swaps a scenario with its neighbor; boundary moves are no-ops.
    /// The selection follows the moved scenario.
    pub fn move_scenario(&mut self, index: usize, direction: Direction) -> Result<(), EditorError> {
        self.ensure_editing()?;
        if index >= self.flow.len() {
            return Err(EditorError::IndexOutOfRange(index));
        }
        let target = match direction {
            Direction::Up if index == 0 => return Ok(()),
            Direction::Down if index == self.flow.len() - 1 => return Ok(()),
            Direction::Up => index - 1,
            Direction::Down => index + 1,
        };
        self.flow.swap(index, target);
        self.selected = target;
        Ok(())
    }

    pub fn update_scalar_field(
        &mut self,
        index: usize,
        field: ScalarField,
        value: Option<String>,
    ) -> Result<(), EditorError> {
        self.ensure_editing()?;
        let scenario = self.scenario_mut(index)?;
        match field {
            ScalarField::Scenario => scenario.scenario = value.unwrap_or_default(),
            ScalarField::NextScenarioId => scenario.next_scenario_id = value,
            ScalarField::Conditions => scenario.conditions = value,
        }
        Ok(())
    }

    pub fn update_array_field(
        &mut self,
        index: usize,
        field: ArrayField,
        values: Vec<String>,
    ) -> Result<(), EditorError> {
        self.ensure_editing()?;
        let scenario = self.scenario_mut(index)?;
        *field.items(scenario) = values;
        Ok(())
    }

    pub fn add_array_item(&mut self, index: usize, field: ArrayField) -> Result<(), EditorError> {
        self.ensure_editing()?;
        let scenario = self.scenario_mut(index)?;
        field.items(scenario).push(String::new());
        Ok(())
    }

    pub fn update_array_item(
        &mut self,
        index: usize,
        field: ArrayField,
        item_index: usize,
        value: String,
    ) -> Result<(), EditorError> {
        self.ensure_editing()?;
        let scenario = self.scenario_mut(index)?;
        let items = field.items(scenario);
        let slot = items
            .get_mut(item_index)
            .ok_or(EditorError::ItemOutOfRange(item_index))?;
        *slot = value;
        Ok(())
    }

    /// Removes one item from an array field; the last remaining item
    /// cannot be removed.
    pub fn remove_array_item(
        &mut self,
        index: usize,
        field: ArrayField,
        item_index: usize,
    ) -> Result<(), EditorError> {
        self.ensure_editing()?;
        let scenario = self.scenario_mut(index)?;
        let items = field.items(scenario);
        if item_index >= items.len() {
            return Err(EditorError::ItemOutOfRange(item_index));
        }
        if items.len() <= 1 {
            return Err(EditorError::LastArrayItem(field.singular()));
        }
        items.remove(item_index);
        Ok(())
    }

    /// Hands the current flow to the owning session. Editor state is left
    /// intact so editing can continue after a save.
    pub fn save(&self) -> ConversationFlow {
        self.flow.clone()
    }

    /// Re-invokes the generator. On success the whole flow is replaced and
    /// re-stamped with positional ids; on failure the existing flow is
    /// left untouched and the error is returned.
    #[allow(clippy::too_many_arguments)]
    pub async fn regenerate(
        &mut self,
        generator: &FlowGenerator,
        profile: Option<&Profile>,
        use_case: UseCase,
        entity_name: &str,
        voice_style: VoiceStyle,
        custom_prompt: Option<&str>,
    ) -> Result<(), GenerateFlowError> {
        self.ensure_editing()
            .map_err(|_| GenerateFlowError::Upstream("editor is previewing".to_string()))?;
        let generated = generator
            .generate(profile, use_case, entity_name, voice_style, custom_prompt)
            .await?;
        debug!(scenarios = generated.flow.len(), "regenerated flow accepted");
        self.flow = generated.flow;
        self.selected = 0;
        Ok(())
    }

    /// Enters preview mode at the first scenario. Fails on an empty flow.
    pub fn start_preview(&mut self) -> Result<&ConversationScenario, EditorError> {
        let first = self.flow.get(0).ok_or(EditorError::IndexOutOfRange(0))?;
        self.mode = EditorMode::Previewing;
        self.preview_index = 0;
        Ok(first)
    }

    /// Advances the preview: a resolvable branch override wins, otherwise
    /// the sequential successor. At the end of the flow the editor drops
    /// back to editing mode and `None` is returned.
    pub fn continue_preview(&mut self) -> Option<&ConversationScenario> {
        if self.mode != EditorMode::Previewing {
            return None;
        }
        match self.flow.next_preview_index(self.preview_index) {
            Some(next) => {
                self.preview_index = next;
                self.flow.get(next)
            }
            None => {
                self.mode = EditorMode::Editing;
                None
            }
        }
    }

    pub fn stop_preview(&mut self) {
        self.mode = EditorMode::Editing;
    }
}

/// Standalone read-only preview walk, for callers that want to traverse a
/// flow without holding an editor.
pub struct PreviewWalk<'a> {
    flow: &'a ConversationFlow,
    index: usize,
    scenario: &'a ConversationScenario,
}

impl<'a> PreviewWalk<'a> {
    pub fn start(flow: &'a ConversationFlow) -> Option<Self> {
        let scenario = flow.get(0)?;
        Some(Self {
            flow,
            index: 0,
            scenario,
        })
    }

    pub fn current(&self) -> &'a ConversationScenario {
        self.scenario
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    /// `None` signals end of flow.
    pub fn advance(&mut self) -> Option<&'a ConversationScenario> {
        let next = self.flow.next_preview_index(self.index)?;
        let scenario = self.flow.get(next)?;
        self.index = next;
        self.scenario = scenario;
        Some(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(label: &str) -> ConversationScenario {
        ConversationScenario {
            scenario: label.to_string(),
            user_inputs: vec!["Hi".to_string()],
            responses: vec!["Hello".to_string()],
            follow_ups: vec!["Anything else?".to_string()],
            ..Default::default()
        }
    }

    fn editor(labels: &[&str]) -> FlowEditor {
        FlowEditor::new(ConversationFlow::new(
            labels.iter().map(|label| scenario(label)).collect(),
        ))
    }

    #[test]
    fn delete_is_rejected_at_one_scenario() {
        let mut editor = editor(&["Only"]);
        let before = editor.flow().clone();
        assert_eq!(editor.delete_scenario(0), Err(EditorError::LastScenario));
        assert_eq!(editor.flow(), &before);
    }

    #[test]
    fn delete_clamps_selection_to_nearest_neighbor() {
        let mut editor = editor(&["A", "B", "C"]);
        editor.selected = 2;
        editor.delete_scenario(2).unwrap();
        assert_eq!(editor.selected(), 1);

        let mut editor = editor_with_selection(&["A", "B", "C"], 2);
        editor.delete_scenario(0).unwrap();
        assert_eq!(editor.selected(), 1);
        assert_eq!(editor.flow().get(0).unwrap().scenario, "B");
    }

    fn editor_with_selection(labels: &[&str], selected: usize) -> FlowEditor {
        let mut e = editor(labels);
        e.selected = selected;
        e
    }

    #[test]
    fn boundary_moves_are_no_ops() {
        let mut editor = editor(&["A", "B"]);
        let before = editor.flow().clone();
        editor.move_scenario(0, Direction::Up).unwrap();
        editor.move_scenario(1, Direction::Down).unwrap();
        assert_eq!(editor.flow(), &before);
    }

    #[test]
    fn move_swaps_and_selection_follows() {
        let mut editor = editor(&["A", "B", "C"]);
        editor.move_scenario(2, Direction::Up).unwrap();
        assert_eq!(editor.flow().get(1).unwrap().scenario, "C");
        assert_eq!(editor.selected(), 1);
    }

    #[test]
    fn add_then_delete_restores_prior_flow_exactly() {
        let mut editor = editor(&["A", "B"]);
        let before = editor.flow().clone();
        editor.add_scenario().unwrap();
        let new_index = editor.selected();
        assert_eq!(new_index, 2);
        editor.delete_scenario(new_index).unwrap();
        assert_eq!(editor.flow(), &before);
    }

    #[test]
    fn added_scenarios_get_distinct_ids() {
        let mut editor = editor(&["A"]);
        editor.add_scenario().unwrap();
        editor.add_scenario().unwrap();
        let first = editor.flow().get(1).unwrap().id.clone().unwrap();
        let second = editor.flow().get(2).unwrap().id.clone().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn array_item_removal_is_floor_guarded() {
        let mut editor = editor(&["A"]);
        assert_eq!(
            editor.remove_array_item(0, ArrayField::Responses, 0),
            Err(EditorError::LastArrayItem("response"))
        );
        editor.add_array_item(0, ArrayField::Responses).unwrap();
        editor.remove_array_item(0, ArrayField::Responses, 1).unwrap();
        assert_eq!(editor.flow().get(0).unwrap().responses.len(), 1);
    }

    #[test]
    fn array_item_updates_in_place() {
        let mut editor = editor(&["A"]);
        editor
            .update_array_item(0, ArrayField::UserInputs, 0, "How much?".to_string())
            .unwrap();
        assert_eq!(editor.flow().get(0).unwrap().user_inputs[0], "How much?");
        assert_eq!(
            editor.update_array_item(0, ArrayField::UserInputs, 5, String::new()),
            Err(EditorError::ItemOutOfRange(5))
        );
    }

    #[test]
    fn scalar_updates_set_branching_fields() {
        let mut editor = editor(&["A", "B"]);
        editor
            .update_scalar_field(0, ScalarField::NextScenarioId, Some("scenario-2".to_string()))
            .unwrap();
        editor
            .update_scalar_field(0, ScalarField::Conditions, Some("caller asked for pricing".to_string()))
            .unwrap();
        let first = editor.flow().get(0).unwrap();
        assert_eq!(first.next_scenario_id.as_deref(), Some("scenario-2"));
        assert!(first.conditions.is_some());
    }

    #[test]
    fn previewing_blocks_edits_until_exited() {
        let mut editor = editor(&["A", "B"]);
        editor.start_preview().unwrap();
        assert_eq!(editor.add_scenario(), Err(EditorError::Previewing));
        editor.stop_preview();
        editor.add_scenario().unwrap();
    }

    #[test]
    fn sequential_preview_visits_every_index_then_halts() {
        let mut editor = editor(&["A", "B", "C"]);
        let first = editor.start_preview().unwrap().scenario.clone();
        assert_eq!(first, "A");
        assert_eq!(editor.continue_preview().unwrap().scenario, "B");
        assert_eq!(editor.continue_preview().unwrap().scenario, "C");
        assert!(editor.continue_preview().is_none());
        // End of flow returns the editor to editing mode.
        assert_eq!(editor.mode(), EditorMode::Editing);
    }

    #[test]
    fn branch_override_skips_ahead() {
        let mut flow = ConversationFlow::new(vec![scenario("A"), scenario("B"), scenario("C")]);
        flow.assign_positional_ids();
        flow.get_mut(0).unwrap().next_scenario_id = Some("scenario-3".to_string());

        let mut walk = PreviewWalk::start(&flow).unwrap();
        assert_eq!(walk.current_index(), 0);
        assert_eq!(walk.advance().unwrap().scenario, "C");
        assert!(walk.advance().is_none());
    }

    #[test]
    fn walk_never_mutates_the_flow() {
        let flow = ConversationFlow::new(vec![scenario("A"), scenario("B")]);
        let before = flow.clone();
        let mut walk = PreviewWalk::start(&flow).unwrap();
        while walk.advance().is_some() {}
        assert_eq!(flow, before);
    }

    #[test]
    fn save_leaves_editor_usable() {
        let mut editor = editor(&["A"]);
        let saved = editor.save();
        assert_eq!(&saved, editor.flow());
        editor.add_scenario().unwrap();
        assert_eq!(editor.flow().len(), 2);
        // The saved copy is a snapshot, not a live view.
        assert_eq!(saved.len(), 1);
    }
}
