//! Domain entities - The dialogue graph data model
//!
//! A database holds one node set per character. Nodes carry their own flow
//! control (`next_node_id`, choices with jump targets) and visibility rules
//! (required/blocked flags, minimum chapter). The whole model is read-only
//! during gameplay; it is loaded once at startup.

use crate::domain::errors::DomainError;
use crate::domain::value_objects::{CharacterId, DialogueAction, FlagName, NodeId};
use crate::state::StoryState;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One spoken line. A `typing_speed` of 0 selects the engine default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: CharacterId,
    pub text: String,
    #[serde(default)]
    pub typing_speed: f32,
}

impl DialogueLine {
    pub fn new(speaker: impl Into<CharacterId>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            typing_speed: 0.0,
        }
    }
}

/// One option presented to the player at the end of a node's lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueChoice {
    pub choice_text: String,
    /// Lines spoken in reply to this choice, each one typed and each waiting
    /// for an advance signal before the next begins
    #[serde(default)]
    pub response_lines: Vec<DialogueLine>,
    /// Preferred destination; falls back to the owning node's `next_node_id`
    #[serde(default)]
    pub jump_to_node_id: Option<NodeId>,
    #[serde(default)]
    pub flag_to_set: Option<FlagName>,
    #[serde(default)]
    pub action_on_select: DialogueAction,
}

impl DialogueChoice {
    pub fn new(choice_text: impl Into<String>) -> Self {
        Self {
            choice_text: choice_text.into(),
            response_lines: Vec::new(),
            jump_to_node_id: None,
            flag_to_set: None,
            action_on_select: DialogueAction::None,
        }
    }
}

fn default_minimum_chapter() -> i32 {
    1
}

/// One addressable block of dialogue content plus its flow and visibility rules.
///
/// A node with no lines and no choices is legal: it completes immediately,
/// firing `on_complete_action` and following `next_node_id` if present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueNode {
    pub node_id: NodeId,
    #[serde(default)]
    pub lines: Vec<DialogueLine>,
    #[serde(default)]
    pub choices: Vec<DialogueChoice>,
    #[serde(default)]
    pub next_node_id: Option<NodeId>,
    #[serde(default)]
    pub on_complete_action: DialogueAction,
    /// All of these must be active for the node to show (empty = always)
    #[serde(default)]
    pub required_flags: Vec<FlagName>,
    /// None of these may be active for the node to show (empty = always)
    #[serde(default)]
    pub blocked_by_flags: Vec<FlagName>,
    #[serde(default = "default_minimum_chapter")]
    pub minimum_chapter: i32,
}

impl DialogueNode {
    pub fn new(node_id: impl Into<NodeId>) -> Self {
        Self {
            node_id: node_id.into(),
            lines: Vec::new(),
            choices: Vec::new(),
            next_node_id: None,
            on_complete_action: DialogueAction::None,
            required_flags: Vec::new(),
            blocked_by_flags: Vec::new(),
            minimum_chapter: 1,
        }
    }
}

/// Node id substrings recognized as free-conversation entry points
const ENTRY_POINT_PATTERNS: [&str; 4] = ["entry", "second", "post_minigame", "post_tableclean"];

/// All dialogue nodes belonging to one character.
///
/// Node declaration order is preserved: entry selection breaks score ties on
/// first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDialogueData {
    pub character_id: CharacterId,
    pub display_name: String,
    #[serde(default)]
    pub nodes: Vec<DialogueNode>,
}

impl CharacterDialogueData {
    pub fn new(character_id: impl Into<CharacterId>, display_name: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            display_name: display_name.into(),
            nodes: Vec::new(),
        }
    }

    /// Look up a node by id
    pub fn node(&self, node_id: &NodeId) -> Option<&DialogueNode> {
        self.nodes.iter().find(|n| &n.node_id == node_id)
    }

    /// Select the node to start from when the player freely initiates
    /// dialogue.
    ///
    /// Priority search over all currently visible entry-point nodes: the
    /// highest-scoring candidate wins, so a chapter- or flag-gated bridge
    /// node outranks the generic entry point whenever both qualify. Returns
    /// `None` when nothing qualifies; the caller must not open a session.
    pub fn entry_node(&self, state: &StoryState) -> Option<&DialogueNode> {
        let mut best: Option<(&DialogueNode, i32)> = None;

        for node in &self.nodes {
            if node.minimum_chapter > state.current_chapter() {
                continue;
            }
            if !state.can_show_node(node) {
                continue;
            }
            if !ENTRY_POINT_PATTERNS
                .iter()
                .any(|p| node.node_id.contains(p))
            {
                continue;
            }

            let score = Self::entry_score(node);
            match best {
                // Ties keep the first-seen candidate
                Some((_, top)) if score <= top => {}
                _ => best = Some((node, score)),
            }
        }

        best.map(|(node, _)| node)
    }

    fn entry_score(node: &DialogueNode) -> i32 {
        let mut score = node.minimum_chapter * 1000;

        // More specific conditions outrank general ones
        score += node.required_flags.len() as i32 * 100;

        for flag in &node.required_flags {
            score += match flag.as_str() {
                "tableclean_completed" => 500,
                "talked_all_suspects" => 200,
                "fruitninja_completed" => 100,
                _ => 0,
            };
        }

        // Keeps gated bridge nodes above the generic entry point
        if node.node_id.contains("entry") {
            score -= 50;
        }

        score
    }
}

/// Top-level mapping from character to dialogue data. Read-only during
/// gameplay; populated once before the first session opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DialogueDatabase {
    #[serde(default)]
    pub characters: Vec<CharacterDialogueData>,
}

impl DialogueDatabase {
    pub fn new(characters: Vec<CharacterDialogueData>) -> Self {
        Self { characters }
    }

    pub fn character(&self, character_id: &CharacterId) -> Option<&CharacterDialogueData> {
        self.characters
            .iter()
            .find(|c| &c.character_id == character_id)
    }

    pub fn node(&self, character_id: &CharacterId, node_id: &NodeId) -> Option<&DialogueNode> {
        self.character(character_id).and_then(|c| c.node(node_id))
    }

    /// Validate graph integrity: node ids unique per character, and every
    /// `next_node_id`/`jump_to_node_id` resolving within its character's node
    /// set. Run at load time so dangling references surface before play.
    pub fn validate(&self) -> Result<(), DomainError> {
        for character in &self.characters {
            let mut seen: HashSet<&NodeId> = HashSet::new();
            for node in &character.nodes {
                if !seen.insert(&node.node_id) {
                    return Err(DomainError::DuplicateNode {
                        character: character.character_id.clone(),
                        node: node.node_id.clone(),
                    });
                }
            }

            for node in &character.nodes {
                let mut references: Vec<&NodeId> = Vec::new();
                if let Some(next) = &node.next_node_id {
                    references.push(next);
                }
                for choice in &node.choices {
                    if let Some(jump) = &choice.jump_to_node_id {
                        references.push(jump);
                    }
                }

                for reference in references {
                    if character.node(reference).is_none() {
                        return Err(DomainError::DanglingReference {
                            character: character.character_id.clone(),
                            node: node.node_id.clone(),
                            reference: reference.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gated_entry(id: &str, chapter: i32, required: &[&str]) -> DialogueNode {
        let mut node = DialogueNode::new(id);
        node.minimum_chapter = chapter;
        node.required_flags = required.iter().map(|f| FlagName::from(*f)).collect();
        node
    }

    #[test]
    fn entry_prefers_flag_gated_node_over_generic_entry() {
        let mut data = CharacterDialogueData::new("AsciFadime", "Fadime");
        data.nodes.push(gated_entry("ch1_entry", 1, &[]));
        data.nodes
            .push(gated_entry("ch1_second", 1, &["tableclean_completed"]));

        let mut state = StoryState::new();
        state.set_flag("tableclean_completed");

        // 1600 vs 950
        let entry = data.entry_node(&state).unwrap();
        assert_eq!(entry.node_id, NodeId::from("ch1_second"));
    }

    #[test]
    fn entry_falls_back_to_generic_entry_without_flags() {
        let mut data = CharacterDialogueData::new("AsciFadime", "Fadime");
        data.nodes.push(gated_entry("ch1_entry", 1, &[]));
        data.nodes
            .push(gated_entry("ch1_second", 1, &["tableclean_completed"]));

        let state = StoryState::new();

        let entry = data.entry_node(&state).unwrap();
        assert_eq!(entry.node_id, NodeId::from("ch1_entry"));
    }

    #[test]
    fn entry_ignores_nodes_without_entry_point_pattern() {
        let mut data = CharacterDialogueData::new("Garson", "Garson");
        data.nodes.push(gated_entry("ch1_reaction", 1, &[]));

        let state = StoryState::new();
        assert!(data.entry_node(&state).is_none());
    }

    #[test]
    fn entry_skips_nodes_above_current_chapter() {
        let mut data = CharacterDialogueData::new("Garson", "Garson");
        data.nodes.push(gated_entry("ch2_entry", 2, &[]));
        data.nodes.push(gated_entry("ch1_entry", 1, &[]));

        let state = StoryState::new();
        let entry = data.entry_node(&state).unwrap();
        assert_eq!(entry.node_id, NodeId::from("ch1_entry"));
    }

    #[test]
    fn entry_scoring_is_deterministic_on_ties() {
        let mut data = CharacterDialogueData::new("Garson", "Garson");
        data.nodes.push(gated_entry("ch1_second", 1, &["clue_a"]));
        data.nodes.push(gated_entry("ch1_second_b", 1, &["clue_b"]));

        let mut state = StoryState::new();
        state.set_flag("clue_a");
        state.set_flag("clue_b");

        // Equal scores: first declared wins, every time
        for _ in 0..3 {
            let entry = data.entry_node(&state).unwrap();
            assert_eq!(entry.node_id, NodeId::from("ch1_second"));
        }
    }

    #[test]
    fn entry_higher_chapter_outranks_flag_bonuses() {
        let mut data = CharacterDialogueData::new("AsciFadime", "Fadime");
        data.nodes
            .push(gated_entry("ch1_second", 1, &["tableclean_completed"]));
        data.nodes.push(gated_entry("ch2_entry", 2, &[]));

        let mut state = StoryState::new();
        state.set_flag("tableclean_completed");
        state.set_chapter(2);

        // 1950 vs 1600
        let entry = data.entry_node(&state).unwrap();
        assert_eq!(entry.node_id, NodeId::from("ch2_entry"));
    }

    #[test]
    fn validate_rejects_duplicate_node_ids() {
        let mut data = CharacterDialogueData::new("Garson", "Garson");
        data.nodes.push(DialogueNode::new("ch1_entry"));
        data.nodes.push(DialogueNode::new("ch1_entry"));

        let db = DialogueDatabase::new(vec![data]);
        assert!(matches!(
            db.validate(),
            Err(DomainError::DuplicateNode { .. })
        ));
    }

    #[test]
    fn validate_rejects_dangling_next_reference() {
        let mut node = DialogueNode::new("ch1_entry");
        node.next_node_id = Some(NodeId::from("ch1_missing"));
        let mut data = CharacterDialogueData::new("Garson", "Garson");
        data.nodes.push(node);

        let db = DialogueDatabase::new(vec![data]);
        match db.validate() {
            Err(DomainError::DanglingReference { reference, .. }) => {
                assert_eq!(reference, NodeId::from("ch1_missing"));
            }
            other => panic!("Expected DanglingReference, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_dangling_choice_jump() {
        let mut choice = DialogueChoice::new("a) ask about the kitchen");
        choice.jump_to_node_id = Some(NodeId::from("nowhere"));
        let mut node = DialogueNode::new("ch1_entry");
        node.choices.push(choice);
        let mut data = CharacterDialogueData::new("AsciFadime", "Fadime");
        data.nodes.push(node);

        let db = DialogueDatabase::new(vec![data]);
        assert!(matches!(
            db.validate(),
            Err(DomainError::DanglingReference { .. })
        ));
    }

    #[test]
    fn validate_accepts_resolving_references() {
        let mut entry = DialogueNode::new("ch1_entry");
        entry.next_node_id = Some(NodeId::from("ch1_more"));
        let mut choice = DialogueChoice::new("b) press harder");
        choice.jump_to_node_id = Some(NodeId::from("ch1_more"));
        entry.choices.push(choice);

        let mut data = CharacterDialogueData::new("Garson", "Garson");
        data.nodes.push(entry);
        data.nodes.push(DialogueNode::new("ch1_more"));

        let db = DialogueDatabase::new(vec![data]);
        assert!(db.validate().is_ok());
    }
}
