//! Dialogue playback engine - the node traversal state machine
//!
//! [`DialogueRuntime`] owns the story state and at most one
//! [`PlaybackSession`](session::PlaybackSession). Hosts drive it with input
//! signals (`next_line`, `select_choice`), an external clock (`tick`) and
//! drain its action/signal outboxes once per frame. Every public operation
//! either succeeds, is a reported no-op, or drives the session back to idle;
//! nothing here is fatal.

use crate::contracts::{EngineError, OutputSurface, SessionSignal};
use crate::domain::entities::{DialogueDatabase, DialogueNode};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{
    ChapterState, CharacterId, DialogueAction, FlagName, GameMode, NodeId,
};
use crate::state::StoryState;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use session::{PlaybackPhase, PlaybackSession};
use typewriter::Progress;

pub mod session;
pub mod typewriter;


/// Seconds per character when a line does not specify its own pace
pub const DEFAULT_TYPING_SPEED: f32 = 0.03;

/// The playback engine. Single-threaded and cooperatively scheduled: all
/// suspension is either time-paced (the typewriter) or input-paced (advance
/// and choice signals).
pub struct DialogueRuntime {
    database: Arc<DialogueDatabase>,
    state: StoryState,
    session: Option<PlaybackSession>,
    default_typing_speed: f32,
    game_mode: GameMode,
    actions: VecDeque<DialogueAction>,
    signals: VecDeque<SessionSignal>,
    final_decision_callback: Option<Box<dyn FnMut(&str)>>,
}

impl DialogueRuntime {
    /// Construction order follows the dependency chain: the database exists
    /// first, the story state second, the engine last.
    pub fn new(database: Arc<DialogueDatabase>, state: StoryState) -> Self {
        Self {
            database,
            state,
            session: None,
            default_typing_speed: DEFAULT_TYPING_SPEED,
            game_mode: GameMode::Free,
            actions: VecDeque::new(),
            signals: VecDeque::new(),
            final_decision_callback: None,
        }
    }

    pub fn with_typing_speed(mut self, seconds_per_char: f32) -> Self {
        self.default_typing_speed = seconds_per_char;
        self
    }

    pub fn database(&self) -> &DialogueDatabase {
        &self.database
    }

    pub fn state(&self) -> &StoryState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StoryState {
        &mut self.state
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_typing(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_typing())
    }

    pub fn is_awaiting_choice(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.phase == PlaybackPhase::AwaitingChoice)
    }

    pub fn active_character(&self) -> Option<&CharacterId> {
        self.session.as_ref().map(|s| &s.character)
    }

    pub fn active_node(&self) -> Option<&NodeId> {
        self.session.as_ref().map(|s| &s.node.node_id)
    }

    /// The coherent prefix of the current line revealed so far
    pub fn revealed_text(&self) -> Option<&str> {
        self.session
            .as_ref()?
            .typewriter
            .as_ref()
            .map(|tw| tw.revealed_text())
    }

    pub fn game_mode(&self) -> GameMode {
        self.game_mode
    }

    /// External interludes (minigame completion) hand the mode back
    pub fn set_game_mode(&mut self, mode: GameMode) {
        self.game_mode = mode;
    }

    /// Drain dispatched actions, oldest first. Each action appears at most
    /// once, in dispatch order (a choice's action before its node's
    /// completion action).
    pub fn take_actions(&mut self) -> Vec<DialogueAction> {
        self.actions.drain(..).collect()
    }

    /// Drain session lifecycle notifications, oldest first
    pub fn take_signals(&mut self) -> Vec<SessionSignal> {
        self.signals.drain(..).collect()
    }

    /// Open a free (player-initiated) conversation with a character.
    ///
    /// Rejected while a session is active. Entry-node selection runs under
    /// the current chapter and flags; with no qualifying entry the dialogue
    /// never opens. On success the character is marked as talked to and the
    /// entry node starts playing.
    pub fn start_dialogue(
        &mut self,
        character_id: &CharacterId,
        surface: Option<Box<dyn OutputSurface>>,
    ) -> Result<(), EngineError> {
        if self.session.is_some() {
            log::warn!("[DialogueRuntime] Dialogue already active");
            return Err(EngineError::DialogueActive);
        }

        let database = Arc::clone(&self.database);
        let character = database
            .character(character_id)
            .ok_or_else(|| EngineError::unknown_character(character_id.clone()))?;

        let entry = character
            .entry_node(&self.state)
            .cloned()
            .ok_or_else(|| {
                log::error!(
                    "[DialogueRuntime] No entry node for {character_id} in chapter {}",
                    self.state.current_chapter()
                );
                EngineError::from(DomainError::no_entry_node(
                    character_id.clone(),
                    self.state.current_chapter(),
                ))
            })?;

        self.state.mark_character_talked(character_id);
        self.open_session(character_id.clone(), entry.clone(), surface);
        self.enter_node(entry);
        Ok(())
    }

    /// Open a session directly on a named node, bypassing entry selection
    /// and visibility filtering. This is how forced story beats resume after
    /// an external interlude; an already-active session is replaced.
    pub fn force_play_node(
        &mut self,
        character_id: &CharacterId,
        node_id: &NodeId,
        surface: Option<Box<dyn OutputSurface>>,
    ) -> Result<(), EngineError> {
        let database = Arc::clone(&self.database);
        let node = database
            .character(character_id)
            .ok_or_else(|| EngineError::unknown_character(character_id.clone()))?
            .node(node_id)
            .ok_or_else(|| EngineError::unknown_node(character_id.clone(), node_id.clone()))?
            .clone();

        if self.session.is_some() {
            log::debug!("[DialogueRuntime] Force play replaces the active session");
        }
        self.open_session(character_id.clone(), node.clone(), surface);
        self.enter_node(node);
        Ok(())
    }

    /// Advance the typed-text reveal by `dt` seconds of wall-clock time
    pub fn tick(&mut self, dt: f32) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let PlaybackSession {
            typewriter,
            surface,
            ..
        } = session;
        let Some(tw) = typewriter.as_mut() else {
            return;
        };

        match tw.tick(dt) {
            Progress::Waiting => {}
            Progress::Revealed => {
                if let Some(surface) = surface.as_mut() {
                    surface.update_typed_text(tw.revealed_text());
                }
            }
            Progress::Finished => {
                if let Some(surface) = surface.as_mut() {
                    surface.update_typed_text(tw.revealed_text());
                    surface.on_typing_complete();
                }
            }
        }
    }

    /// The "continue" input. While a line is revealing this completes the
    /// reveal instead of advancing; the next invocation advances the cursor,
    /// then presents choices or completes the node once lines run out.
    pub fn next_line(&mut self) {
        let Some(session) = self.session.as_ref() else {
            log::debug!("[DialogueRuntime] Continue ignored, no active dialogue");
            return;
        };

        if session.is_typing() {
            self.complete_typing();
            return;
        }

        match session.phase {
            PlaybackPhase::AwaitingChoice => {
                log::debug!("[DialogueRuntime] Continue ignored, waiting for a choice");
            }
            PlaybackPhase::Lines | PlaybackPhase::Responses { .. } => self.advance_line(),
        }
    }

    /// Select a presented choice by index. Out-of-range indices and calls
    /// with no pending choices are reported no-ops.
    pub fn select_choice(&mut self, index: usize) {
        let Some(session) = self.session.as_ref() else {
            log::warn!("[DialogueRuntime] Choice selected with no active dialogue");
            return;
        };
        if session.phase != PlaybackPhase::AwaitingChoice {
            log::warn!("[DialogueRuntime] Choice selected but none are pending");
            return;
        }
        let Some(choice) = session.node.choices.get(index) else {
            log::warn!("[DialogueRuntime] Choice index {index} out of range");
            return;
        };

        let flag = choice.flag_to_set.clone();
        let action = choice.action_on_select;
        let has_responses = !choice.response_lines.is_empty();

        if let Some(flag) = flag {
            self.state.set_flag(flag);
        }
        if !action.is_none() {
            self.execute_action(action);
            // The action may have closed the session (minigame starts do)
            if self.session.is_none() {
                return;
            }
        }

        if let Some(session) = self.session.as_mut() {
            if let Some(surface) = session.surface.as_mut() {
                surface.hide_choices();
            }
        }

        if has_responses {
            if let Some(session) = self.session.as_mut() {
                session.phase = PlaybackPhase::Responses {
                    choice_index: index,
                };
                session.line_cursor = 0;
            }
            self.play_current_line();
        } else {
            self.resolve_after_choice(index);
        }
    }

    /// Close the active session. Idempotent, and safe to invoke from inside
    /// action bookkeeping: the session is cleared before any notification
    /// goes out.
    pub fn end_dialogue(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if let Some(surface) = session.surface.as_mut() {
            surface.hide_dialogue();
        }
        self.game_mode = GameMode::Free;
        self.signals.push_back(SessionSignal::DialogueEnded);
        log::debug!("[DialogueRuntime] Dialogue ended");
    }

    /// Register the single final-decision callback. A later registration
    /// replaces an earlier one; there is no queue.
    pub fn register_final_decision_callback(&mut self, callback: Box<dyn FnMut(&str)>) {
        self.final_decision_callback = Some(callback);
    }

    /// Deliver the player's final accusation to the registered callback,
    /// independent of node traversal
    pub fn submit_final_decision(&mut self, choice: &str) {
        log::info!("[DialogueRuntime] Final decision submitted: {choice}");
        if let Some(callback) = self.final_decision_callback.as_mut() {
            callback(choice);
        }
    }

    fn open_session(
        &mut self,
        character: CharacterId,
        node: DialogueNode,
        surface: Option<Box<dyn OutputSurface>>,
    ) {
        self.game_mode = GameMode::Talk;
        self.signals
            .push_back(SessionSignal::DialogueStarted(character.clone()));
        self.session = Some(PlaybackSession::new(character, node, surface));
    }

    /// Transition onto a node. Visibility is re-checked here on every entry,
    /// even for forced play: a failing node cascade-skips along its
    /// `next_node_id` chain, and the session ends when the chain runs dry.
    /// Revisiting a node already skipped in this cascade also ends the
    /// session instead of looping.
    fn enter_node(&mut self, node: DialogueNode) {
        let Some(character) = self.session.as_ref().map(|s| s.character.clone()) else {
            return;
        };
        let database = Arc::clone(&self.database);

        let mut node = node;
        let mut skipped: HashSet<NodeId> = HashSet::new();
        while !self.state.can_show_node(&node) {
            log::debug!(
                "[DialogueRuntime] Node {} conditions not met, skipping",
                node.node_id
            );
            skipped.insert(node.node_id.clone());
            let next = node
                .next_node_id
                .as_ref()
                .and_then(|id| database.node(&character, id))
                .filter(|n| !skipped.contains(&n.node_id))
                .cloned();
            match next {
                Some(n) => node = n,
                None => {
                    self.end_dialogue();
                    return;
                }
            }
        }

        log::debug!("[DialogueRuntime] Playing node: {}", node.node_id);
        let has_lines = !node.lines.is_empty();
        let has_choices = !node.choices.is_empty();

        if let Some(session) = self.session.as_mut() {
            session.node = node;
            session.line_cursor = 0;
            session.phase = PlaybackPhase::Lines;
            session.typewriter = None;
        }

        if has_lines {
            self.play_current_line();
        } else if has_choices {
            self.present_choices();
        } else {
            self.complete_node();
        }
    }

    fn play_current_line(&mut self) {
        let default_speed = self.default_typing_speed;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(line) = session.current_line().cloned() else {
            return;
        };

        let speed = if line.typing_speed > 0.0 {
            line.typing_speed
        } else {
            default_speed
        };
        if let Some(surface) = session.surface.as_mut() {
            surface.display_line(&line.speaker, &line.text, speed);
        }
        session.typewriter = Some(typewriter::Typewriter::new(&line.text, speed));
    }

    fn complete_typing(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let PlaybackSession {
            typewriter,
            surface,
            ..
        } = session;
        let Some(tw) = typewriter.as_mut() else {
            return;
        };
        if tw.force_complete() {
            if let Some(surface) = surface.as_mut() {
                surface.update_typed_text(tw.revealed_text());
                surface.on_typing_complete();
            }
        }
    }

    fn advance_line(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.line_cursor += 1;
        let has_more = session.line_cursor < session.active_lines().len();
        let phase = session.phase;
        let has_choices = !session.node.choices.is_empty();

        if has_more {
            self.play_current_line();
            return;
        }

        match phase {
            PlaybackPhase::Lines => {
                if has_choices {
                    self.present_choices();
                } else {
                    self.complete_node();
                }
            }
            PlaybackPhase::Responses { choice_index } => self.resolve_after_choice(choice_index),
            PlaybackPhase::AwaitingChoice => {}
        }
    }

    fn present_choices(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.phase = PlaybackPhase::AwaitingChoice;
        session.typewriter = None;
        let texts: Vec<String> = session
            .node
            .choices
            .iter()
            .map(|c| c.choice_text.clone())
            .collect();
        if let Some(surface) = session.surface.as_mut() {
            surface.show_choices(&texts);
        }
    }

    /// Route to the post-choice destination: the choice's jump target wins
    /// over the owning node's `next_node_id`; with neither resolving, the
    /// node completes as a terminal.
    fn resolve_after_choice(&mut self, choice_index: usize) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let character = session.character.clone();
        let destination = session
            .node
            .choices
            .get(choice_index)
            .and_then(|c| c.jump_to_node_id.clone())
            .or_else(|| session.node.next_node_id.clone());

        if let Some(id) = destination {
            let database = Arc::clone(&self.database);
            if let Some(node) = database.node(&character, &id).cloned() {
                self.enter_node(node);
                return;
            }
            log::warn!("[DialogueRuntime] Post-choice destination '{id}' not found");
        }

        self.complete_node();
    }

    /// Fire the completion action, then chain to `next_node_id` or end the
    /// session. Dispatch happens before chaining so a completion action can
    /// redirect flow externally; if it closed the session, chaining stops.
    fn complete_node(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let character = session.character.clone();
        let action = session.node.on_complete_action;
        let next = session.node.next_node_id.clone();

        if !action.is_none() {
            self.execute_action(action);
            if self.session.is_none() {
                return;
            }
        }

        if let Some(id) = next {
            let database = Arc::clone(&self.database);
            if let Some(node) = database.node(&character, &id).cloned() {
                self.enter_node(node);
                return;
            }
            log::warn!("[DialogueRuntime] Next node '{id}' not found, ending dialogue");
        }

        self.end_dialogue();
    }

    /// Engine-side bookkeeping for an action, then emission. The engine
    /// never waits on the subscriber's real-world effect; resumption after
    /// an interlude comes back through `force_play_node`.
    fn execute_action(&mut self, action: DialogueAction) {
        log::debug!("[DialogueRuntime] Executing action: {action:?}");

        match action {
            DialogueAction::StartMinigameFruitNinja | DialogueAction::StartMinigameTableClean => {
                self.end_dialogue();
                self.game_mode = GameMode::Minigame;
            }
            DialogueAction::EndChapter1 => {
                self.state.set_chapter(2);
                self.state.set_chapter_state(ChapterState::Chapter2Start);
            }
            DialogueAction::EndChapter2 => {
                self.state.set_chapter_state(ChapterState::Finale);
            }
            DialogueAction::DisableCharacterBesteci => {
                self.state.set_flag("besteci_unavailable");
            }
            DialogueAction::EnableCharacterBesteci => {
                self.state.remove_flag(&FlagName::from("besteci_unavailable"));
            }
            DialogueAction::DisableCharacterSimyaci => {
                self.state.set_flag("simyaci_unavailable");
            }
            DialogueAction::EnableCharacterSimyaci => {
                self.state.remove_flag(&FlagName::from("simyaci_unavailable"));
            }
            // Forced transitions, chapter two kickoff and the final decision
            // are handled entirely by subscribers
            _ => {}
        }

        self.actions.push_back(action);
    }
}
