//! Story state store - The single source of truth for narrative progress
//!
//! Flags, chapter number, chapter phase and the talked-to set live here.
//! Everything that gates content visibility reads this store; mutation goes
//! through the operations below and nowhere else. Notifications are queued
//! as [`StateEvent`]s and drained by the host once per tick.

use crate::domain::entities::DialogueNode;
use crate::domain::value_objects::{ChapterState, CharacterId, FlagName};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Notification emitted by the store, consumed in order via
/// [`StoryState::drain_events`]
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    FlagSet(FlagName),
    ChapterChanged(i32),
    ChapterStateChanged(ChapterState),
}

/// Mutable narrative progress for one game session
#[derive(Debug)]
pub struct StoryState {
    current_chapter: i32,
    chapter_state: ChapterState,
    active_flags: HashSet<FlagName>,
    talked_characters: HashSet<CharacterId>,
    events: VecDeque<StateEvent>,
}

impl StoryState {
    pub fn new() -> Self {
        Self {
            current_chapter: 1,
            chapter_state: ChapterState::Intro,
            active_flags: HashSet::new(),
            talked_characters: HashSet::new(),
            events: VecDeque::new(),
        }
    }

    pub fn current_chapter(&self) -> i32 {
        self.current_chapter
    }

    pub fn chapter_state(&self) -> ChapterState {
        self.chapter_state
    }

    /// Activate a flag. Idempotent: the set notification fires only on the
    /// first insertion. Empty names are ignored.
    pub fn set_flag(&mut self, flag: impl Into<FlagName>) {
        let flag = flag.into();
        if flag.is_empty() {
            return;
        }

        if self.active_flags.insert(flag.clone()) {
            log::debug!("[StoryState] Flag set: {flag}");
            self.events.push_back(StateEvent::FlagSet(flag));
        }
    }

    pub fn has_flag(&self, flag: &FlagName) -> bool {
        self.active_flags.contains(flag)
    }

    /// Deactivate a flag. Idempotent.
    pub fn remove_flag(&mut self, flag: &FlagName) {
        if self.active_flags.remove(flag) {
            log::debug!("[StoryState] Flag removed: {flag}");
        }
    }

    pub fn clear_flags(&mut self) {
        self.active_flags.clear();
    }

    /// Record that the player has spoken with a character. The first
    /// occurrence also sets the derived `talked_{id}` flag.
    pub fn mark_character_talked(&mut self, character: &CharacterId) {
        if self.talked_characters.insert(character.clone()) {
            self.set_flag(format!("talked_{character}"));
            log::debug!("[StoryState] Talked to: {character}");
        }
    }

    pub fn has_talked_to(&self, character: &CharacterId) -> bool {
        self.talked_characters.contains(character)
    }

    /// Move to a chapter. Sets the derived `chapter_{n}_started` flag and
    /// notifies observers; unchanged chapters are a no-op. Chapter numbers
    /// are open-ended integers with no bound checking.
    pub fn set_chapter(&mut self, chapter: i32) {
        if self.current_chapter != chapter {
            self.current_chapter = chapter;
            self.set_flag(format!("chapter_{chapter}_started"));
            log::debug!("[StoryState] Chapter changed to: {chapter}");
            self.events.push_back(StateEvent::ChapterChanged(chapter));
        }
    }

    pub fn advance_chapter(&mut self) {
        self.set_chapter(self.current_chapter + 1);
    }

    pub fn set_chapter_state(&mut self, state: ChapterState) {
        if self.chapter_state != state {
            self.chapter_state = state;
            log::debug!("[StoryState] Chapter state changed to: {state:?}");
            self.events.push_back(StateEvent::ChapterStateChanged(state));
        }
    }

    /// The visibility predicate: a node shows iff the chapter is reached,
    /// every required flag is active and no blocking flag is active. Pure in
    /// `(current_chapter, active_flags)`; re-evaluated on every traversal
    /// step, never cached.
    pub fn can_show_node(&self, node: &DialogueNode) -> bool {
        if self.current_chapter < node.minimum_chapter {
            return false;
        }

        for required in &node.required_flags {
            if !required.is_empty() && !self.has_flag(required) {
                return false;
            }
        }

        for blocked in &node.blocked_by_flags {
            if !blocked.is_empty() && self.has_flag(blocked) {
                return false;
            }
        }

        true
    }

    /// Take all queued notifications, oldest first
    pub fn drain_events(&mut self) -> Vec<StateEvent> {
        self.events.drain(..).collect()
    }

    /// Flatten into a serializable record. Collections are sorted so the
    /// exported form is stable.
    pub fn export(&self) -> SavedState {
        let mut flags: Vec<FlagName> = self.active_flags.iter().cloned().collect();
        flags.sort();
        let mut talked_characters: Vec<CharacterId> =
            self.talked_characters.iter().cloned().collect();
        talked_characters.sort();

        SavedState {
            chapter: self.current_chapter,
            chapter_state: self.chapter_state,
            flags,
            talked_characters,
        }
    }

    /// Restore from a saved record, replacing all current state. No derived
    /// flags are re-computed and no events fire; the record is taken as-is.
    pub fn import(&mut self, saved: SavedState) {
        self.current_chapter = saved.chapter;
        self.chapter_state = saved.chapter_state;
        self.active_flags = saved.flags.into_iter().collect();
        self.talked_characters = saved.talked_characters.into_iter().collect();
        self.events.clear();
    }
}

impl Default for StoryState {
    fn default() -> Self {
        Self::new()
    }
}

/// Flat persistence record for [`StoryState`]; round-trips exactly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedState {
    pub chapter: i32,
    pub chapter_state: ChapterState,
    pub flags: Vec<FlagName>,
    pub talked_characters: Vec<CharacterId>,
}
