//! Public contracts - Stable interfaces for external consumers
//!
//! The playback engine talks to the presentation layer exclusively through
//! [`OutputSurface`]; it never reads state back. Hosts observe the engine
//! through the error type, the [`SessionSignal`] queue and the action stream.

use crate::domain::errors::DomainError;
use crate::domain::value_objects::{CharacterId, NodeId};

/// Presentation panel driven by the playback engine.
///
/// Every call is fire-and-forget: the engine's state machine advances the
/// same way whether or not a surface is attached, so a missing surface can
/// never deadlock a session.
pub trait OutputSurface {
    /// A new line begins: show the speaker and prepare for typed text
    fn display_line(&mut self, speaker: &CharacterId, text: &str, typing_speed: f32);

    /// The typed-text reveal progressed; `partial` is the coherent prefix
    /// revealed so far
    fn update_typed_text(&mut self, partial: &str);

    /// The current line finished revealing (naturally or by interrupt)
    fn on_typing_complete(&mut self);

    /// Present choices in order; selection comes back by index
    fn show_choices(&mut self, choices: &[String]);

    fn hide_choices(&mut self);

    /// The session ended; dismiss the dialogue presentation
    fn hide_dialogue(&mut self);
}

/// Session lifecycle notifications, drained by the host once per tick
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSignal {
    DialogueStarted(CharacterId),
    DialogueEnded,
}

/// Errors returned across the engine's public boundary.
///
/// None of these are fatal and none leave the engine in a corrupt state: a
/// failed operation is a no-op, and content errors drive the session to idle
/// rather than crashing.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A session is already active; concurrent dialogue starts are rejected
    #[error("Dialogue already active")]
    DialogueActive,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl EngineError {
    pub fn unknown_character(character: impl Into<CharacterId>) -> Self {
        Self::Domain(DomainError::unknown_character(character))
    }

    pub fn unknown_node(character: impl Into<CharacterId>, node: impl Into<NodeId>) -> Self {
        Self::Domain(DomainError::unknown_node(character, node))
    }
}
