//! Working state of the single in-progress traversal

use crate::contracts::OutputSurface;
use crate::domain::entities::{DialogueLine, DialogueNode};
use crate::domain::value_objects::CharacterId;
use crate::runtime::typewriter::Typewriter;

/// Which line sequence the session is currently walking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlaybackPhase {
    /// Playing the node's own lines
    Lines,
    /// Choices are on screen, waiting for a selection
    AwaitingChoice,
    /// Playing the response lines of a selected choice; the destination is
    /// resolved once they run out
    Responses { choice_index: usize },
}

/// One active traversal of one character's node graph. At most one exists
/// at a time; it is dropped wholesale when the dialogue ends.
pub(crate) struct PlaybackSession {
    pub character: CharacterId,
    /// The node being played, cloned out of the read-only database
    pub node: DialogueNode,
    pub line_cursor: usize,
    pub phase: PlaybackPhase,
    pub typewriter: Option<Typewriter>,
    pub surface: Option<Box<dyn OutputSurface>>,
}

impl PlaybackSession {
    pub fn new(
        character: CharacterId,
        node: DialogueNode,
        surface: Option<Box<dyn OutputSurface>>,
    ) -> Self {
        Self {
            character,
            node,
            line_cursor: 0,
            phase: PlaybackPhase::Lines,
            typewriter: None,
            surface,
        }
    }

    /// The line sequence the cursor currently indexes into
    pub fn active_lines(&self) -> &[DialogueLine] {
        match self.phase {
            PlaybackPhase::Responses { choice_index } => self
                .node
                .choices
                .get(choice_index)
                .map(|c| c.response_lines.as_slice())
                .unwrap_or(&[]),
            _ => &self.node.lines,
        }
    }

    pub fn current_line(&self) -> Option<&DialogueLine> {
        self.active_lines().get(self.line_cursor)
    }

    pub fn is_typing(&self) -> bool {
        self.typewriter.as_ref().is_some_and(|tw| !tw.is_complete())
    }
}
