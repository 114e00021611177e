//! Domain errors - Business rule violations in the dialogue graph

use crate::domain::value_objects::{CharacterId, NodeId};
use thiserror::Error;

/// Errors raised by the data model and its load-time validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("Unknown character '{character}'")]
    UnknownCharacter { character: CharacterId },

    #[error("Unknown node '{node}' for character '{character}'")]
    UnknownNode { character: CharacterId, node: NodeId },

    #[error("Duplicate node id '{node}' for character '{character}'")]
    DuplicateNode { character: CharacterId, node: NodeId },

    #[error("Node '{node}' of character '{character}' references missing node '{reference}'")]
    DanglingReference {
        character: CharacterId,
        node: NodeId,
        reference: NodeId,
    },

    #[error("No entry node for character '{character}' in chapter {chapter}")]
    NoEntryNode { character: CharacterId, chapter: i32 },
}

impl DomainError {
    pub fn unknown_character(character: impl Into<CharacterId>) -> Self {
        Self::UnknownCharacter {
            character: character.into(),
        }
    }

    pub fn unknown_node(character: impl Into<CharacterId>, node: impl Into<NodeId>) -> Self {
        Self::UnknownNode {
            character: character.into(),
            node: node.into(),
        }
    }

    pub fn no_entry_node(character: impl Into<CharacterId>, chapter: i32) -> Self {
        Self::NoEntryNode {
            character: character.into(),
            chapter,
        }
    }
}
