//! # kurgu
//!
//! A dialogue graph interpreter and story-state engine for narrative
//! adventure games: flag-gated node traversal, interruptible typed-text
//! playback, branching choices with side effects, and a closed action
//! vocabulary external systems subscribe to.
//!
//! The engine is presentation-agnostic. Hosts hand it an
//! [`OutputSurface`](contracts::OutputSurface) to draw on, feed it input
//! signals and a clock, and drain its action stream once per tick.
//!
//! ## Quick Start
//!
//! ```rust
//! use kurgu::domain::{CharacterDialogueData, CharacterId, DialogueDatabase, DialogueLine, DialogueNode};
//! use kurgu::{DialogueRuntime, StoryState};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut node = DialogueNode::new("ch1_entry");
//! node.lines
//!     .push(DialogueLine::new("Garson", "Good evening, detective."));
//! let mut garson = CharacterDialogueData::new("Garson", "Garson");
//! garson.nodes.push(node);
//! let database = Arc::new(DialogueDatabase::new(vec![garson]));
//!
//! let mut runtime = DialogueRuntime::new(database, StoryState::new());
//! runtime.start_dialogue(&CharacterId::from("Garson"), None)?;
//!
//! runtime.next_line(); // interrupt: reveal the whole line
//! runtime.next_line(); // advance: the node has nothing further, so it ends
//! assert!(!runtime.is_active());
//! # Ok(())
//! # }
//! ```
//!
//! ## Loading authored content
//!
//! Databases are authored as JSON and validated at load time, so dangling
//! node references fail fast instead of mid-conversation:
//!
//! ```rust
//! let source = r#"{
//!     "characters": [{
//!         "character_id": "Garson",
//!         "display_name": "Garson",
//!         "nodes": [{ "node_id": "ch1_entry" }]
//!     }]
//! }"#;
//! let database = kurgu::parse_database(source)?;
//! assert_eq!(database.characters.len(), 1);
//! # Ok::<(), kurgu::infrastructure::LoadError>(())
//! ```

pub mod application;
pub mod cli;
pub mod contracts;
pub mod domain;
pub mod infrastructure;
pub mod runtime;
pub mod state;
pub mod storage;

// Stable public surface - the types most hosts need
pub use application::{ActionHandler, GameContext};
pub use contracts::{EngineError, OutputSurface, SessionSignal};
pub use domain::{
    ChapterState, CharacterId, DialogueAction, DialogueDatabase, FlagName, GameMode, NodeId,
};
pub use infrastructure::parse_database;
pub use runtime::DialogueRuntime;
pub use state::{SavedState, StateEvent, StoryState};
