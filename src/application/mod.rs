//! Application context - explicit wiring of the core services
//!
//! Replaces ambient singletons with a container holding the services in
//! dependency order: dialogue database first, story state second, playback
//! engine third, action subscribers last. The context also pumps the
//! engine's action outbox to the registered handlers once per tick,
//! preserving the synchronous, at-most-once delivery contract.

use crate::domain::entities::DialogueDatabase;
use crate::domain::value_objects::DialogueAction;
use crate::runtime::DialogueRuntime;
use crate::state::StoryState;
use std::sync::Arc;

/// External collaborator reacting to dispatched actions.
///
/// Handlers own the real-world effects (scene switches, minigame launches,
/// forced walks) and re-enter the core only through the documented paths:
/// `force_play_node`, the story-state operations and `submit_final_decision`.
pub trait ActionHandler {
    fn handle_action(&mut self, action: DialogueAction, runtime: &mut DialogueRuntime);
}

/// Process-wide container for the dialogue core and its subscribers
pub struct GameContext {
    runtime: DialogueRuntime,
    handlers: Vec<Box<dyn ActionHandler>>,
}

impl GameContext {
    /// Build the core with a fresh story state
    pub fn new(database: Arc<DialogueDatabase>) -> Self {
        Self::with_state(database, StoryState::new())
    }

    /// Build the core around existing narrative progress (a loaded save)
    pub fn with_state(database: Arc<DialogueDatabase>, state: StoryState) -> Self {
        let runtime = DialogueRuntime::new(database, state);
        Self {
            runtime,
            handlers: Vec::new(),
        }
    }

    /// Subscribe a handler to the action stream. Handlers are invoked in
    /// registration order for every dispatched action.
    pub fn register_action_handler(&mut self, handler: Box<dyn ActionHandler>) {
        self.handlers.push(handler);
    }

    pub fn runtime(&self) -> &DialogueRuntime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut DialogueRuntime {
        &mut self.runtime
    }

    /// Deliver queued actions to every handler, oldest first. Each action is
    /// delivered at most once; actions a handler provokes in turn stay
    /// queued until the next pump.
    pub fn pump(&mut self) {
        let actions = self.runtime.take_actions();
        for action in actions {
            for handler in &mut self.handlers {
                handler.handle_action(action, &mut self.runtime);
            }
        }
    }
}
