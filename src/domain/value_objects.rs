//! Domain value objects - Immutable identifiers and closed vocabularies

use serde::{Deserialize, Serialize};

/// Macro to implement common traits for string wrapper types
macro_rules! impl_string_wrapper {
    ($type:ident) => {
        impl From<String> for $type {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $type {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Identifies a speaking character; open-ended since casts are data-authored
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterId(String);

impl CharacterId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl_string_wrapper!(CharacterId);

/// Identifies a dialogue node within one character's node set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.0.contains(pattern)
    }
}

impl_string_wrapper!(NodeId);

/// A named boolean story fact
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlagName(String);

impl FlagName {
    pub fn new(name: String) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl_string_wrapper!(FlagName);

/// Side-effect tokens emitted by the playback engine for external systems.
///
/// The vocabulary is closed: subscribers match on these values and perform
/// the real-world effect (scene switches, minigame launches, forced walks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DialogueAction {
    #[default]
    None,

    // Minigames
    StartMinigameFruitNinja,
    StartMinigameTableClean,

    // Forced character transitions
    ForceCharacterGarson,
    ForceCharacterAsci,
    ForceCharacterTuccar,
    ForceCharacterAyca,
    ForceCharacterSimyaci,
    ForceCharacterBesteci,
    ForceCharacterBeatrice,

    // Chapter boundaries
    EndChapter1,
    EndChapter2,
    StartChapter2,

    // Finale
    ShowFinalDecision,

    // Character availability
    DisableCharacterBesteci,
    EnableCharacterBesteci,
    DisableCharacterSimyaci,
    EnableCharacterSimyaci,
}

impl DialogueAction {
    pub fn is_none(&self) -> bool {
        matches!(self, DialogueAction::None)
    }
}

/// Coarse story phase tracked alongside flags.
///
/// Presentation layers key off this; node visibility never consults it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChapterState {
    #[default]
    Intro,
    Chapter1AsciIntro,
    Chapter1SalonFree,
    Chapter1GarsonMinigame,
    Chapter1AsciSecond,
    Chapter2Start,
    Chapter2SalonFree,
    Chapter2FinalQuestion,
    Finale,
}

/// Interaction mode signal the engine maintains for the surrounding game loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameMode {
    /// Free exploration, no dialogue open
    #[default]
    Free,
    /// A dialogue session is active
    Talk,
    /// An external minigame interlude is running
    Minigame,
}
