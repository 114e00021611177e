//! Infrastructure repositories - persistence behind async traits
//!
//! File-backed implementations for real hosts, in-memory implementations
//! for tests and embedding.

use crate::domain::entities::DialogueDatabase;
use crate::infrastructure::loader::{parse_database, LoadError};
use crate::state::SavedState;
use async_trait::async_trait;
use std::path::PathBuf;

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database not found at '{path}'")]
    DatabaseNotFound { path: PathBuf },

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Invalid data: {message}")]
    InvalidData { message: String },
}

impl From<LoadError> for RepositoryError {
    fn from(error: LoadError) -> Self {
        Self::InvalidData {
            message: error.to_string(),
        }
    }
}

/// Source of the dialogue database
#[async_trait]
pub trait DatabaseRepository: Send + Sync {
    async fn load_database(&self) -> Result<DialogueDatabase, RepositoryError>;
}

/// Store for exported story state, one record per slot
#[async_trait]
pub trait SaveDataRepository: Send + Sync {
    async fn save_state(&self, slot: u8, state: &SavedState) -> Result<(), RepositoryError>;

    /// `Ok(None)` when the slot has never been written
    async fn load_state(&self, slot: u8) -> Result<Option<SavedState>, RepositoryError>;
}

/// Loads the database from a JSON file on disk
pub struct FileDatabaseRepository {
    path: PathBuf,
}

impl FileDatabaseRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DatabaseRepository for FileDatabaseRepository {
    async fn load_database(&self) -> Result<DialogueDatabase, RepositoryError> {
        let source = tokio::fs::read_to_string(&self.path).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                RepositoryError::DatabaseNotFound {
                    path: self.path.clone(),
                }
            } else {
                RepositoryError::Io {
                    message: err.to_string(),
                }
            }
        })?;

        Ok(parse_database(&source)?)
    }
}

/// Holds the database source in memory; useful for tests and embedding
pub struct InMemoryDatabaseRepository {
    source: String,
}

impl InMemoryDatabaseRepository {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

#[async_trait]
impl DatabaseRepository for InMemoryDatabaseRepository {
    async fn load_database(&self) -> Result<DialogueDatabase, RepositoryError> {
        Ok(parse_database(&self.source)?)
    }
}

/// Writes save records as JSON files under a base directory
pub struct FileSaveDataRepository {
    base_path: PathBuf,
}

impl FileSaveDataRepository {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn slot_path(&self, slot: u8) -> PathBuf {
        self.base_path.join(format!("save_{slot}.json"))
    }
}

#[async_trait]
impl SaveDataRepository for FileSaveDataRepository {
    async fn save_state(&self, slot: u8, state: &SavedState) -> Result<(), RepositoryError> {
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|err| RepositoryError::Io {
                message: err.to_string(),
            })?;

        let json = serde_json::to_string_pretty(state).map_err(|err| {
            RepositoryError::InvalidData {
                message: err.to_string(),
            }
        })?;

        tokio::fs::write(self.slot_path(slot), json)
            .await
            .map_err(|err| RepositoryError::Io {
                message: err.to_string(),
            })
    }

    async fn load_state(&self, slot: u8) -> Result<Option<SavedState>, RepositoryError> {
        let path = self.slot_path(slot);
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(RepositoryError::Io {
                    message: err.to_string(),
                });
            }
        };

        let state = serde_json::from_str(&json).map_err(|err| RepositoryError::InvalidData {
            message: err.to_string(),
        })?;
        Ok(Some(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ChapterState;

    const SOURCE: &str = r#"{
        "characters": [
            {
                "character_id": "Garson",
                "display_name": "Garson",
                "nodes": [{ "node_id": "ch1_entry" }]
            }
        ]
    }"#;

    #[tokio::test]
    async fn in_memory_repository_loads_database() {
        let repo = InMemoryDatabaseRepository::new(SOURCE);
        let database = repo.load_database().await.unwrap();
        assert_eq!(database.characters.len(), 1);
    }

    #[tokio::test]
    async fn in_memory_repository_rejects_bad_source() {
        let repo = InMemoryDatabaseRepository::new("{broken");
        assert!(matches!(
            repo.load_database().await,
            Err(RepositoryError::InvalidData { .. })
        ));
    }

    #[tokio::test]
    async fn file_repository_reports_missing_database() {
        let repo = FileDatabaseRepository::new("/definitely/not/here.json");
        assert!(matches!(
            repo.load_database().await,
            Err(RepositoryError::DatabaseNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn save_repository_round_trips_state() {
        let base = std::env::temp_dir().join(format!("kurgu_saves_{}", std::process::id()));
        let repo = FileSaveDataRepository::new(&base);

        let state = SavedState {
            chapter: 2,
            chapter_state: ChapterState::Chapter2SalonFree,
            flags: vec!["fruitninja_completed".into()],
            talked_characters: vec!["AsciFadime".into()],
        };

        repo.save_state(1, &state).await.unwrap();
        let restored = repo.load_state(1).await.unwrap();
        assert_eq!(restored, Some(state));

        assert_eq!(repo.load_state(9).await.unwrap(), None);

        let _ = tokio::fs::remove_dir_all(&base).await;
    }
}
