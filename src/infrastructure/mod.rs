//! Infrastructure layer - loading and persistence implementations

pub mod loader;
pub mod repositories;

pub use loader::{parse_database, source_digest, LoadError};
pub use repositories::{
    DatabaseRepository, FileDatabaseRepository, FileSaveDataRepository,
    InMemoryDatabaseRepository, RepositoryError, SaveDataRepository,
};
