use super::{Direction, MigrationId};
use crate::schema::MutatorError;
use crate::schema_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Why the store refused to persist a migrated collection.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("concurrent modification (expected revision {expected}, found {found})")]
    Conflict { expected: u64, found: u64 },

    #[error("validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Duplicate migration id: {0}")]
    DuplicateMigration(MigrationId),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Failed to persist collection {collection}: {source}")]
    Persist {
        collection: String,
        #[source]
        source: PersistError,
    },

    #[error(transparent)]
    Mutator(#[from] MutatorError),

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Schema store error: {0}")]
    Store(#[source] StoreError),
}

impl MigrationError {
    /// Maps a failed `save` to the error the caller sees.
    pub(crate) fn from_save(collection: &str, err: StoreError) -> Self {
        match err {
            StoreError::Conflict {
                expected, found, ..
            } => MigrationError::Persist {
                collection: collection.to_string(),
                source: PersistError::Conflict { expected, found },
            },
            StoreError::Validation { reason, .. } => MigrationError::Persist {
                collection: collection.to_string(),
                source: PersistError::Validation(reason),
            },
            StoreError::NotFound(_) => MigrationError::CollectionNotFound(collection.to_string()),
            other => MigrationError::Store(other),
        }
    }
}

/// A run that halted. Migrations listed in `applied` are committed to the
/// store and stay committed.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Migration {id} ({direction}) failed: {source}")]
    Failed {
        id: MigrationId,
        direction: Direction,
        #[source]
        source: MigrationError,
        applied: Vec<MigrationId>,
    },

    /// The collection was saved but the ledger could not record it. `id` is
    /// the last entry of `applied`.
    #[error("Migration {id} ({direction}) was saved but not recorded in the ledger: {source}")]
    Unrecorded {
        id: MigrationId,
        direction: Direction,
        #[source]
        source: StoreError,
        applied: Vec<MigrationId>,
    },

    #[error("Failed to read migration ledger: {0}")]
    Ledger(#[source] StoreError),

    #[error("Applied migration {0} is not registered")]
    UnknownMigration(MigrationId),
}

impl RunError {
    /// The migration that failed, if the run got as far as applying one.
    pub fn failed_migration(&self) -> Option<(&MigrationId, Direction)> {
        match self {
            RunError::Failed { id, direction, .. } | RunError::Unrecorded { id, direction, .. } => {
                Some((id, *direction))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read migrations from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid migration file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Migration file name {0:?} is not valid UTF-8")]
    InvalidFileName(PathBuf),

    #[error(transparent)]
    Registry(#[from] MigrationError),
}
