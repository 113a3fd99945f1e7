//! Collection schema storage and the applied-migrations ledger.
//!
//! The migration engine only talks to storage through the `SchemaStore` and
//! `MigrationLedger` traits. Two backends are provided: an in-memory one for
//! tests and dry runs, and a SQLite one for real environments.

mod memory_store;
mod schema;
mod sqlite_schema_store;

pub use memory_store::MemorySchemaStore;
pub use schema::SCHEMA_STORE_VERSIONED_SCHEMAS;
pub use sqlite_schema_store::SqliteSchemaStore;

use crate::migration::MigrationId;
use crate::schema::CollectionSchema;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Collection not found: {0}")]
    NotFound(String),

    #[error(
        "Collection {collection} was modified concurrently (expected revision {expected}, found {found})"
    )]
    Conflict {
        collection: String,
        expected: u64,
        found: u64,
    },

    #[error("Collection {collection} failed validation: {reason}")]
    Validation { collection: String, reason: String },

    #[error("Ledger entry {id} has an invalid applied time: {applied}")]
    CorruptLedger { id: String, applied: i64 },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Access to the collection schemas of one environment.
///
/// Callers must not run two migration processes against the same store at
/// once; `save` only detects the overlap through the revision check.
pub trait SchemaStore: Send + Sync {
    /// Resolve a collection by id, or by name ignoring case.
    fn find(&self, name_or_id: &str) -> Result<Option<CollectionSchema>, StoreError>;

    /// Persist a collection previously returned by `find`.
    ///
    /// Fails with `Conflict` if the stored revision moved since the handle was
    /// read and with `Validation` if the schema breaks a store invariant.
    /// On success returns the stored schema carrying its new revision.
    fn save(&self, schema: &CollectionSchema) -> Result<CollectionSchema, StoreError>;

    /// Create a new collection. Its id and name must not be taken.
    fn insert(&self, schema: &CollectionSchema) -> Result<CollectionSchema, StoreError>;

    /// All collections, ordered by name.
    fn list(&self) -> Result<Vec<CollectionSchema>, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub id: MigrationId,
    pub applied_at: DateTime<Utc>,
}

/// Per-environment record of which migrations have been applied.
pub trait MigrationLedger: Send + Sync {
    /// Applied migrations, oldest first.
    fn applied(&self) -> Result<Vec<AppliedMigration>, StoreError>;

    fn record_applied(&self, id: &MigrationId) -> Result<(), StoreError>;

    fn record_reverted(&self, id: &MigrationId) -> Result<(), StoreError>;
}
