//! Schema Migrator Library
//!
//! Reversible migrations for collection schemas: field descriptors, the
//! field mutator, the migration registry and apply engine, and the stores
//! they run against.

pub mod config;
pub mod migration;
pub mod schema;
pub mod schema_store;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use migration::{
    ApplyEngine, Direction, Migration, MigrationError, MigrationId, MigrationRegistry, RunError,
    SchemaChange, Transform,
};
pub use schema::{CollectionSchema, FieldDescriptor, FieldType, MutatorOptions, PositionPolicy};
pub use schema_store::{
    MemorySchemaStore, MigrationLedger, SchemaStore, SqliteSchemaStore, StoreError,
};
