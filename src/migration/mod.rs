//! Reversible collection schema migrations.
//!
//! A [`Migration`] pairs an `up` and a `down` [`Transform`] for one
//! collection. Migrations are kept in a [`MigrationRegistry`], ordered by
//! their [`MigrationId`], and applied by the [`ApplyEngine`].

pub mod builtin;
mod engine;
mod error;
mod loader;
mod registry;

pub use engine::{ApplyEngine, MigrationStatus, RunReport};
pub use error::{LoadError, MigrationError, PersistError, RunError};
pub use loader::{discover_migration_files, read_migration_file, MigrationFile};
pub use registry::MigrationRegistry;

use crate::schema::{remove_field, upsert_at, CollectionSchema, FieldDescriptor, MutatorOptions};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Ordering key of a migration, e.g. `1768235264_updated_posts`.
///
/// Ids are ordered by their numeric timestamp prefix (the digits before the
/// first `_`), then by the whole string. Ids without a numeric prefix sort
/// after every timestamped id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MigrationId(String);

impl MigrationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn timestamp(&self) -> Option<u64> {
        self.0.split('_').next().and_then(|prefix| prefix.parse().ok())
    }
}

impl Ord for MigrationId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.timestamp(), other.timestamp()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for MigrationId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for MigrationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MigrationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    pub fn reverse(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declarative step of a transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SchemaChange {
    /// Replace the field with the same id, or insert it at `position`.
    UpsertField {
        position: usize,
        field: FieldDescriptor,
    },
    /// Drop the field with this id, if present.
    RemoveField { id: String },
}

impl SchemaChange {
    fn apply(&self, schema: &mut CollectionSchema, options: &MutatorOptions) -> Result<(), MigrationError> {
        match self {
            SchemaChange::UpsertField { position, field } => {
                upsert_at(schema, *position, field.clone(), options)?;
            }
            SchemaChange::RemoveField { id } => {
                remove_field(schema, id);
            }
        }
        Ok(())
    }
}

pub type TransformFn = fn(&mut CollectionSchema, &MutatorOptions) -> Result<(), MigrationError>;

/// A schema mutation for one direction of a migration.
#[derive(Clone)]
pub enum Transform {
    Changes(Vec<SchemaChange>),
    Code(TransformFn),
}

impl Transform {
    pub fn apply(
        &self,
        schema: &mut CollectionSchema,
        options: &MutatorOptions,
    ) -> Result<(), MigrationError> {
        match self {
            Transform::Changes(changes) => {
                for change in changes {
                    change.apply(schema, options)?;
                }
                Ok(())
            }
            Transform::Code(transform_fn) => transform_fn(schema, options),
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Changes(changes) => f.debug_tuple("Changes").field(changes).finish(),
            Transform::Code(_) => f.write_str("Code(..)"),
        }
    }
}

/// A versioned, reversible schema change on one collection.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: MigrationId,
    /// Name or id of the target collection.
    pub collection: String,
    pub up: Transform,
    pub down: Transform,
}

impl Migration {
    pub fn new(
        id: impl Into<MigrationId>,
        collection: impl Into<String>,
        up: Transform,
        down: Transform,
    ) -> Self {
        Self {
            id: id.into(),
            collection: collection.into(),
            up,
            down,
        }
    }

    pub fn transform(&self, direction: Direction) -> &Transform {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }
}
