//! Positional field mutations on a collection schema.

use super::collection::CollectionSchema;
use super::field::FieldDescriptor;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What `upsert_at` does with an insert position past the end of the
/// field list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PositionPolicy {
    /// Append at the end.
    #[default]
    Clamp,
    /// Fail with `MutatorError::PositionOutOfRange`.
    Reject,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MutatorOptions {
    pub position_policy: PositionPolicy,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MutatorError {
    #[error("Field position {position} is out of range (collection has {len} fields)")]
    PositionOutOfRange { position: usize, len: usize },
}

/// Inserts or replaces `descriptor` in `schema`, returning the position the
/// field ends up at.
///
/// A field already carrying `descriptor.id` is replaced in place and keeps
/// its position, whatever `position` says. Otherwise the descriptor is
/// inserted at `position`, shifting later fields by one.
pub fn upsert_at(
    schema: &mut CollectionSchema,
    position: usize,
    descriptor: FieldDescriptor,
    options: &MutatorOptions,
) -> Result<usize, MutatorError> {
    if let Some(existing) = schema.position_of(&descriptor.id) {
        schema.fields[existing] = descriptor;
        return Ok(existing);
    }

    let len = schema.fields.len();
    let position = if position <= len {
        position
    } else {
        match options.position_policy {
            PositionPolicy::Clamp => len,
            PositionPolicy::Reject => {
                return Err(MutatorError::PositionOutOfRange { position, len })
            }
        }
    };
    schema.fields.insert(position, descriptor);
    Ok(position)
}

/// Removes the field with the given id. Removing an absent field is a no-op.
pub fn remove_field(schema: &mut CollectionSchema, field_id: &str) -> Option<FieldDescriptor> {
    schema
        .position_of(field_id)
        .map(|position| schema.fields.remove(position))
}
