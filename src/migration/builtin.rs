//! Migrations shipped with the binary.

use super::{Migration, MigrationError, MigrationRegistry, SchemaChange, Transform};
use crate::schema::FieldDescriptor;

pub const UPDATED_POSTS_ID: &str = "1768235264_updated_posts";
pub const POSTS_COLLECTION_ID: &str = "pbc_1125843985";
pub const USERS_COLLECTION_ID: &str = "_pb_users_auth_";
pub const AUTHOR_FIELD_ID: &str = "relation3725765462";

fn author_relation(name: &str) -> FieldDescriptor {
    FieldDescriptor::relation(AUTHOR_FIELD_ID, name, USERS_COLLECTION_ID)
}

/// Renames the posts author relation from `created_by` to `author`.
pub fn updated_posts() -> Migration {
    let upsert = |name: &str| {
        Transform::Changes(vec![SchemaChange::UpsertField {
            position: 5,
            field: author_relation(name),
        }])
    };
    Migration::new(
        UPDATED_POSTS_ID,
        POSTS_COLLECTION_ID,
        upsert("author"),
        upsert("created_by"),
    )
}

pub fn registry() -> Result<MigrationRegistry, MigrationError> {
    let mut registry = MigrationRegistry::new();
    registry.register(updated_posts())?;
    Ok(registry)
}
