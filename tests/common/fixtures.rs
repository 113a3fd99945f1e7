//! Collection fixtures and helper migrations

use super::constants::*;
use schema_migrator::{
    CollectionSchema, FieldDescriptor, FieldType, MemorySchemaStore, Migration, SchemaChange,
    SchemaStore, SqliteSchemaStore, Transform,
};
use schema_migrator::schema::CollectionType;
use std::path::PathBuf;
use tempfile::TempDir;

/// The posts collection as it looks before `1768235264_updated_posts`.
pub fn posts_collection() -> CollectionSchema {
    CollectionSchema::new(POSTS_ID, POSTS_NAME).with_fields(vec![
        FieldDescriptor::new("text3208210256", "id", FieldType::Text)
            .with_option("primaryKey", true.into())
            .with_option("pattern", "^[a-z0-9]+$".into()),
        FieldDescriptor::new(TITLE_FIELD_ID, "title", FieldType::Text),
        FieldDescriptor::new("editor1843675174", "content", FieldType::Editor),
        FieldDescriptor::new("bool1748787223", "published", FieldType::Bool),
        FieldDescriptor::new("file3277268710", "cover", FieldType::File),
        FieldDescriptor::relation(AUTHOR_FIELD_ID, "created_by", USERS_ID),
        FieldDescriptor::new("autodate2990389176", "created", FieldType::Autodate)
            .with_option("onCreate", true.into())
            .with_option("onUpdate", false.into()),
    ])
}

pub fn users_collection() -> CollectionSchema {
    let mut users = CollectionSchema::new(USERS_ID, USERS_NAME).with_fields(vec![
        FieldDescriptor::new("text3208210256", "id", FieldType::Text),
        FieldDescriptor::new("email3885137012", "email", FieldType::Email),
    ]);
    users.kind = CollectionType::Auth;
    users
}

pub fn memory_store_with_posts() -> MemorySchemaStore {
    MemorySchemaStore::with_collections(vec![posts_collection(), users_collection()])
}

/// A file-backed store seeded with the posts and users collections. The
/// returned `TempDir` must outlive the store.
pub fn sqlite_store_with_posts() -> (TempDir, PathBuf, SqliteSchemaStore) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("schema.db");
    let store = SqliteSchemaStore::new(&db_path).unwrap();
    store.insert(&posts_collection()).unwrap();
    store.insert(&users_collection()).unwrap();
    (dir, db_path, store)
}

pub fn pb_migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("pb_migrations")
}

/// Renames the posts field `field_id` from `from` to `to` without moving it.
pub fn rename_migration(id: &str, field_id: &str, from: &str, to: &str) -> Migration {
    let upsert = |name: &str| {
        let field = posts_collection()
            .field(field_id)
            .cloned()
            .unwrap()
            .with_name(name);
        Transform::Changes(vec![SchemaChange::UpsertField {
            position: 0,
            field,
        }])
    };
    Migration::new(id, POSTS_NAME, upsert(to), upsert(from))
}

/// Adds a text field to `collection` at `position`; down removes it.
pub fn add_field_migration(
    id: &str,
    collection: &str,
    field_id: &str,
    position: usize,
) -> Migration {
    Migration::new(
        id,
        collection,
        Transform::Changes(vec![SchemaChange::UpsertField {
            position,
            field: FieldDescriptor::new(field_id, field_id, FieldType::Text),
        }]),
        Transform::Changes(vec![SchemaChange::RemoveField {
            id: field_id.to_string(),
        }]),
    )
}
