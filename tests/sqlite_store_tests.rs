//! End-to-end migration runs against the SQLite-backed store.

mod common;

use common::*;
use schema_migrator::migration::builtin;
use schema_migrator::{
    ApplyEngine, Direction, MigrationId, MigrationLedger, MigrationRegistry, MutatorOptions,
    SchemaStore, SqliteSchemaStore, StoreError,
};

#[test]
fn test_migrate_up_and_down_with_shipped_migrations() {
    let (_dir, _db_path, store) = sqlite_store_with_posts();
    let registry = MigrationRegistry::load_dir(pb_migrations_dir()).unwrap();
    let engine = ApplyEngine::new(MutatorOptions::default());

    let report = engine.migrate_up(&registry, &store, &store).unwrap();
    assert_eq!(report.applied, vec![MigrationId::new(UPDATED_POSTS_ID)]);

    let posts = store.find(POSTS_ID).unwrap().unwrap();
    assert_eq!(posts.field(AUTHOR_FIELD_ID).unwrap().name, "author");
    assert_eq!(posts.position_of(AUTHOR_FIELD_ID), Some(AUTHOR_POSITION));
    assert_eq!(posts.revision, 2);

    let report = engine.migrate_down(&registry, &store, &store, 1).unwrap();
    assert_eq!(report.direction, Direction::Down);

    let posts = store.find(POSTS_NAME).unwrap().unwrap();
    assert!(posts.same_structure(&posts_collection()));
    assert!(store.applied().unwrap().is_empty());
}

#[test]
fn test_ledger_survives_reopen() {
    let (_dir, db_path, store) = sqlite_store_with_posts();
    let registry = builtin::registry().unwrap();
    let engine = ApplyEngine::default();
    engine.migrate_up(&registry, &store, &store).unwrap();
    drop(store);

    let reopened = SqliteSchemaStore::new(&db_path).unwrap();
    let statuses = ApplyEngine::status(&registry, &reopened).unwrap();
    assert_eq!(statuses.len(), 1);
    assert!(statuses[0].applied_at.is_some());

    let report = engine.migrate_up(&registry, &reopened, &reopened).unwrap();
    assert!(report.applied.is_empty());
    let posts = reopened.find(POSTS_ID).unwrap().unwrap();
    assert_eq!(posts.revision, 2);
}

#[test]
fn test_stale_save_is_rejected_as_conflict() {
    let (_dir, db_path, store) = sqlite_store_with_posts();
    let other = SqliteSchemaStore::new(&db_path).unwrap();
    let stale = store.find(POSTS_ID).unwrap().unwrap();

    ApplyEngine::default()
        .apply(&builtin::updated_posts(), Direction::Up, &other)
        .unwrap();

    let err = store.save(&stale).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Conflict {
            expected: 1,
            found: 2,
            ..
        }
    ));
    let posts = store.find(POSTS_ID).unwrap().unwrap();
    assert_eq!(posts.field(AUTHOR_FIELD_ID).unwrap().name, "author");
}

#[test]
fn test_export_lists_collections_by_name() {
    let (_dir, _db_path, store) = sqlite_store_with_posts();

    let names: Vec<_> = store
        .list()
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec![POSTS_NAME, USERS_NAME]);

    let exported = serde_json::to_value(store.list().unwrap()).unwrap();
    assert!(exported[0].get("revision").is_none());
    assert_eq!(exported[0]["fields"][AUTHOR_POSITION]["name"], "created_by");
}

#[test]
fn test_duplicate_field_name_is_not_persisted() {
    let (_dir, _db_path, store) = sqlite_store_with_posts();
    let mut posts = store.find(POSTS_ID).unwrap().unwrap();
    posts.fields[1].name = "CONTENT".to_string();

    let err = store.save(&posts).unwrap_err();

    assert!(matches!(err, StoreError::Validation { .. }));
    let stored = store.find(POSTS_ID).unwrap().unwrap();
    assert_eq!(stored.revision, 1);
}
