use super::{AppliedMigration, MigrationLedger, SchemaStore, StoreError};
use crate::migration::MigrationId;
use crate::schema::CollectionSchema;
use chrono::Utc;
use std::sync::Mutex;

/// Schema store and ledger kept entirely in memory.
///
/// Enforces the same invariants as the SQLite store (revision check, schema
/// validation) and counts successful writes, which makes it the store of
/// choice for exercising migrations before touching a real database.
#[derive(Default)]
pub struct MemorySchemaStore {
    collections: Mutex<Vec<CollectionSchema>>,
    applied: Mutex<Vec<AppliedMigration>>,
    writes: Mutex<usize>,
}

impl MemorySchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `collections`, each at revision 1.
    pub fn with_collections(collections: Vec<CollectionSchema>) -> Self {
        let collections = collections
            .into_iter()
            .map(|mut c| {
                c.revision = 1;
                c
            })
            .collect();
        Self {
            collections: Mutex::new(collections),
            ..Default::default()
        }
    }

    /// Number of successful `save` and `insert` calls.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    fn validate(schema: &CollectionSchema) -> Result<(), StoreError> {
        schema.validate().map_err(|reason| StoreError::Validation {
            collection: schema.name.clone(),
            reason,
        })
    }
}

impl SchemaStore for MemorySchemaStore {
    fn find(&self, name_or_id: &str) -> Result<Option<CollectionSchema>, StoreError> {
        let collections = self.collections.lock().unwrap();
        let found = collections
            .iter()
            .find(|c| c.id == name_or_id)
            .or_else(|| collections.iter().find(|c| c.matches(name_or_id)));
        Ok(found.cloned())
    }

    fn save(&self, schema: &CollectionSchema) -> Result<CollectionSchema, StoreError> {
        Self::validate(schema)?;
        let mut collections = self.collections.lock().unwrap();

        if collections
            .iter()
            .any(|c| c.id != schema.id && c.name.eq_ignore_ascii_case(&schema.name))
        {
            return Err(StoreError::Validation {
                collection: schema.name.clone(),
                reason: format!("collection name {} is already in use", schema.name),
            });
        }

        let stored = collections
            .iter_mut()
            .find(|c| c.id == schema.id)
            .ok_or_else(|| StoreError::NotFound(schema.id.clone()))?;
        if stored.revision != schema.revision {
            return Err(StoreError::Conflict {
                collection: schema.name.clone(),
                expected: schema.revision,
                found: stored.revision,
            });
        }

        let mut updated = schema.clone();
        updated.revision = stored.revision + 1;
        *stored = updated.clone();
        *self.writes.lock().unwrap() += 1;
        Ok(updated)
    }

    fn insert(&self, schema: &CollectionSchema) -> Result<CollectionSchema, StoreError> {
        Self::validate(schema)?;
        let mut collections = self.collections.lock().unwrap();
        if let Some(taken) = collections
            .iter()
            .find(|c| c.id == schema.id || c.name.eq_ignore_ascii_case(&schema.name))
        {
            return Err(StoreError::Validation {
                collection: schema.name.clone(),
                reason: format!("collection {} ({}) already exists", taken.name, taken.id),
            });
        }

        let mut inserted = schema.clone();
        inserted.revision = 1;
        collections.push(inserted.clone());
        *self.writes.lock().unwrap() += 1;
        Ok(inserted)
    }

    fn list(&self) -> Result<Vec<CollectionSchema>, StoreError> {
        let mut collections = self.collections.lock().unwrap().clone();
        collections.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(collections)
    }
}

impl MigrationLedger for MemorySchemaStore {
    fn applied(&self) -> Result<Vec<AppliedMigration>, StoreError> {
        let mut applied = self.applied.lock().unwrap().clone();
        applied.sort_by(|a, b| a.applied_at.cmp(&b.applied_at).then_with(|| a.id.cmp(&b.id)));
        Ok(applied)
    }

    fn record_applied(&self, id: &MigrationId) -> Result<(), StoreError> {
        let mut applied = self.applied.lock().unwrap();
        applied.retain(|m| &m.id != id);
        applied.push(AppliedMigration {
            id: id.clone(),
            applied_at: Utc::now(),
        });
        Ok(())
    }

    fn record_reverted(&self, id: &MigrationId) -> Result<(), StoreError> {
        self.applied.lock().unwrap().retain(|m| &m.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDescriptor, FieldType};

    fn posts() -> CollectionSchema {
        CollectionSchema::new("pbc_1125843985", "posts").with_fields(vec![FieldDescriptor::new(
            "text724990059",
            "title",
            FieldType::Text,
        )])
    }

    #[test]
    fn test_find_by_id_and_name() {
        let store = MemorySchemaStore::with_collections(vec![posts()]);
        assert!(store.find("pbc_1125843985").unwrap().is_some());
        assert!(store.find("POSTS").unwrap().is_some());
        assert!(store.find("comments").unwrap().is_none());
    }

    #[test]
    fn test_id_match_wins_over_name_match() {
        let store = MemorySchemaStore::with_collections(vec![
            CollectionSchema::new("c_a", "shadow"),
            CollectionSchema::new("shadow", "real"),
        ]);
        let found = store.find("shadow").unwrap().unwrap();
        assert_eq!(found.name, "real");
    }

    #[test]
    fn test_save_bumps_revision() {
        let store = MemorySchemaStore::with_collections(vec![posts()]);
        let mut handle = store.find("posts").unwrap().unwrap();
        assert_eq!(handle.revision, 1);

        handle.fields[0].name = "headline".to_string();
        let saved = store.save(&handle).unwrap();

        assert_eq!(saved.revision, 2);
        assert_eq!(store.write_count(), 1);
        let reloaded = store.find("posts").unwrap().unwrap();
        assert_eq!(reloaded.fields[0].name, "headline");
    }

    #[test]
    fn test_stale_handle_conflicts() {
        let store = MemorySchemaStore::with_collections(vec![posts()]);
        let first = store.find("posts").unwrap().unwrap();
        let second = store.find("posts").unwrap().unwrap();

        store.save(&first).unwrap();
        let err = store.save(&second).unwrap_err();

        assert!(matches!(
            err,
            StoreError::Conflict {
                expected: 1,
                found: 2,
                ..
            }
        ));
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_save_rejects_duplicate_field_id() {
        let store = MemorySchemaStore::with_collections(vec![posts()]);
        let mut handle = store.find("posts").unwrap().unwrap();
        handle
            .fields
            .push(FieldDescriptor::new("text724990059", "subtitle", FieldType::Text));

        let err = store.save(&handle).unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_save_rejects_reserved_option_key() {
        let store = MemorySchemaStore::with_collections(vec![posts()]);
        let mut handle = store.find("posts").unwrap().unwrap();
        handle.fields[0]
            .options
            .insert("name".to_string(), serde_json::json!("shadow"));

        let err = store.save(&handle).unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_insert_rejects_taken_name() {
        let store = MemorySchemaStore::with_collections(vec![posts()]);
        let err = store
            .insert(&CollectionSchema::new("pbc_other", "Posts"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));
    }

    #[test]
    fn test_ledger_records_and_reverts() {
        let store = MemorySchemaStore::new();
        let a = MigrationId::new("1700000000_a");
        let b = MigrationId::new("1700000001_b");

        store.record_applied(&a).unwrap();
        store.record_applied(&b).unwrap();
        let ids: Vec<_> = store.applied().unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![a.clone(), b.clone()]);

        store.record_reverted(&b).unwrap();
        let ids: Vec<_> = store.applied().unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![a]);
    }
}
