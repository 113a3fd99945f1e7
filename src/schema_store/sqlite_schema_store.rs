use super::schema::SCHEMA_STORE_VERSIONED_SCHEMAS;
use super::{AppliedMigration, MigrationLedger, SchemaStore, StoreError};
use crate::migration::MigrationId;
use crate::schema::{CollectionSchema, CollectionType};
use crate::sqlite_persistence;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub struct SqliteSchemaStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSchemaStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let mut conn = Connection::open(path).context("Failed to open schema database")?;
        if is_new_db {
            info!("Creating new schema database at {:?}", path);
        }
        sqlite_persistence::initialize(
            &mut conn,
            SCHEMA_STORE_VERSIONED_SCHEMAS,
            is_new_db,
            "schema",
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database at the latest layout, mostly for tests.
    pub fn in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        sqlite_persistence::initialize(&mut conn, SCHEMA_STORE_VERSIONED_SCHEMAS, true, "schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_collection(row: &rusqlite::Row) -> rusqlite::Result<(CollectionSchema, String)> {
        let type_str: String = row.get("type")?;
        let revision: i64 = row.get("revision")?;
        let schema = CollectionSchema {
            id: row.get("id")?,
            name: row.get("name")?,
            kind: CollectionType::parse(&type_str).unwrap_or_default(),
            fields: Vec::new(),
            revision: revision as u64,
        };
        Ok((schema, row.get("fields")?))
    }

    fn decode((mut schema, fields_json): (CollectionSchema, String)) -> Result<CollectionSchema, StoreError> {
        schema.fields = serde_json::from_str(&fields_json)?;
        Ok(schema)
    }

    fn validate(schema: &CollectionSchema) -> Result<(), StoreError> {
        schema.validate().map_err(|reason| StoreError::Validation {
            collection: schema.name.clone(),
            reason,
        })
    }

    fn name_taken(
        conn: &Connection,
        name: &str,
        except_id: Option<&str>,
    ) -> Result<bool, StoreError> {
        let taken = conn
            .query_row(
                "SELECT id FROM _collections WHERE LOWER(name) = LOWER(?1)",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(match (taken, except_id) {
            (Some(id), Some(except)) => id != except,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }

    fn now_micros() -> i64 {
        Utc::now().timestamp_micros()
    }

    fn insert_in(conn: &Connection, schema: &CollectionSchema) -> Result<CollectionSchema, StoreError> {
        Self::validate(schema)?;
        let fields_json = serde_json::to_string(&schema.fields)?;

        let id_taken = conn
            .query_row(
                "SELECT 1 FROM _collections WHERE id = ?1",
                params![schema.id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if id_taken || Self::name_taken(conn, &schema.name, None)? {
            return Err(StoreError::Validation {
                collection: schema.name.clone(),
                reason: format!("collection {} ({}) already exists", schema.name, schema.id),
            });
        }

        conn.execute(
            "INSERT INTO _collections (id, name, type, fields, revision, updated)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![
                schema.id,
                schema.name,
                schema.kind.as_str(),
                fields_json,
                Utc::now().to_rfc3339(),
            ],
        )?;
        info!("Created collection {} ({})", schema.name, schema.id);

        let mut inserted = schema.clone();
        inserted.revision = 1;
        Ok(inserted)
    }

    /// Creates every collection in `schemas` in one transaction. Either all
    /// of them are stored or none is.
    pub fn insert_all(&self, schemas: &[CollectionSchema]) -> Result<Vec<CollectionSchema>, StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let inserted = schemas
            .iter()
            .map(|schema| Self::insert_in(&tx, schema))
            .collect::<Result<Vec<_>, _>>()?;
        tx.commit()?;
        Ok(inserted)
    }
}

impl SchemaStore for SqliteSchemaStore {
    fn find(&self, name_or_id: &str) -> Result<Option<CollectionSchema>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT id, name, type, fields, revision FROM _collections
                 WHERE id = ?1 OR LOWER(name) = LOWER(?1)
                 ORDER BY (id = ?1) DESC
                 LIMIT 1",
                params![name_or_id],
                Self::row_to_collection,
            )
            .optional()?;
        row.map(Self::decode).transpose()
    }

    fn save(&self, schema: &CollectionSchema) -> Result<CollectionSchema, StoreError> {
        Self::validate(schema)?;
        let fields_json = serde_json::to_string(&schema.fields)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        if Self::name_taken(&tx, &schema.name, Some(&schema.id))? {
            return Err(StoreError::Validation {
                collection: schema.name.clone(),
                reason: format!("collection name {} is already in use", schema.name),
            });
        }

        let updated = tx.execute(
            "UPDATE _collections
             SET name = ?1, type = ?2, fields = ?3, revision = revision + 1, updated = ?4
             WHERE id = ?5 AND revision = ?6",
            params![
                schema.name,
                schema.kind.as_str(),
                fields_json,
                Utc::now().to_rfc3339(),
                schema.id,
                schema.revision as i64,
            ],
        )?;

        if updated == 0 {
            let found: Option<i64> = tx
                .query_row(
                    "SELECT revision FROM _collections WHERE id = ?1",
                    params![schema.id],
                    |row| row.get(0),
                )
                .optional()?;
            return Err(match found {
                Some(found) => StoreError::Conflict {
                    collection: schema.name.clone(),
                    expected: schema.revision,
                    found: found as u64,
                },
                None => StoreError::NotFound(schema.id.clone()),
            });
        }
        tx.commit()?;
        debug!(
            "Saved collection {} at revision {}",
            schema.name,
            schema.revision + 1
        );

        let mut saved = schema.clone();
        saved.revision = schema.revision + 1;
        Ok(saved)
    }

    fn insert(&self, schema: &CollectionSchema) -> Result<CollectionSchema, StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let inserted = Self::insert_in(&tx, schema)?;
        tx.commit()?;
        Ok(inserted)
    }

    fn list(&self) -> Result<Vec<CollectionSchema>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, type, fields, revision FROM _collections ORDER BY name ASC",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_collection)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(Self::decode).collect()
    }
}

impl MigrationLedger for SqliteSchemaStore {
    fn applied(&self) -> Result<Vec<AppliedMigration>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT file, applied FROM _migrations ORDER BY applied ASC, file ASC")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        let mut applied = rows
            .into_iter()
            .map(|(file, micros)| match DateTime::from_timestamp_micros(micros) {
                Some(applied_at) => Ok(AppliedMigration {
                    id: MigrationId::new(file),
                    applied_at,
                }),
                None => Err(StoreError::CorruptLedger {
                    id: file,
                    applied: micros,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        // Same ordering as the in-memory ledger for ties on `applied`
        applied.sort_by(|a, b| a.applied_at.cmp(&b.applied_at).then_with(|| a.id.cmp(&b.id)));
        Ok(applied)
    }

    fn record_applied(&self, id: &MigrationId) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO _migrations (file, applied) VALUES (?1, ?2)",
            params![id.as_str(), Self::now_micros()],
        )?;
        Ok(())
    }

    fn record_reverted(&self, id: &MigrationId) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM _migrations WHERE file = ?1",
            params![id.as_str()],
        )?;
        Ok(())
    }
}
