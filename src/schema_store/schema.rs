//! SQLite layout of the schema store database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

// =============================================================================
// Version 1 - Collections
// =============================================================================

/// One row per collection; `fields` holds the JSON field list in order.
const COLLECTIONS_TABLE_V1: Table = Table {
    name: "_collections",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("type", &SqlType::Text, non_null = true),
        sqlite_column!("fields", &SqlType::Text, non_null = true),
        sqlite_column!(
            "revision",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!("updated", &SqlType::Text, non_null = true), // RFC 3339
    ],
    indices: &[],
    unique_constraints: &[&["name"]],
};

// =============================================================================
// Version 2 - Applied migrations ledger
// =============================================================================

const MIGRATIONS_TABLE_V2: Table = Table {
    name: "_migrations",
    columns: &[
        sqlite_column!("file", &SqlType::Text, is_primary_key = true),
        sqlite_column!("applied", &SqlType::Integer, non_null = true), // unix micros
    ],
    indices: &[("idx_migrations_applied", "applied")],
    unique_constraints: &[],
};

fn migrate_v1_to_v2(conn: &rusqlite::Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE _migrations (
            file TEXT PRIMARY KEY,
            applied INTEGER NOT NULL
        );
        CREATE INDEX idx_migrations_applied ON _migrations(applied);",
    )?;
    Ok(())
}

/// Version 1: collections
/// Version 2: applied migrations ledger
pub const SCHEMA_STORE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 1,
        tables: &[COLLECTIONS_TABLE_V1],
        migration: None,
    },
    VersionedSchema {
        version: 2,
        tables: &[COLLECTIONS_TABLE_V1, MIGRATIONS_TABLE_V2],
        migration: Some(migrate_v1_to_v2),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_every_version_creates_and_validates() {
        for schema in SCHEMA_STORE_VERSIONED_SCHEMAS {
            let conn = Connection::open_in_memory().unwrap();
            schema.create(&conn).unwrap();
            schema.validate(&conn).unwrap();
        }
    }

    #[test]
    fn test_v1_to_v2_migration_matches_v2_layout() {
        let conn = Connection::open_in_memory().unwrap();
        SCHEMA_STORE_VERSIONED_SCHEMAS[0].create(&conn).unwrap();
        migrate_v1_to_v2(&conn).unwrap();
        SCHEMA_STORE_VERSIONED_SCHEMAS[1].validate(&conn).unwrap();
    }
}
