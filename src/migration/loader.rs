//! Declarative migration files.
//!
//! A migration file is a JSON object named `<unix-timestamp>_<name>.json`;
//! the file stem becomes the migration id:
//!
//! ```json
//! {
//!   "collection": "pbc_1125843985",
//!   "up":   [{ "op": "upsert_field", "position": 5, "field": { ... } }],
//!   "down": [{ "op": "upsert_field", "position": 5, "field": { ... } }]
//! }
//! ```

use super::{LoadError, Migration, MigrationId, SchemaChange, Transform};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationFile {
    pub collection: String,
    #[serde(default)]
    pub up: Vec<SchemaChange>,
    #[serde(default)]
    pub down: Vec<SchemaChange>,
}

impl MigrationFile {
    pub fn into_migration(self, id: MigrationId) -> Migration {
        Migration::new(
            id,
            self.collection,
            Transform::Changes(self.up),
            Transform::Changes(self.down),
        )
    }
}

/// `*.json` files directly inside `dir`, sorted by path.
pub fn discover_migration_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn read_migration_file(path: &Path) -> Result<Migration, LoadError> {
    let id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| LoadError::InvalidFileName(path.to_path_buf()))?;

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: MigrationFile =
        serde_json::from_str(&content).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(file.into_migration(MigrationId::new(id)))
}
