use super::loader::{discover_migration_files, read_migration_file};
use super::{LoadError, Migration, MigrationError, MigrationId};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Migrations of one project, kept in id order.
#[derive(Debug, Default)]
pub struct MigrationRegistry {
    migrations: BTreeMap<MigrationId, Migration>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a migration. A migration whose id is already registered is
    /// refused and the registered one is kept.
    pub fn register(&mut self, migration: Migration) -> Result<(), MigrationError> {
        if self.migrations.contains_key(&migration.id) {
            return Err(MigrationError::DuplicateMigration(migration.id));
        }
        debug!("Registered migration {}", migration.id);
        self.migrations.insert(migration.id.clone(), migration);
        Ok(())
    }

    /// Migrations in ascending id order.
    pub fn list(&self) -> impl DoubleEndedIterator<Item = &Migration> + '_ {
        self.migrations.values()
    }

    pub fn ids(&self) -> impl DoubleEndedIterator<Item = &MigrationId> + '_ {
        self.migrations.keys()
    }

    pub fn get(&self, id: &MigrationId) -> Option<&Migration> {
        self.migrations.get(id)
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Registers every `*.json` migration file in `dir`, returning how many
    /// were added.
    pub fn register_dir<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize, LoadError> {
        let files = discover_migration_files(dir.as_ref())?;
        for path in &files {
            self.register(read_migration_file(path)?)?;
        }
        Ok(files.len())
    }

    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, LoadError> {
        let mut registry = Self::new();
        registry.register_dir(dir)?;
        Ok(registry)
    }
}
