use super::{Direction, Migration, MigrationError, MigrationId, MigrationRegistry, RunError};
use crate::schema::{CollectionSchema, MutatorOptions};
use crate::schema_store::{MigrationLedger, SchemaStore, StoreError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{error, info};

/// Outcome of a run that went through to the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub direction: Direction,
    /// Migrations applied, in the order they were applied.
    pub applied: Vec<MigrationId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub id: MigrationId,
    pub collection: String,
    pub applied_at: Option<DateTime<Utc>>,
}

/// Applies migrations against a schema store.
///
/// The engine holds no lock: only one migration process may run against a
/// given store at a time.
#[derive(Debug, Clone, Default)]
pub struct ApplyEngine {
    options: MutatorOptions,
}

impl ApplyEngine {
    pub fn new(options: MutatorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MutatorOptions {
        &self.options
    }

    /// Runs one direction of `migration`: find the collection, transform it,
    /// save it. A successful apply performs exactly one write; a failed one
    /// leaves the store untouched.
    pub fn apply(
        &self,
        migration: &Migration,
        direction: Direction,
        store: &dyn SchemaStore,
    ) -> Result<CollectionSchema, MigrationError> {
        let mut handle = store
            .find(&migration.collection)
            .map_err(MigrationError::Store)?
            .ok_or_else(|| MigrationError::CollectionNotFound(migration.collection.clone()))?;

        migration
            .transform(direction)
            .apply(&mut handle, &self.options)?;

        store
            .save(&handle)
            .map_err(|err| MigrationError::from_save(&migration.collection, err))
    }

    /// Applies `migrations` in the given order, halting at the first failure.
    pub fn run<'a, I>(
        &self,
        migrations: I,
        direction: Direction,
        store: &dyn SchemaStore,
    ) -> Result<RunReport, RunError>
    where
        I: IntoIterator<Item = &'a Migration>,
    {
        let mut applied = Vec::new();
        for migration in migrations {
            self.apply_logged(migration, direction, store, &mut applied, |_| Ok(()))?;
        }
        Ok(RunReport { direction, applied })
    }

    /// Applies every registered migration missing from the ledger, oldest
    /// first, recording each one after its collection is saved.
    pub fn migrate_up(
        &self,
        registry: &MigrationRegistry,
        store: &dyn SchemaStore,
        ledger: &dyn MigrationLedger,
    ) -> Result<RunReport, RunError> {
        let done: Vec<MigrationId> = ledger
            .applied()
            .map_err(RunError::Ledger)?
            .into_iter()
            .map(|m| m.id)
            .collect();

        let pending: Vec<&Migration> = registry.list().filter(|m| !done.contains(&m.id)).collect();
        if pending.is_empty() {
            info!("No pending migrations");
        }

        let mut applied = Vec::new();
        for migration in pending {
            self.apply_logged(migration, Direction::Up, store, &mut applied, |id| {
                ledger.record_applied(id)
            })?;
        }
        Ok(RunReport {
            direction: Direction::Up,
            applied,
        })
    }

    /// Reverts the `count` most recently applied migrations, newest first.
    pub fn migrate_down(
        &self,
        registry: &MigrationRegistry,
        store: &dyn SchemaStore,
        ledger: &dyn MigrationLedger,
        count: usize,
    ) -> Result<RunReport, RunError> {
        let done = ledger.applied().map_err(RunError::Ledger)?;

        let mut to_revert = Vec::new();
        for entry in done.iter().rev().take(count) {
            let migration = registry
                .get(&entry.id)
                .ok_or_else(|| RunError::UnknownMigration(entry.id.clone()))?;
            to_revert.push(migration);
        }
        if to_revert.is_empty() {
            info!("No applied migrations to revert");
        }

        let mut applied = Vec::new();
        for migration in to_revert {
            self.apply_logged(migration, Direction::Down, store, &mut applied, |id| {
                ledger.record_reverted(id)
            })?;
        }
        Ok(RunReport {
            direction: Direction::Down,
            applied,
        })
    }

    /// Every registered migration with the time it was applied, if it was.
    pub fn status(
        registry: &MigrationRegistry,
        ledger: &dyn MigrationLedger,
    ) -> Result<Vec<MigrationStatus>, RunError> {
        let applied: HashMap<MigrationId, DateTime<Utc>> = ledger
            .applied()
            .map_err(RunError::Ledger)?
            .into_iter()
            .map(|m| (m.id, m.applied_at))
            .collect();

        Ok(registry
            .list()
            .map(|m| MigrationStatus {
                id: m.id.clone(),
                collection: m.collection.clone(),
                applied_at: applied.get(&m.id).copied(),
            })
            .collect())
    }

    fn apply_logged<F>(
        &self,
        migration: &Migration,
        direction: Direction,
        store: &dyn SchemaStore,
        applied: &mut Vec<MigrationId>,
        record: F,
    ) -> Result<(), RunError>
    where
        F: FnOnce(&MigrationId) -> Result<(), StoreError>,
    {
        info!(
            "Applying migration {} ({}) to collection {}",
            migration.id, direction, migration.collection
        );

        let saved = match self.apply(migration, direction, store) {
            Ok(saved) => saved,
            Err(source) => {
                error!(
                    "Migration {} ({}) failed: {}",
                    migration.id, direction, source
                );
                return Err(RunError::Failed {
                    id: migration.id.clone(),
                    direction,
                    source,
                    applied: std::mem::take(applied),
                });
            }
        };
        applied.push(migration.id.clone());

        if let Err(source) = record(&migration.id) {
            error!(
                "Migration {} ({}) saved but not recorded: {}",
                migration.id, direction, source
            );
            return Err(RunError::Unrecorded {
                id: migration.id.clone(),
                direction,
                source,
                applied: std::mem::take(applied),
            });
        }

        info!(
            "Applied migration {} ({}), collection {} now at revision {}",
            migration.id, direction, saved.name, saved.revision
        );
        Ok(())
    }
}
