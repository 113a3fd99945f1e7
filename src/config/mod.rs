mod file_config;

pub use file_config::FileConfig;

use crate::schema::{MutatorOptions, PositionPolicy};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that take part in config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub data_dir: Option<PathBuf>,
    pub migrations_dir: Option<PathBuf>,
    pub position_policy: PositionPolicy,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Directory of declarative migration files. The built-in migrations
    /// are used when unset.
    pub migrations_dir: Option<PathBuf>,
    pub position_policy: PositionPolicy,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .or_else(|| cli.data_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("data_dir must be specified via --data-dir or in config file")
            })?;

        if !data_dir.exists() {
            bail!("Data directory does not exist: {:?}", data_dir);
        }
        if !data_dir.is_dir() {
            bail!("data_dir is not a directory: {:?}", data_dir);
        }

        let migrations_dir = file
            .migrations_dir
            .map(PathBuf::from)
            .or_else(|| cli.migrations_dir.clone());
        if let Some(dir) = &migrations_dir {
            if !dir.is_dir() {
                bail!("Migrations directory does not exist: {:?}", dir);
            }
        }

        let position_policy = match file.position_policy {
            Some(s) => match parse_position_policy(&s) {
                Some(policy) => policy,
                None => bail!("Invalid position_policy in config file: {}", s),
            },
            None => cli.position_policy,
        };

        Ok(Self {
            data_dir,
            migrations_dir,
            position_policy,
        })
    }

    pub fn schema_db_path(&self) -> PathBuf {
        self.data_dir.join("schema.db")
    }

    pub fn mutator_options(&self) -> MutatorOptions {
        MutatorOptions {
            position_policy: self.position_policy,
        }
    }
}

/// Parses a position policy string, ignoring case.
fn parse_position_policy(s: &str) -> Option<PositionPolicy> {
    PositionPolicy::from_str(s, true).ok()
}
