use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use schema_migrator::config::{AppConfig, CliConfig, FileConfig};
use schema_migrator::migration::builtin;
use schema_migrator::{
    ApplyEngine, CollectionSchema, MigrationRegistry, PositionPolicy, SchemaStore,
    SqliteSchemaStore,
};
use std::path::{Path, PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path = PathBuf::from(s);
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(path))
}

#[derive(Parser, Debug)]
#[command(version, about = "Applies and reverts collection schema migrations")]
struct CliArgs {
    /// Path to a TOML config file. Its values override the CLI flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding the schema database.
    #[clap(long, value_parser = parse_path)]
    pub data_dir: Option<PathBuf>,

    /// Directory of `<timestamp>_<name>.json` migration files.
    /// The built-in migrations are used when omitted.
    #[clap(long, value_parser = parse_path)]
    pub migrations_dir: Option<PathBuf>,

    /// What to do with a field position past the end of the field list.
    #[clap(long, value_enum, default_value = "clamp")]
    pub position_policy: PositionPolicy,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Applies every pending migration.
    Up,

    /// Reverts the most recently applied migrations.
    Down {
        #[clap(default_value_t = 1)]
        count: usize,
    },

    /// Lists migrations and whether they are applied.
    Status,

    /// Prints a collection schema as JSON.
    Show { collection: String },

    /// Creates the collections listed in a JSON array file.
    Import {
        #[clap(value_parser = parse_path)]
        file: PathBuf,
    },

    /// Prints every collection schema as a JSON array.
    Export,
}

fn load_registry(config: &AppConfig) -> Result<MigrationRegistry> {
    match &config.migrations_dir {
        Some(dir) => {
            let registry = MigrationRegistry::load_dir(dir)
                .with_context(|| format!("Failed to load migrations from {:?}", dir))?;
            info!("Loaded {} migrations from {:?}", registry.len(), dir);
            Ok(registry)
        }
        None => Ok(builtin::registry()?),
    }
}

fn import_collections(store: &SqliteSchemaStore, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read collections file: {:?}", file))?;
    let collections: Vec<CollectionSchema> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse collections file: {:?}", file))?;
    store
        .insert_all(&collections)
        .with_context(|| format!("Failed to import collections from {:?}", file))?;
    println!("Imported {} collections", collections.len());
    Ok(())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli_config = CliConfig {
        data_dir: cli_args.data_dir.clone(),
        migrations_dir: cli_args.migrations_dir.clone(),
        position_policy: cli_args.position_policy,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening schema database at {:?}...", config.schema_db_path());
    let store = SqliteSchemaStore::new(config.schema_db_path())?;
    let engine = ApplyEngine::new(config.mutator_options());

    match cli_args.command {
        Command::Up => {
            let registry = load_registry(&config)?;
            let report = engine.migrate_up(&registry, &store, &store)?;
            for id in &report.applied {
                println!("Applied {}", id);
            }
            println!("{} migration(s) applied", report.applied.len());
        }
        Command::Down { count } => {
            let registry = load_registry(&config)?;
            let report = engine.migrate_down(&registry, &store, &store, count)?;
            for id in &report.applied {
                println!("Reverted {}", id);
            }
            println!("{} migration(s) reverted", report.applied.len());
        }
        Command::Status => {
            let registry = load_registry(&config)?;
            for status in ApplyEngine::status(&registry, &store)? {
                let state = match status.applied_at {
                    Some(at) => format!("applied {}", at.to_rfc3339()),
                    None => "pending".to_string(),
                };
                println!("{:<40} {:<20} {}", status.id, status.collection, state);
            }
        }
        Command::Show { collection } => match store.find(&collection)? {
            Some(schema) => println!("{}", serde_json::to_string_pretty(&schema)?),
            None => bail!("Collection not found: {}", collection),
        },
        Command::Import { file } => import_collections(&store, &file)?,
        Command::Export => {
            println!("{}", serde_json::to_string_pretty(&store.list()?)?);
        }
    }
    Ok(())
}
