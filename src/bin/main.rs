//! schemasync CLI - Reconcile the schema catalog against live instances
//!
//! Usage:
//!   schemasync sync <instance> [--snapshot <file.json>]
//!   schemasync sync --all
//!   schemasync ping <instance>
//!   schemasync ping --from-env
//!   schemasync databases <instance>
//!   schemasync tables <instance> <database>
//!
//! Configuration is read from --config, $SCHEMASYNC_CONFIG, ./schemasync.toml
//! or ~/.config/schemasync/config.toml.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures::future::join_all;
use schemasync::catalog::{Catalog, DatabaseFind, SqliteCatalog, TableFind};
use schemasync::config::{ConnectionConfig, Settings};
use schemasync::introspect::{SchemaIntrospector, StaticIntrospector, WorkerSchemaIntrospector};
use schemasync::sync::{self, Instance, InstanceLocks, Reconciler, SyncError, SyncSummary};
use schemasync::worker::WorkerClient;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "schemasync")]
#[command(about = "Reconcile a schema catalog against live database instances")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize the catalog with one or all configured instances
    Sync {
        /// Configured instance name
        #[arg(required_unless_present = "all")]
        instance: Option<String>,

        /// Synchronize every configured instance
        #[arg(long, conflicts_with_all = ["instance", "snapshot"])]
        all: bool,

        /// Read the live schema from a JSON snapshot instead of the instance
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Check that an instance accepts a connection
    Ping {
        /// Configured instance name
        #[arg(required_unless_present = "from_env")]
        instance: Option<String>,

        /// Read the connection from SCHEMASYNC_DB_* environment variables
        #[arg(long, conflicts_with = "instance")]
        from_env: bool,
    },

    /// List cataloged databases of an instance
    Databases {
        /// Configured instance name
        instance: String,
    },

    /// List cataloged tables of one database
    Tables {
        /// Configured instance name
        instance: String,

        /// Database name
        database: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` when set, else `info` (`debug` with `--verbose`).
fn log_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }))
}

async fn run(cli: Cli) -> CliResult<ExitCode> {
    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };

    match cli.command {
        Commands::Sync {
            instance,
            all,
            snapshot,
        } => cmd_sync(&settings, instance, all, snapshot).await,
        Commands::Ping { instance, .. } => cmd_ping(&settings, instance.as_deref()).await,
        Commands::Databases { instance } => cmd_databases(&settings, &instance),
        Commands::Tables { instance, database } => cmd_tables(&settings, &instance, &database),
    }
}

fn open_catalog(settings: &Settings) -> CliResult<SqliteCatalog> {
    let path = settings.catalog_path()?;
    debug!(path = %path.display(), "opening catalog");
    Ok(SqliteCatalog::open(&path)?)
}

async fn cmd_sync(
    settings: &Settings,
    instance: Option<String>,
    all: bool,
    snapshot: Option<PathBuf>,
) -> CliResult<ExitCode> {
    let instances = match instance {
        Some(name) if !all => vec![settings.instance(&name)?],
        _ => settings.all_instances()?,
    };
    if instances.is_empty() {
        println!("No instances configured.");
        return Ok(ExitCode::SUCCESS);
    }

    let reconciler = Reconciler::with_options(open_catalog(settings)?, settings.sync.to_options());

    let introspectors: Vec<Box<dyn SchemaIntrospector>> = match snapshot {
        Some(path) => vec![Box::new(StaticIntrospector::from_json_file(&path)?)],
        None => {
            let client = Arc::new(WorkerClient::spawn_with_settings(settings).await?);
            instances
                .iter()
                .map(|instance| {
                    Box::new(WorkerSchemaIntrospector::new(
                        client.clone(),
                        &instance.connection,
                    )) as Box<dyn SchemaIntrospector>
                })
                .collect()
        }
    };

    let locks = InstanceLocks::new();
    let runs = instances
        .iter()
        .zip(introspectors.iter())
        .map(|(instance, introspector)| {
            sync_one(&reconciler, &locks, instance, introspector.as_ref())
        });
    let results = join_all(runs).await;

    let mut failed = false;
    for (instance, result) in instances.iter().zip(results) {
        match result {
            Ok(summary) => println!("{}: OK ({})", instance.name, summary),
            Err(e) => {
                failed = true;
                eprintln!("{}: {}", instance.name, e);
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn sync_one(
    reconciler: &Reconciler<SqliteCatalog>,
    locks: &InstanceLocks,
    instance: &Instance,
    introspector: &dyn SchemaIntrospector,
) -> Result<SyncSummary, SyncError> {
    let _guard = locks.acquire(instance.id).await;
    reconciler.try_synchronize(instance, introspector).await
}

async fn cmd_ping(settings: &Settings, name: Option<&str>) -> CliResult<ExitCode> {
    let (label, connection) = match name {
        Some(name) => {
            let instance = settings.instance(name)?;
            (instance.name, instance.connection)
        }
        None => {
            let connection = ConnectionConfig::from_env()?;
            (connection.host_port(), connection)
        }
    };
    let client = Arc::new(WorkerClient::spawn_with_settings(settings).await?);
    let introspector = WorkerSchemaIntrospector::new(client, &connection);

    let result = sync::ping(&connection, &introspector).await;
    match result.error() {
        None => {
            println!("{}: OK", label);
            Ok(ExitCode::SUCCESS)
        }
        Some(message) => {
            eprintln!("{}: {}", label, message);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn cmd_databases(settings: &Settings, name: &str) -> CliResult<ExitCode> {
    let instance = settings.instance(name)?;
    let catalog = open_catalog(settings)?;

    let databases = catalog.find_databases(&DatabaseFind::by_instance(instance.id))?;
    if databases.is_empty() {
        println!("No databases cataloged for {}.", instance.name);
        return Ok(ExitCode::SUCCESS);
    }

    println!("Instance: {} (id {})", instance.name, instance.id);
    println!();
    for db in &databases {
        println!(
            "  - {} [{}] last sync {} (project {})",
            db.name, db.sync_status, db.last_successful_sync_ts, db.project_id
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_tables(settings: &Settings, name: &str, database: &str) -> CliResult<ExitCode> {
    let instance = settings.instance(name)?;
    let catalog = open_catalog(settings)?;

    let found = catalog.find_databases(&DatabaseFind {
        instance_id: Some(instance.id),
        name: Some(database.to_string()),
        ..DatabaseFind::default()
    })?;
    let Some(db) = found.first() else {
        eprintln!("Database not found: {}", database);
        return Ok(ExitCode::FAILURE);
    };

    let tables = catalog.find_tables(&TableFind::by_database(db.id))?;
    println!("Database: {} [{}]", db.name, db.sync_status);
    println!();
    if tables.is_empty() {
        println!("No tables cataloged.");
    }
    for table in &tables {
        println!(
            "  - {} ({}, {} rows) [{}] last sync {}",
            table.name, table.table_type, table.row_count, table.sync_status, table.last_successful_sync_ts
        );
    }
    Ok(ExitCode::SUCCESS)
}
