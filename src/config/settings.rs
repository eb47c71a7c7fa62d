//! TOML-based configuration for schemasync.
//!
//! Supports a config file (schemasync.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [instances.production]
//! id = 1
//! driver = "mysql"
//! host = "db.prod.internal"
//! port = 3306
//! username = "sync"
//! password = "${PROD_DB_PASSWORD}"
//!
//! [catalog]
//! path = "/var/lib/schemasync/catalog.db"
//!
//! [sync]
//! reserved_database = "schemasync"
//! system_actor_id = 1
//! default_project_id = 1
//!
//! [worker]
//! path = "/usr/local/bin/schemasync-worker"
//! timeout_seconds = 30
//!
//! [worker.pool]
//! max_idle_conns = 5
//! max_open_conns = 10
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::connection::{ConnectionConfig, Driver};
use crate::catalog::{ActorId, InstanceId, ProjectId};
use crate::sync::{Instance, SyncOptions, DEFAULT_RESERVED_DATABASE};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),

    #[error("Failed to determine catalog directory")]
    NoCatalogDir,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Named live instances. Ordered by name so `sync --all` is deterministic.
    pub instances: BTreeMap<String, InstanceSettings>,

    /// Catalog store configuration.
    pub catalog: CatalogSettings,

    /// Reconciliation policy.
    pub sync: SyncSettings,

    /// Worker configuration.
    pub worker: WorkerSettings,
}

/// One live instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstanceSettings {
    /// Catalog identity of the instance.
    pub id: i64,

    /// Database driver (mysql, postgres).
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Server hostname (supports ${ENV_VAR} expansion).
    pub host: String,

    /// Server port. Uses the driver default when absent.
    #[serde(default)]
    pub port: Option<u16>,

    /// Login user (supports ${ENV_VAR} expansion).
    pub username: String,

    /// Login password (supports ${ENV_VAR} expansion).
    #[serde(default)]
    pub password: String,
}

fn default_driver() -> String {
    "mysql".to_string()
}

impl InstanceSettings {
    /// Get the driver type.
    pub fn driver_type(&self) -> Result<Driver, SettingsError> {
        Driver::from_str(&self.driver)
            .map_err(|_| SettingsError::UnsupportedDriver(self.driver.clone()))
    }

    /// Resolve into connection parameters, expanding environment variables.
    pub fn connection_config(&self) -> Result<ConnectionConfig, SettingsError> {
        Ok(ConnectionConfig {
            driver: self.driver_type()?,
            host: expand_env_vars(&self.host)?,
            port: self.port,
            username: expand_env_vars(&self.username)?,
            password: expand_env_vars(&self.password)?,
        })
    }
}

/// Catalog store configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Path of the SQLite catalog file. Defaults to `~/.schemasync/catalog.db`.
    pub path: Option<String>,
}

/// Reconciliation policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Internal database skipped by every run (compared case-insensitively).
    pub reserved_database: String,

    /// Actor recorded as creator/updater of every catalog mutation.
    pub system_actor_id: i64,

    /// Project newly discovered databases are assigned to.
    pub default_project_id: i64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        let options = SyncOptions::default();
        Self {
            reserved_database: DEFAULT_RESERVED_DATABASE.to_string(),
            system_actor_id: options.actor.get(),
            default_project_id: options.default_project.get(),
        }
    }
}

impl SyncSettings {
    /// Convert into reconciler options.
    pub fn to_options(&self) -> SyncOptions {
        SyncOptions {
            actor: ActorId::new(self.system_actor_id),
            default_project: ProjectId::new(self.default_project_id),
            reserved_database: self.reserved_database.clone(),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Path to worker binary.
    pub path: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,

    /// Connection pool settings.
    pub pool: PoolSettings,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            path: None,
            timeout_seconds: 30,
            pool: PoolSettings::default(),
        }
    }
}

/// Connection pool settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Maximum number of idle connections per pool.
    pub max_idle_conns: u32,

    /// Maximum number of open connections per pool.
    pub max_open_conns: u32,

    /// Maximum connection lifetime (e.g., "5m", "1h").
    pub conn_max_lifetime: String,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_idle_conns: 5,
            max_open_conns: 10,
            conn_max_lifetime: "5m".to_string(),
        }
    }
}

impl PoolSettings {
    /// Convert to worker command-line arguments.
    pub fn to_worker_args(&self) -> Vec<String> {
        vec![
            format!("-pool-max-idle={}", self.max_idle_conns),
            format!("-pool-max-open={}", self.max_open_conns),
            format!("-pool-conn-lifetime={}", self.conn_max_lifetime),
        ]
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SCHEMASYNC_CONFIG`
    /// 2. `./schemasync.toml`
    /// 3. `~/.config/schemasync/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SCHEMASYNC_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("schemasync.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("schemasync").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Instance ids must be unique: the catalog scopes every database by id.
    fn validate(&self) -> Result<(), SettingsError> {
        let mut seen: BTreeMap<i64, &str> = BTreeMap::new();
        for (name, instance) in &self.instances {
            if let Some(other) = seen.insert(instance.id, name) {
                return Err(SettingsError::InvalidConfig(format!(
                    "instances '{}' and '{}' share id {}",
                    other, name, instance.id
                )));
            }
        }
        if self.sync.reserved_database.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "sync.reserved_database must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Get an instance's settings by name.
    pub fn get_instance(&self, name: &str) -> Result<&InstanceSettings, SettingsError> {
        self.instances
            .get(name)
            .ok_or_else(|| SettingsError::InstanceNotFound(name.to_string()))
    }

    /// Resolve a named instance into the identity the reconciler consumes.
    pub fn instance(&self, name: &str) -> Result<Instance, SettingsError> {
        let settings = self.get_instance(name)?;
        Ok(Instance {
            id: InstanceId::new(settings.id),
            name: name.to_string(),
            connection: settings.connection_config()?,
        })
    }

    /// Resolve an instance by its catalog id.
    pub fn instance_by_id(&self, id: InstanceId) -> Result<Instance, SettingsError> {
        let name = self
            .instances
            .iter()
            .find(|(_, s)| s.id == id.get())
            .map(|(name, _)| name.clone())
            .ok_or_else(|| SettingsError::InstanceNotFound(id.to_string()))?;
        self.instance(&name)
    }

    /// Resolve every configured instance.
    pub fn all_instances(&self) -> Result<Vec<Instance>, SettingsError> {
        self.instances.keys().map(|name| self.instance(name)).collect()
    }

    /// Path of the catalog database.
    pub fn catalog_path(&self) -> Result<PathBuf, SettingsError> {
        if let Some(path) = &self.catalog.path {
            return Ok(PathBuf::from(expand_env_vars(path)?));
        }
        let base = dirs::home_dir().ok_or(SettingsError::NoCatalogDir)?;
        Ok(base.join(".schemasync").join("catalog.db"))
    }

    /// Get the worker binary path.
    ///
    /// Returns the configured path, or searches common locations.
    pub fn worker_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        if let Some(path) = &self.worker.path {
            return Ok(Some(PathBuf::from(expand_env_vars(path)?)));
        }

        let candidates = ["./schemasync-worker", "./worker/schemasync-worker"];
        Ok(candidates
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists()))
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    var_name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
