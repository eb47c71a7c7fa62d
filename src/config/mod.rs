//! Configuration module for schemasync.
//!
//! Handles instance connection parameters, environment variables, and settings.

mod connection;
mod settings;

pub use connection::{ConnectionConfig, ConnectionError, Driver};
pub use settings::{
    expand_env_vars, CatalogSettings, InstanceSettings, PoolSettings, Settings, SettingsError,
    SyncSettings, WorkerSettings,
};
