//! Catalog record, filter, and mutation types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

catalog_id!(
    /// Identity of a live instance.
    InstanceId
);
catalog_id!(
    /// Project a database is assigned to.
    ProjectId
);
catalog_id!(
    /// Principal recorded as creator/updater of a record.
    ActorId
);
catalog_id!(
    /// Opaque key of a catalog database record.
    DatabaseId
);
catalog_id!(
    /// Opaque key of a catalog table record.
    TableId
);

/// The non-human actor automated catalog mutations are attributed to.
pub const SYSTEM_ACTOR: ActorId = ActorId::new(1);

/// Project newly discovered databases land in.
pub const DEFAULT_PROJECT: ProjectId = ProjectId::new(1);

/// Which kind of catalog entity an operation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Database,
    Table,
}

impl EntityKind {
    /// Capitalized form for the start of a sentence.
    pub fn title(&self) -> &'static str {
        match self {
            EntityKind::Database => "Database",
            EntityKind::Table => "Table",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Database => "database",
            EntityKind::Table => "table",
        })
    }
}

/// Whether a record was present in the most recent live snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncStatus {
    #[serde(rename = "OK")]
    Ok,
    /// Present in the catalog, absent from the last snapshot. Soft-delete marker.
    #[serde(rename = "NOT_FOUND")]
    NotFound,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Ok => "OK",
            SyncStatus::NotFound => "NOT_FOUND",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid sync status: {0}")]
pub struct ParseSyncStatusError(pub String);

impl FromStr for SyncStatus {
    type Err = ParseSyncStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OK" => Ok(SyncStatus::Ok),
            "NOT_FOUND" => Ok(SyncStatus::NotFound),
            other => Err(ParseSyncStatusError(other.to_string())),
        }
    }
}

// ============================================================================
// Databases
// ============================================================================

/// A database the catalog tracks for one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDatabase {
    pub id: DatabaseId,
    pub instance_id: InstanceId,
    pub project_id: ProjectId,
    pub name: String,
    pub character_set: String,
    pub collation: String,
    pub sync_status: SyncStatus,
    /// Unix seconds of the last run that observed (or failed to observe) it.
    pub last_successful_sync_ts: i64,
    pub creator_id: ActorId,
    pub created_ts: i64,
    pub updater_id: ActorId,
    pub updated_ts: i64,
}

/// Filter for `Catalog::find_databases`. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct DatabaseFind {
    pub id: Option<DatabaseId>,
    pub instance_id: Option<InstanceId>,
    pub name: Option<String>,
}

impl DatabaseFind {
    pub fn by_instance(instance_id: InstanceId) -> Self {
        Self {
            instance_id: Some(instance_id),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseCreate {
    pub creator_id: ActorId,
    pub project_id: ProjectId,
    pub instance_id: InstanceId,
    pub name: String,
    pub character_set: String,
    pub collation: String,
    /// Initial `last_successful_sync_ts`. New records start as `OK`.
    pub sync_ts: i64,
}

/// Partial update. `None` leaves the column unchanged.
#[derive(Debug, Clone)]
pub struct DatabasePatch {
    pub id: DatabaseId,
    pub updater_id: ActorId,
    pub sync_status: Option<SyncStatus>,
    pub last_successful_sync_ts: Option<i64>,
}

// ============================================================================
// Tables
// ============================================================================

/// A table the catalog tracks inside one catalog database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTable {
    pub id: TableId,
    pub database_id: DatabaseId,
    pub name: String,
    pub table_type: String,
    pub engine: String,
    pub collation: String,
    pub row_count: i64,
    pub data_size: i64,
    pub index_size: i64,
    pub data_free: i64,
    pub create_options: String,
    pub comment: String,
    pub sync_status: SyncStatus,
    pub last_successful_sync_ts: i64,
    pub creator_id: ActorId,
    pub created_ts: i64,
    pub updater_id: ActorId,
    pub updated_ts: i64,
}

/// Filter for `Catalog::find_tables`. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TableFind {
    pub id: Option<TableId>,
    pub database_id: Option<DatabaseId>,
    pub name: Option<String>,
}

impl TableFind {
    pub fn by_database(database_id: DatabaseId) -> Self {
        Self {
            database_id: Some(database_id),
            ..Default::default()
        }
    }

    pub fn by_name(database_id: DatabaseId, name: impl Into<String>) -> Self {
        Self {
            database_id: Some(database_id),
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableCreate {
    pub creator_id: ActorId,
    pub database_id: DatabaseId,
    pub name: String,
    pub table_type: String,
    pub engine: String,
    pub collation: String,
    pub row_count: i64,
    pub data_size: i64,
    pub index_size: i64,
    pub data_free: i64,
    pub create_options: String,
    pub comment: String,
    /// Initial `last_successful_sync_ts`. New records start as `OK`.
    pub sync_ts: i64,
}

/// Partial update. `None` leaves the column unchanged.
#[derive(Debug, Clone)]
pub struct TablePatch {
    pub id: TableId,
    pub updater_id: ActorId,
    pub sync_status: Option<SyncStatus>,
    pub last_successful_sync_ts: Option<i64>,
}
