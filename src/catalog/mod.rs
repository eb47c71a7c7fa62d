//! Persisted catalog of databases and tables per instance.
//!
//! The reconciler talks to the catalog only through the [`Catalog`] trait:
//! filtered reads plus single-entity create and patch. No operation spans
//! more than one record, and callers get no transaction across calls.
//!
//! # Design
//!
//! - Database names are unique per instance, table names per database.
//!   Violations surface as [`CatalogError::Conflict`].
//! - A patch whose target row is gone surfaces as [`CatalogError::NotFound`].
//! - Records are never deleted; `SyncStatus::NotFound` is the soft-delete marker.

mod sqlite;
mod types;

pub use sqlite::SqliteCatalog;
pub use types::*;

use std::time::{SystemTime, UNIX_EPOCH};

/// Errors that can occur during catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A create hit an existing unique key.
    #[error("{entity} name already exists: {name}")]
    Conflict { entity: EntityKind, name: String },

    /// The target record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: i64 },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog schema version {found} does not match expected {expected}")]
    VersionMismatch { found: i32, expected: i32 },

    #[error("invalid catalog record: {0}")]
    InvalidRecord(String),
}

impl CatalogError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, CatalogError::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Store of catalog database and table records.
pub trait Catalog {
    /// Databases matching the filter, ordered by id.
    fn find_databases(&self, find: &DatabaseFind) -> CatalogResult<Vec<CatalogDatabase>>;

    /// Insert a database with `SyncStatus::Ok`.
    ///
    /// Fails with `Conflict` when the instance already has a database of that name.
    fn create_database(&self, create: &DatabaseCreate) -> CatalogResult<CatalogDatabase>;

    /// Apply a partial update and return the updated record.
    ///
    /// Fails with `NotFound` when no record has `patch.id`.
    fn patch_database(&self, patch: &DatabasePatch) -> CatalogResult<CatalogDatabase>;

    /// Tables matching the filter, ordered by id.
    fn find_tables(&self, find: &TableFind) -> CatalogResult<Vec<CatalogTable>>;

    /// The single table matching the filter, if any.
    fn find_table(&self, find: &TableFind) -> CatalogResult<Option<CatalogTable>> {
        let mut tables = self.find_tables(find)?;
        match tables.len() {
            0 | 1 => Ok(tables.pop()),
            n => Err(CatalogError::InvalidRecord(format!(
                "expected at most one table, filter matched {}",
                n
            ))),
        }
    }

    /// Insert a table with `SyncStatus::Ok`.
    ///
    /// Fails with `Conflict` when the database already has a table of that name,
    /// and with `NotFound` when the owning database does not exist.
    fn create_table(&self, create: &TableCreate) -> CatalogResult<CatalogTable>;

    /// Apply a partial update and return the updated record.
    ///
    /// Fails with `NotFound` when no record has `patch.id`.
    fn patch_table(&self, patch: &TablePatch) -> CatalogResult<CatalogTable>;
}

impl<C: Catalog + ?Sized> Catalog for &C {
    fn find_databases(&self, find: &DatabaseFind) -> CatalogResult<Vec<CatalogDatabase>> {
        (**self).find_databases(find)
    }

    fn create_database(&self, create: &DatabaseCreate) -> CatalogResult<CatalogDatabase> {
        (**self).create_database(create)
    }

    fn patch_database(&self, patch: &DatabasePatch) -> CatalogResult<CatalogDatabase> {
        (**self).patch_database(patch)
    }

    fn find_tables(&self, find: &TableFind) -> CatalogResult<Vec<CatalogTable>> {
        (**self).find_tables(find)
    }

    fn find_table(&self, find: &TableFind) -> CatalogResult<Option<CatalogTable>> {
        (**self).find_table(find)
    }

    fn create_table(&self, create: &TableCreate) -> CatalogResult<CatalogTable> {
        (**self).create_table(create)
    }

    fn patch_table(&self, patch: &TablePatch) -> CatalogResult<CatalogTable> {
        (**self).patch_table(patch)
    }
}

/// Current time in unix seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
