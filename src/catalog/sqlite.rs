//! SQLite-backed catalog.
//!
//! The catalog is stored at `~/.schemasync/catalog.db` unless configured
//! otherwise.
//!
//! # Layout
//!
//! ```text
//! meta (key, value)                      schema version
//! db   (id, instance_id, name, ...)      UNIQUE (instance_id, name)
//! tbl  (id, database_id -> db.id, ...)   UNIQUE (database_id, name)
//! ```

use std::path::Path;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use tracing::debug;

use super::types::*;
use super::{unix_now, Catalog, CatalogError, CatalogResult};

/// Current catalog schema version. Bump this when the layout changes.
const CATALOG_VERSION: i32 = 1;

// Extended result codes, see https://www.sqlite.org/rescode.html
const SQLITE_CONSTRAINT_FOREIGNKEY: i32 = 787;
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

const DATABASE_COLUMNS: &str = "id, instance_id, project_id, name, character_set, collation, \
     sync_status, last_successful_sync_ts, creator_id, created_ts, updater_id, updated_ts";

const TABLE_COLUMNS: &str = "id, database_id, name, type, engine, collation, row_count, \
     data_size, index_size, data_free, create_options, comment, sync_status, \
     last_successful_sync_ts, creator_id, created_ts, updater_id, updated_ts";

/// Catalog persisted in a SQLite file.
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    /// Open or create the catalog database at `path`.
    ///
    /// Fails with `VersionMismatch` if the file was written by an
    /// incompatible layout.
    pub fn open(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let catalog = Self { conn };
        catalog.init()?;
        debug!(path = %path.display(), "opened catalog");

        Ok(catalog)
    }

    /// Open an in-memory catalog (for testing).
    pub fn open_in_memory() -> CatalogResult<Self> {
        let conn = Connection::open_in_memory()?;
        let catalog = Self { conn };
        catalog.init()?;
        Ok(catalog)
    }

    /// Initialize the schema and check the version.
    fn init(&self) -> CatalogResult<()> {
        self.conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS db (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                instance_id INTEGER NOT NULL,
                project_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                character_set TEXT NOT NULL,
                collation TEXT NOT NULL,
                sync_status TEXT NOT NULL CHECK (sync_status IN ('OK', 'NOT_FOUND')),
                last_successful_sync_ts INTEGER NOT NULL,
                creator_id INTEGER NOT NULL,
                created_ts INTEGER NOT NULL,
                updater_id INTEGER NOT NULL,
                updated_ts INTEGER NOT NULL,
                UNIQUE (instance_id, name)
            );

            CREATE TABLE IF NOT EXISTS tbl (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                database_id INTEGER NOT NULL REFERENCES db (id),
                name TEXT NOT NULL,
                type TEXT NOT NULL,
                engine TEXT NOT NULL,
                collation TEXT NOT NULL,
                row_count INTEGER NOT NULL,
                data_size INTEGER NOT NULL,
                index_size INTEGER NOT NULL,
                data_free INTEGER NOT NULL,
                create_options TEXT NOT NULL,
                comment TEXT NOT NULL,
                sync_status TEXT NOT NULL CHECK (sync_status IN ('OK', 'NOT_FOUND')),
                last_successful_sync_ts INTEGER NOT NULL,
                creator_id INTEGER NOT NULL,
                created_ts INTEGER NOT NULL,
                updater_id INTEGER NOT NULL,
                updated_ts INTEGER NOT NULL,
                UNIQUE (database_id, name)
            );
            ",
        )?;

        let stored_version: Option<String> = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                row.get(0)
            })
            .optional()?;

        match stored_version {
            None => {
                self.conn.execute(
                    "INSERT INTO meta (key, value) VALUES ('version', ?)",
                    params![CATALOG_VERSION.to_string()],
                )?;
            }
            Some(v) => {
                let found: i32 = v.parse().map_err(|_| {
                    CatalogError::InvalidRecord(format!("unreadable catalog version: {}", v))
                })?;
                if found != CATALOG_VERSION {
                    return Err(CatalogError::VersionMismatch {
                        found,
                        expected: CATALOG_VERSION,
                    });
                }
            }
        }

        Ok(())
    }

    fn database_by_id(&self, id: DatabaseId) -> CatalogResult<Option<CatalogDatabase>> {
        let sql = format!("SELECT {} FROM db WHERE id = ?", DATABASE_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id.get()], database_from_row)
            .optional()?)
    }

    fn table_by_id(&self, id: TableId) -> CatalogResult<Option<CatalogTable>> {
        let sql = format!("SELECT {} FROM tbl WHERE id = ?", TABLE_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id.get()], table_from_row)
            .optional()?)
    }
}

impl Catalog for SqliteCatalog {
    fn find_databases(&self, find: &DatabaseFind) -> CatalogResult<Vec<CatalogDatabase>> {
        let mut sql = format!("SELECT {} FROM db WHERE 1 = 1", DATABASE_COLUMNS);
        let mut values: Vec<Value> = Vec::new();

        if let Some(id) = find.id {
            sql.push_str(" AND id = ?");
            values.push(Value::Integer(id.get()));
        }
        if let Some(instance_id) = find.instance_id {
            sql.push_str(" AND instance_id = ?");
            values.push(Value::Integer(instance_id.get()));
        }
        if let Some(name) = &find.name {
            sql.push_str(" AND name = ?");
            values.push(Value::Text(name.clone()));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self.conn.prepare(&sql)?;
        let databases = stmt
            .query_map(params_from_iter(values.iter()), database_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(databases)
    }

    fn create_database(&self, create: &DatabaseCreate) -> CatalogResult<CatalogDatabase> {
        let now = unix_now();
        self.conn
            .execute(
                "INSERT INTO db (instance_id, project_id, name, character_set, collation,
                     sync_status, last_successful_sync_ts, creator_id, created_ts, updater_id, updated_ts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?8, ?9)",
                params![
                    create.instance_id.get(),
                    create.project_id.get(),
                    create.name,
                    create.character_set,
                    create.collation,
                    SyncStatus::Ok,
                    create.sync_ts,
                    create.creator_id.get(),
                    now,
                ],
            )
            .map_err(|e| map_insert_error(e, EntityKind::Database, &create.name, None))?;

        let id = DatabaseId::new(self.conn.last_insert_rowid());
        self.database_by_id(id)?.ok_or(CatalogError::NotFound {
            entity: EntityKind::Database,
            id: id.get(),
        })
    }

    fn patch_database(&self, patch: &DatabasePatch) -> CatalogResult<CatalogDatabase> {
        let rows = self.conn.execute(
            "UPDATE db SET
                 updater_id = ?1,
                 updated_ts = ?2,
                 sync_status = COALESCE(?3, sync_status),
                 last_successful_sync_ts = MAX(last_successful_sync_ts, COALESCE(?4, last_successful_sync_ts))
             WHERE id = ?5",
            params![
                patch.updater_id.get(),
                unix_now(),
                patch.sync_status,
                patch.last_successful_sync_ts,
                patch.id.get(),
            ],
        )?;

        let not_found = || CatalogError::NotFound {
            entity: EntityKind::Database,
            id: patch.id.get(),
        };
        if rows == 0 {
            return Err(not_found());
        }
        self.database_by_id(patch.id)?.ok_or_else(not_found)
    }

    fn find_tables(&self, find: &TableFind) -> CatalogResult<Vec<CatalogTable>> {
        let mut sql = format!("SELECT {} FROM tbl WHERE 1 = 1", TABLE_COLUMNS);
        let mut values: Vec<Value> = Vec::new();

        if let Some(id) = find.id {
            sql.push_str(" AND id = ?");
            values.push(Value::Integer(id.get()));
        }
        if let Some(database_id) = find.database_id {
            sql.push_str(" AND database_id = ?");
            values.push(Value::Integer(database_id.get()));
        }
        if let Some(name) = &find.name {
            sql.push_str(" AND name = ?");
            values.push(Value::Text(name.clone()));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self.conn.prepare(&sql)?;
        let tables = stmt
            .query_map(params_from_iter(values.iter()), table_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tables)
    }

    fn create_table(&self, create: &TableCreate) -> CatalogResult<CatalogTable> {
        let now = unix_now();
        self.conn
            .execute(
                "INSERT INTO tbl (database_id, name, type, engine, collation, row_count, data_size,
                     index_size, data_free, create_options, comment, sync_status,
                     last_successful_sync_ts, creator_id, created_ts, updater_id, updated_ts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?14, ?15)",
                params![
                    create.database_id.get(),
                    create.name,
                    create.table_type,
                    create.engine,
                    create.collation,
                    create.row_count,
                    create.data_size,
                    create.index_size,
                    create.data_free,
                    create.create_options,
                    create.comment,
                    SyncStatus::Ok,
                    create.sync_ts,
                    create.creator_id.get(),
                    now,
                ],
            )
            .map_err(|e| {
                map_insert_error(e, EntityKind::Table, &create.name, Some(create.database_id))
            })?;

        let id = TableId::new(self.conn.last_insert_rowid());
        self.table_by_id(id)?.ok_or(CatalogError::NotFound {
            entity: EntityKind::Table,
            id: id.get(),
        })
    }

    fn patch_table(&self, patch: &TablePatch) -> CatalogResult<CatalogTable> {
        let rows = self.conn.execute(
            "UPDATE tbl SET
                 updater_id = ?1,
                 updated_ts = ?2,
                 sync_status = COALESCE(?3, sync_status),
                 last_successful_sync_ts = MAX(last_successful_sync_ts, COALESCE(?4, last_successful_sync_ts))
             WHERE id = ?5",
            params![
                patch.updater_id.get(),
                unix_now(),
                patch.sync_status,
                patch.last_successful_sync_ts,
                patch.id.get(),
            ],
        )?;

        let not_found = || CatalogError::NotFound {
            entity: EntityKind::Table,
            id: patch.id.get(),
        };
        if rows == 0 {
            return Err(not_found());
        }
        self.table_by_id(patch.id)?.ok_or_else(not_found)
    }
}

/// Translate constraint failures on insert into typed catalog errors.
fn map_insert_error(
    err: rusqlite::Error,
    entity: EntityKind,
    name: &str,
    parent: Option<DatabaseId>,
) -> CatalogError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            match failure.extended_code {
                SQLITE_CONSTRAINT_UNIQUE => {
                    return CatalogError::Conflict {
                        entity,
                        name: name.to_string(),
                    }
                }
                SQLITE_CONSTRAINT_FOREIGNKEY => {
                    if let Some(database_id) = parent {
                        return CatalogError::NotFound {
                            entity: EntityKind::Database,
                            id: database_id.get(),
                        };
                    }
                }
                _ => {}
            }
        }
    }
    CatalogError::Sqlite(err)
}

fn database_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogDatabase> {
    Ok(CatalogDatabase {
        id: DatabaseId::new(row.get(0)?),
        instance_id: InstanceId::new(row.get(1)?),
        project_id: ProjectId::new(row.get(2)?),
        name: row.get(3)?,
        character_set: row.get(4)?,
        collation: row.get(5)?,
        sync_status: row.get(6)?,
        last_successful_sync_ts: row.get(7)?,
        creator_id: ActorId::new(row.get(8)?),
        created_ts: row.get(9)?,
        updater_id: ActorId::new(row.get(10)?),
        updated_ts: row.get(11)?,
    })
}

fn table_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogTable> {
    Ok(CatalogTable {
        id: TableId::new(row.get(0)?),
        database_id: DatabaseId::new(row.get(1)?),
        name: row.get(2)?,
        table_type: row.get(3)?,
        engine: row.get(4)?,
        collation: row.get(5)?,
        row_count: row.get(6)?,
        data_size: row.get(7)?,
        index_size: row.get(8)?,
        data_free: row.get(9)?,
        create_options: row.get(10)?,
        comment: row.get(11)?,
        sync_status: row.get(12)?,
        last_successful_sync_ts: row.get(13)?,
        creator_id: ActorId::new(row.get(14)?),
        created_ts: row.get(15)?,
        updater_id: ActorId::new(row.get(16)?),
        updated_ts: row.get(17)?,
    })
}

impl ToSql for SyncStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for SyncStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
