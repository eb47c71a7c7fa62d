//! Shared fixtures for sync integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use async_trait::async_trait;
use schemasync::catalog::{
    Catalog, CatalogDatabase, CatalogError, CatalogResult, CatalogTable, DatabaseCreate,
    DatabaseFind, DatabasePatch, EntityKind, InstanceId, SqliteCatalog, TableCreate, TableFind,
    TablePatch, DEFAULT_PROJECT, SYSTEM_ACTOR,
};
use schemasync::config::ConnectionConfig;
use schemasync::introspect::{
    IntrospectResult, LiveDatabase, LiveSchemaSnapshot, LiveTable, SchemaIntrospector,
};
use schemasync::sync::Instance;
use schemasync::worker::WorkerError;

pub fn instance(id: i64, name: &str) -> Instance {
    Instance {
        id: InstanceId::new(id),
        name: name.to_string(),
        connection: ConnectionConfig::mysql("localhost", "root", ""),
    }
}

/// Snapshot from `(database, tables)` pairs.
pub fn snapshot(databases: &[(&str, &[&str])]) -> LiveSchemaSnapshot {
    LiveSchemaSnapshot::new(
        databases
            .iter()
            .map(|(name, tables)| {
                tables
                    .iter()
                    .fold(LiveDatabase::new(*name), |db, table| {
                        db.with_table(LiveTable::new(*table))
                    })
            })
            .collect(),
    )
}

pub fn databases(catalog: &impl Catalog, instance: &Instance) -> Vec<CatalogDatabase> {
    catalog
        .find_databases(&DatabaseFind::by_instance(instance.id))
        .unwrap()
}

pub fn database(catalog: &impl Catalog, instance: &Instance, name: &str) -> CatalogDatabase {
    databases(catalog, instance)
        .into_iter()
        .find(|db| db.name == name)
        .unwrap_or_else(|| panic!("database {} not cataloged", name))
}

pub fn tables(catalog: &impl Catalog, database: &CatalogDatabase) -> Vec<CatalogTable> {
    catalog
        .find_tables(&TableFind::by_database(database.id))
        .unwrap()
}

/// Insert a database record directly, bypassing the reconciler.
pub fn seed_database(
    catalog: &impl Catalog,
    instance: &Instance,
    name: &str,
    ts: i64,
) -> CatalogDatabase {
    catalog
        .create_database(&DatabaseCreate {
            creator_id: SYSTEM_ACTOR,
            project_id: DEFAULT_PROJECT,
            instance_id: instance.id,
            name: name.to_string(),
            character_set: "utf8mb4".to_string(),
            collation: "utf8mb4_general_ci".to_string(),
            sync_ts: ts,
        })
        .unwrap()
}

/// Insert a table record directly, bypassing the reconciler.
pub fn seed_table(
    catalog: &impl Catalog,
    database: &CatalogDatabase,
    name: &str,
    ts: i64,
) -> CatalogTable {
    catalog
        .create_table(&TableCreate {
            creator_id: SYSTEM_ACTOR,
            database_id: database.id,
            name: name.to_string(),
            table_type: "BASE TABLE".to_string(),
            engine: "InnoDB".to_string(),
            collation: "utf8mb4_general_ci".to_string(),
            row_count: 0,
            data_size: 0,
            index_size: 0,
            data_free: 0,
            create_options: String::new(),
            comment: String::new(),
            sync_ts: ts,
        })
        .unwrap()
}

// ============================================================================
// Introspectors
// ============================================================================

/// Introspector whose ping or schema read fails.
pub struct FailingIntrospector {
    pub ping: fn() -> Option<WorkerError>,
    pub read: fn() -> WorkerError,
}

impl FailingIntrospector {
    /// Instance down: the ping is refused.
    pub fn unreachable() -> Self {
        Self {
            ping: || Some(WorkerError::ConnectionFailed("connection refused".to_string())),
            read: || WorkerError::ConnectionFailed("connection refused".to_string()),
        }
    }

    /// Ping succeeds but reading the schema fails.
    pub fn unreadable() -> Self {
        Self {
            ping: || None,
            read: || WorkerError::IntrospectionFailed("SELECT command denied".to_string()),
        }
    }
}

#[async_trait]
impl SchemaIntrospector for FailingIntrospector {
    async fn ping(&self) -> IntrospectResult<()> {
        match (self.ping)() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn list_databases(&self) -> IntrospectResult<Vec<LiveDatabase>> {
        Err((self.read)())
    }

    async fn list_tables(&self, _database: &str) -> IntrospectResult<Vec<LiveTable>> {
        Err((self.read)())
    }
}

// ============================================================================
// Catalog wrapper
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    FindDatabases,
    CreateDatabase,
    PatchDatabase,
    FindTables,
    CreateTable,
    PatchTable,
}

impl Op {
    pub fn is_write(&self) -> bool {
        !matches!(self, Op::FindDatabases | Op::FindTables)
    }
}

struct Fault {
    op: Op,
    /// Zero-based occurrence of `op` that fails.
    nth: usize,
    seen: Cell<usize>,
    error: fn() -> CatalogError,
}

/// In-memory catalog that records every call and can fail one of them.
pub struct RecordingCatalog {
    inner: SqliteCatalog,
    ops: RefCell<Vec<Op>>,
    fault: Option<Fault>,
}

impl RecordingCatalog {
    pub fn new() -> Self {
        Self {
            inner: SqliteCatalog::open_in_memory().unwrap(),
            ops: RefCell::new(Vec::new()),
            fault: None,
        }
    }

    /// Fail the `nth` call (zero-based) of `op` with `error`.
    pub fn failing(mut self, op: Op, nth: usize, error: fn() -> CatalogError) -> Self {
        self.fault = Some(Fault {
            op,
            nth,
            seen: Cell::new(0),
            error,
        });
        self
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.borrow().clone()
    }

    pub fn writes(&self) -> usize {
        self.ops.borrow().iter().filter(|op| op.is_write()).count()
    }

    pub fn count(&self, op: Op) -> usize {
        self.ops.borrow().iter().filter(|o| **o == op).count()
    }

    pub fn clear_ops(&self) {
        self.ops.borrow_mut().clear();
    }

    /// The wrapped store, for seeding and inspection without recording.
    pub fn inner(&self) -> &SqliteCatalog {
        &self.inner
    }

    fn record(&self, op: Op) -> CatalogResult<()> {
        self.ops.borrow_mut().push(op);
        if let Some(fault) = &self.fault {
            if fault.op == op {
                let seen = fault.seen.get();
                fault.seen.set(seen + 1);
                if seen == fault.nth {
                    return Err((fault.error)());
                }
            }
        }
        Ok(())
    }
}

impl Catalog for RecordingCatalog {
    fn find_databases(&self, find: &DatabaseFind) -> CatalogResult<Vec<CatalogDatabase>> {
        self.record(Op::FindDatabases)?;
        self.inner.find_databases(find)
    }

    fn create_database(&self, create: &DatabaseCreate) -> CatalogResult<CatalogDatabase> {
        self.record(Op::CreateDatabase)?;
        self.inner.create_database(create)
    }

    fn patch_database(&self, patch: &DatabasePatch) -> CatalogResult<CatalogDatabase> {
        self.record(Op::PatchDatabase)?;
        self.inner.patch_database(patch)
    }

    fn find_tables(&self, find: &TableFind) -> CatalogResult<Vec<CatalogTable>> {
        self.record(Op::FindTables)?;
        self.inner.find_tables(find)
    }

    fn create_table(&self, create: &TableCreate) -> CatalogResult<CatalogTable> {
        self.record(Op::CreateTable)?;
        self.inner.create_table(create)
    }

    fn patch_table(&self, patch: &TablePatch) -> CatalogResult<CatalogTable> {
        self.record(Op::PatchTable)?;
        self.inner.patch_table(patch)
    }
}

pub fn conflict_database() -> CatalogError {
    CatalogError::Conflict {
        entity: EntityKind::Database,
        name: "orders".to_string(),
    }
}

pub fn conflict_table() -> CatalogError {
    CatalogError::Conflict {
        entity: EntityKind::Table,
        name: "items".to_string(),
    }
}

pub fn database_gone() -> CatalogError {
    CatalogError::NotFound {
        entity: EntityKind::Database,
        id: 1,
    }
}

pub fn table_gone() -> CatalogError {
    CatalogError::NotFound {
        entity: EntityKind::Table,
        id: 1,
    }
}

pub fn disk_full() -> CatalogError {
    CatalogError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        "disk full",
    ))
}
