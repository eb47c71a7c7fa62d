//! The reconciliation pass.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use super::{
    is_reserved_database, Instance, Scope, SyncError, SyncResultSet, SyncSummary,
    DEFAULT_RESERVED_DATABASE,
};
use crate::catalog::{
    unix_now, ActorId, Catalog, CatalogDatabase, DatabaseCreate, DatabaseFind, DatabasePatch,
    EntityKind, ProjectId, SyncStatus, TableCreate, TableFind, TablePatch, DEFAULT_PROJECT,
    SYSTEM_ACTOR,
};
use crate::introspect::{LiveDatabase, LiveSchemaSnapshot, LiveTable, SchemaIntrospector};

/// Identity and naming used for catalog writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Recorded as creator and updater of every write.
    pub actor: ActorId,
    /// Project assigned to newly discovered databases.
    pub default_project: ProjectId,
    /// Live and catalog databases with this name (any case) are ignored.
    pub reserved_database: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            actor: SYSTEM_ACTOR,
            default_project: DEFAULT_PROJECT,
            reserved_database: DEFAULT_RESERVED_DATABASE.to_string(),
        }
    }
}

/// Drives a [`Catalog`] toward the live schema of one instance at a time.
///
/// # Example
///
/// ```ignore
/// let reconciler = Reconciler::new(SqliteCatalog::open(&path)?);
/// let result = reconciler.synchronize(&instance, &introspector).await;
/// if let Some(message) = result.error() {
///     eprintln!("{}", message);
/// }
/// ```
pub struct Reconciler<C> {
    catalog: C,
    options: SyncOptions,
}

impl<C: Catalog> Reconciler<C> {
    pub fn new(catalog: C) -> Self {
        Self::with_options(catalog, SyncOptions::default())
    }

    pub fn with_options(catalog: C, options: SyncOptions) -> Self {
        Self { catalog, options }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn into_catalog(self) -> C {
        self.catalog
    }

    /// Synchronize the catalog with `instance` and report the outcome.
    pub async fn synchronize<I>(&self, instance: &Instance, introspector: &I) -> SyncResultSet
    where
        I: SchemaIntrospector + ?Sized,
    {
        self.try_synchronize(instance, introspector).await.into()
    }

    /// Synchronize the catalog with `instance`.
    ///
    /// The instance is pinged before its schema is read. Neither a failed
    /// ping nor a failed read touches the catalog. After that, the first
    /// catalog error ends the run and earlier writes are kept.
    pub async fn try_synchronize<I>(
        &self,
        instance: &Instance,
        introspector: &I,
    ) -> Result<SyncSummary, SyncError>
    where
        I: SchemaIntrospector + ?Sized,
    {
        info!(instance = %instance.name, "syncing instance schema");

        let username = &instance.connection.username;
        introspector.ping().await.map_err(|source| SyncError::Connection {
            instance: instance.name.clone(),
            username: username.clone(),
            source,
        })?;

        let snapshot = introspector
            .sync_schema()
            .await
            .map_err(|source| SyncError::from_introspection(&instance.name, username, source))?;

        debug!(
            instance = %instance.name,
            databases = snapshot.databases.len(),
            tables = snapshot.table_count(),
            "read live schema"
        );

        let result = self.apply(instance, &snapshot);
        match &result {
            Ok(summary) => info!(instance = %instance.name, %summary, "instance synced"),
            Err(e) => warn!(instance = %instance.name, kind = ?e.kind(), error = %e, "sync halted"),
        }
        result
    }

    /// Apply an already read snapshot, stamping writes with the current time.
    pub fn apply(
        &self,
        instance: &Instance,
        snapshot: &LiveSchemaSnapshot,
    ) -> Result<SyncSummary, SyncError> {
        self.apply_at(instance, snapshot, unix_now())
    }

    /// Apply a snapshot with an explicit run timestamp in unix seconds.
    pub fn apply_at(
        &self,
        instance: &Instance,
        snapshot: &LiveSchemaSnapshot,
        ts: i64,
    ) -> Result<SyncSummary, SyncError> {
        let mut pass = Pass {
            catalog: &self.catalog,
            options: &self.options,
            instance,
            ts,
            summary: SyncSummary::default(),
        };
        pass.run(snapshot)?;
        Ok(pass.summary)
    }
}

/// State of one run over one snapshot.
struct Pass<'a, C> {
    catalog: &'a C,
    options: &'a SyncOptions,
    instance: &'a Instance,
    ts: i64,
    summary: SyncSummary,
}

impl<C: Catalog> Pass<'_, C> {
    fn run(&mut self, snapshot: &LiveSchemaSnapshot) -> Result<(), SyncError> {
        let existing = self
            .catalog
            .find_databases(&DatabaseFind::by_instance(self.instance.id))
            .map_err(|source| {
                SyncError::from_catalog(
                    EntityKind::Database,
                    self.scope(None),
                    "",
                    "find database list",
                    source,
                )
            })?;

        let mut seen = HashSet::new();
        for live in &snapshot.databases {
            if self.is_reserved(&live.name) {
                debug!(database = %live.name, "skipping reserved database");
                self.summary.reserved_skipped += 1;
                continue;
            }
            if !seen.insert(live.name.as_str()) {
                warn!(database = %live.name, "database listed twice in live schema, ignoring repeat");
                continue;
            }

            match existing.iter().find(|db| db.name == live.name) {
                Some(stored) => self.refresh_database(stored, live)?,
                None => self.import_database(live)?,
            }
        }

        for stored in &existing {
            if self.is_reserved(&stored.name) || seen.contains(stored.name.as_str()) {
                continue;
            }
            self.mark_missing(stored)?;
        }

        Ok(())
    }

    /// Live and cataloged: mark OK, then bring each live table in.
    fn refresh_database(
        &mut self,
        stored: &CatalogDatabase,
        live: &LiveDatabase,
    ) -> Result<(), SyncError> {
        let database = self
            .catalog
            .patch_database(&DatabasePatch {
                id: stored.id,
                updater_id: self.options.actor,
                sync_status: Some(SyncStatus::Ok),
                last_successful_sync_ts: Some(self.ts),
            })
            .map_err(|source| {
                SyncError::from_catalog(
                    EntityKind::Database,
                    self.scope(None),
                    &stored.name,
                    format!("update database: {}", stored.name),
                    source,
                )
            })?;
        debug!(database = %database.name, id = %database.id, "refreshed database");
        self.summary.databases_refreshed += 1;

        for table in distinct_tables(live) {
            self.sync_table(&database, table)?;
        }
        Ok(())
    }

    /// Live only: create the database and all of its tables.
    fn import_database(&mut self, live: &LiveDatabase) -> Result<(), SyncError> {
        let database = self
            .catalog
            .create_database(&DatabaseCreate {
                creator_id: self.options.actor,
                project_id: self.options.default_project,
                instance_id: self.instance.id,
                name: live.name.clone(),
                character_set: live.character_set.clone(),
                collation: live.collation.clone(),
                sync_ts: self.ts,
            })
            .map_err(|source| {
                SyncError::from_catalog(
                    EntityKind::Database,
                    self.scope(None),
                    &live.name,
                    format!("import new database: {}", live.name),
                    source,
                )
            })?;
        debug!(database = %database.name, id = %database.id, "imported database");
        self.summary.databases_created += 1;

        for table in distinct_tables(live) {
            self.create_table(&database, table)?;
        }
        Ok(())
    }

    /// Cataloged only: flag NOT_FOUND. Its tables keep their last state.
    fn mark_missing(&mut self, stored: &CatalogDatabase) -> Result<(), SyncError> {
        self.catalog
            .patch_database(&DatabasePatch {
                id: stored.id,
                updater_id: self.options.actor,
                sync_status: Some(SyncStatus::NotFound),
                last_successful_sync_ts: Some(self.ts),
            })
            .map_err(|source| {
                SyncError::from_catalog(
                    EntityKind::Database,
                    self.scope(None),
                    &stored.name,
                    format!("update database: {}", stored.name),
                    source,
                )
            })?;
        debug!(database = %stored.name, id = %stored.id, "database not found on instance");
        self.summary.databases_missing += 1;
        Ok(())
    }

    fn sync_table(&mut self, database: &CatalogDatabase, live: &LiveTable) -> Result<(), SyncError> {
        let found = self
            .catalog
            .find_table(&TableFind::by_name(database.id, live.name.as_str()))
            .map_err(|source| {
                SyncError::from_catalog(
                    EntityKind::Table,
                    self.scope(Some(&database.name)),
                    &live.name,
                    format!("find table: {}", live.name),
                    source,
                )
            })?;

        let Some(stored) = found else {
            return self.create_table(database, live);
        };

        self.catalog
            .patch_table(&TablePatch {
                id: stored.id,
                updater_id: self.options.actor,
                sync_status: Some(SyncStatus::Ok),
                last_successful_sync_ts: Some(self.ts),
            })
            .map_err(|source| {
                SyncError::from_catalog(
                    EntityKind::Table,
                    self.scope(Some(&database.name)),
                    &stored.name,
                    format!("update table: {}", stored.name),
                    source,
                )
            })?;
        debug!(database = %database.name, table = %stored.name, "refreshed table");
        self.summary.tables_refreshed += 1;
        Ok(())
    }

    fn create_table(&mut self, database: &CatalogDatabase, live: &LiveTable) -> Result<(), SyncError> {
        self.catalog
            .create_table(&TableCreate {
                creator_id: self.options.actor,
                database_id: database.id,
                name: live.name.clone(),
                table_type: live.table_type.clone(),
                engine: live.engine.clone(),
                collation: live.collation.clone(),
                row_count: live.row_count,
                data_size: live.data_size,
                index_size: live.index_size,
                data_free: live.data_free,
                create_options: live.create_options.clone(),
                comment: live.comment.clone(),
                sync_ts: self.ts,
            })
            .map_err(|source| {
                SyncError::from_catalog(
                    EntityKind::Table,
                    self.scope(Some(&database.name)),
                    &live.name,
                    format!("import new table: {}", live.name),
                    source,
                )
            })?;
        debug!(database = %database.name, table = %live.name, "imported table");
        self.summary.tables_created += 1;
        Ok(())
    }

    fn is_reserved(&self, name: &str) -> bool {
        is_reserved_database(name, &self.options.reserved_database)
    }

    fn scope(&self, database: Option<&str>) -> Scope {
        match database {
            Some(database) => Scope::database(&self.instance.name, database),
            None => Scope::instance(&self.instance.name),
        }
    }
}

/// Tables of `live` in listed order, each name once.
///
/// Repeats are dropped the same way repeated databases are, so a database
/// gives the same result whether or not it is already cataloged.
fn distinct_tables(live: &LiveDatabase) -> impl Iterator<Item = &LiveTable> {
    let mut seen = HashSet::new();
    live.tables.iter().filter(move |table| {
        let first = seen.insert(table.name.as_str());
        if !first {
            warn!(database = %live.name, table = %table.name, "table listed twice in live schema, ignoring repeat");
        }
        first
    })
}
