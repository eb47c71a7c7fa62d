//! SchemaIntrospector trait definition.
//!
//! The trait abstracts over the ways a live schema can be read. The primary
//! implementation talks to the introspection worker; `StaticIntrospector`
//! serves a fixed snapshot.

use async_trait::async_trait;

use super::types::{LiveDatabase, LiveSchemaSnapshot, LiveTable};
use crate::worker::WorkerError;

/// Error type for introspection operations.
pub type IntrospectError = WorkerError;

/// Result type for introspection operations.
pub type IntrospectResult<T> = Result<T, IntrospectError>;

/// Reads the live schema of one instance.
///
/// An introspector is bound to a single instance's connection parameters.
///
/// # Example
///
/// ```ignore
/// use schemasync::introspect::SchemaIntrospector;
///
/// async fn example(introspector: &impl SchemaIntrospector) -> IntrospectResult<()> {
///     introspector.ping().await?;
///     let snapshot = introspector.sync_schema().await?;
///     println!("{} databases", snapshot.databases.len());
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// Open a connection to the instance and check it answers.
    async fn ping(&self) -> IntrospectResult<()>;

    /// List databases without their tables.
    async fn list_databases(&self) -> IntrospectResult<Vec<LiveDatabase>>;

    /// List the tables of one database.
    async fn list_tables(&self, database: &str) -> IntrospectResult<Vec<LiveTable>>;

    /// Read the full snapshot.
    ///
    /// Default implementation lists databases first, then fetches every
    /// database's tables in parallel. The first failure fails the whole read.
    async fn sync_schema(&self) -> IntrospectResult<LiveSchemaSnapshot> {
        let mut databases = self.list_databases().await?;

        let futures: Vec<_> = databases
            .iter()
            .map(|db| self.list_tables(&db.name))
            .collect();

        let results = futures::future::join_all(futures).await;

        for (db, tables) in databases.iter_mut().zip(results) {
            db.tables = tables?;
        }

        Ok(LiveSchemaSnapshot::new(databases))
    }
}
