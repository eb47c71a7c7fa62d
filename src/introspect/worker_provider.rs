//! WorkerSchemaIntrospector implementation.

use std::sync::Arc;

use async_trait::async_trait;

use super::provider::{IntrospectResult, SchemaIntrospector};
use super::types::{LiveDatabase, LiveSchemaSnapshot, LiveTable};
use crate::config::ConnectionConfig;
use crate::worker::protocol::{self, methods, ConnectionParams};
use crate::worker::WorkerClient;

/// SchemaIntrospector that reads the instance through the worker.
///
/// # Example
///
/// ```ignore
/// use schemasync::worker::WorkerClient;
/// use schemasync::introspect::WorkerSchemaIntrospector;
///
/// let client = Arc::new(WorkerClient::spawn("./schemasync-worker").await?);
/// let introspector = WorkerSchemaIntrospector::new(client, &instance.connection);
///
/// let snapshot = introspector.sync_schema().await?;
/// ```
pub struct WorkerSchemaIntrospector {
    /// The worker client for RPC calls.
    client: Arc<WorkerClient>,
    /// Cached connection parameters to avoid repeated allocations.
    connection: ConnectionParams,
}

impl WorkerSchemaIntrospector {
    /// Create an introspector for one instance.
    pub fn new(client: Arc<WorkerClient>, config: &ConnectionConfig) -> Self {
        Self {
            client,
            connection: ConnectionParams {
                driver: config.driver_name().to_string(),
                connection_string: config.to_connection_string(),
            },
        }
    }

    #[inline]
    fn connection_params(&self) -> ConnectionParams {
        self.connection.clone()
    }

    /// Get the driver name.
    pub fn driver(&self) -> &str {
        &self.connection.driver
    }
}

#[async_trait]
impl SchemaIntrospector for WorkerSchemaIntrospector {
    async fn ping(&self) -> IntrospectResult<()> {
        let _: protocol::PingResponse = self
            .client
            .request(
                methods::PING,
                protocol::PingParams {
                    connection: self.connection_params(),
                },
            )
            .await?;
        Ok(())
    }

    async fn list_databases(&self) -> IntrospectResult<Vec<LiveDatabase>> {
        let response: protocol::ListDatabasesResponse = self
            .client
            .request(
                methods::LIST_DATABASES,
                protocol::ListDatabasesParams {
                    connection: self.connection_params(),
                },
            )
            .await?;

        Ok(response.databases.into_iter().map(Into::into).collect())
    }

    async fn list_tables(&self, database: &str) -> IntrospectResult<Vec<LiveTable>> {
        let response: protocol::ListTablesResponse = self
            .client
            .request(
                methods::LIST_TABLES,
                protocol::ListTablesParams {
                    connection: self.connection_params(),
                    database: database.to_string(),
                },
            )
            .await?;

        Ok(response.tables)
    }

    /// One round trip: the worker reads databases and tables together.
    async fn sync_schema(&self) -> IntrospectResult<LiveSchemaSnapshot> {
        let response: protocol::SyncSchemaResponse = self
            .client
            .request(
                methods::SYNC_SCHEMA,
                protocol::SyncSchemaParams {
                    connection: self.connection_params(),
                },
            )
            .await?;

        Ok(LiveSchemaSnapshot::new(response.databases))
    }
}
