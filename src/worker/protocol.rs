//! Protocol types for worker communication.
//!
//! The worker reads one JSON request per line on stdin and answers with one
//! JSON response per line on stdout.

use serde::{Deserialize, Serialize};

use crate::introspect::{LiveDatabase, LiveTable};

// ============================================================================
// Request/Response Envelope
// ============================================================================

/// Request envelope sent to the worker.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    /// Unique request ID for correlation.
    pub id: String,
    /// Method name (e.g., "schema.sync").
    pub method: String,
    /// Method-specific parameters.
    pub params: serde_json::Value,
}

/// Response envelope received from the worker.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    /// Request ID this response corresponds to.
    pub id: String,
    /// Whether the request succeeded.
    pub success: bool,
    /// Result data (present if success = true).
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Error information (present if success = false).
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

/// Error information in a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorInfo {
    /// Error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Error codes the worker may answer with.
pub mod codes {
    pub const DRIVER_NOT_FOUND: &str = "DRIVER_NOT_FOUND";
    pub const CONNECTION_FAILED: &str = "CONNECTION_FAILED";
    pub const INTROSPECTION_FAILED: &str = "INTROSPECTION_FAILED";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const METHOD_NOT_FOUND: &str = "METHOD_NOT_FOUND";
    pub const WORKER_EXITED: &str = "WORKER_EXITED";
}

// ============================================================================
// Connection Parameters (included in all requests)
// ============================================================================

/// Database connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Database driver name (e.g., "mysql").
    pub driver: String,
    /// Driver-specific connection string.
    pub connection_string: String,
}

// ============================================================================
// Request Parameters
// ============================================================================

/// Parameters for `instance.ping`.
#[derive(Debug, Clone, Serialize)]
pub struct PingParams {
    #[serde(flatten)]
    pub connection: ConnectionParams,
}

/// Parameters for `schema.sync`.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSchemaParams {
    #[serde(flatten)]
    pub connection: ConnectionParams,
}

/// Parameters for `schema.list_databases`.
#[derive(Debug, Clone, Serialize)]
pub struct ListDatabasesParams {
    #[serde(flatten)]
    pub connection: ConnectionParams,
}

/// Parameters for `schema.list_tables`.
#[derive(Debug, Clone, Serialize)]
pub struct ListTablesParams {
    #[serde(flatten)]
    pub connection: ConnectionParams,
    /// Database whose tables are listed.
    pub database: String,
}

// ============================================================================
// Responses
// ============================================================================

/// Response for `instance.ping`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PingResponse {
    /// Server version string, if the driver reports one.
    #[serde(default)]
    pub server_version: Option<String>,
}

/// Response for `schema.sync`.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSchemaResponse {
    /// Every database with its tables.
    #[serde(default)]
    pub databases: Vec<LiveDatabase>,
}

/// A database without its tables.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseEntry {
    pub name: String,
    #[serde(default)]
    pub character_set: String,
    #[serde(default)]
    pub collation: String,
}

/// Response for `schema.list_databases`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListDatabasesResponse {
    #[serde(default)]
    pub databases: Vec<DatabaseEntry>,
}

/// Response for `schema.list_tables`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListTablesResponse {
    #[serde(default)]
    pub tables: Vec<LiveTable>,
}

impl From<DatabaseEntry> for LiveDatabase {
    fn from(entry: DatabaseEntry) -> Self {
        LiveDatabase {
            name: entry.name,
            character_set: entry.character_set,
            collation: entry.collation,
            tables: Vec::new(),
        }
    }
}

/// Method names understood by the worker.
pub mod methods {
    pub const PING: &str = "instance.ping";
    pub const SYNC_SCHEMA: &str = "schema.sync";
    pub const LIST_DATABASES: &str = "schema.list_databases";
    pub const LIST_TABLES: &str = "schema.list_tables";
}
