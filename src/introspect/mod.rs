//! Live schema introspection.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     SchemaIntrospector                          │
//! │  - ping()               open a connection, check it answers     │
//! │  - list_databases()     databases without tables                │
//! │  - list_tables(db)      tables of one database                  │
//! │  - sync_schema()        full LiveSchemaSnapshot                 │
//! └─────────────────────────────────────────────────────────────────┘
//!            │                                   │
//!            ▼                                   ▼
//! ┌──────────────────────────┐      ┌──────────────────────────────┐
//! │ WorkerSchemaIntrospector │      │     StaticIntrospector       │
//! │  (NDJSON worker RPC)     │      │  (in-memory / JSON file)     │
//! └──────────────────────────┘      └──────────────────────────────┘
//! ```

mod fixed;
mod provider;
mod types;
mod worker_provider;

pub use fixed::StaticIntrospector;
pub use provider::{IntrospectError, IntrospectResult, SchemaIntrospector};
pub use types::{LiveDatabase, LiveSchemaSnapshot, LiveTable};
pub use worker_provider::WorkerSchemaIntrospector;
