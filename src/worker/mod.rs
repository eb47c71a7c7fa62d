//! Worker communication module.
//!
//! This module provides async communication with the introspection worker
//! process. The worker owns the database drivers: it opens connections to
//! live instances and reads their schema, while this crate stays
//! driver-agnostic.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   schemasync (Rust + Tokio)                     │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │                    WorkerClient (Async)                   │  │
//! │  │  - Spawns the worker as child process                     │  │
//! │  │  - NDJSON protocol over stdin/stdout                      │  │
//! │  │  - Request IDs for concurrent request correlation         │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │                              │                                   │
//! │               stdin (NDJSON) │ stdout (NDJSON)                  │
//! │                              ▼                                   │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            Introspection Worker (Long-Running Child)            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use schemasync::worker::{WorkerClient, protocol::*};
//!
//! let client = WorkerClient::spawn("./schemasync-worker").await?;
//!
//! let snapshot: SyncSchemaResponse = client.request(
//!     methods::SYNC_SCHEMA,
//!     SyncSchemaParams {
//!         connection: ConnectionParams {
//!             driver: "mysql".to_string(),
//!             connection_string: "mysql://root@localhost:3306/".to_string(),
//!         },
//!     }
//! ).await?;
//! ```

mod client;
mod error;
pub mod protocol;

pub use client::WorkerClient;
pub use error::{WorkerError, WorkerResult};
