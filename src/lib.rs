//! # schemasync
//!
//! Keeps a persisted catalog of databases and tables in step with what live
//! database instances actually contain.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐        ┌──────────────────────────┐
//! │  Live instance (MySQL)   │        │  Catalog (SQLite)        │
//! └──────────────────────────┘        └──────────────────────────┘
//!              │                                    ▲
//!              ▼ [worker, NDJSON]                   │ find / create / patch
//! ┌──────────────────────────┐                      │
//! │  SchemaIntrospector      │                      │
//! │  (LiveSchemaSnapshot)    │                      │
//! └──────────────────────────┘                      │
//!              │                                    │
//!              ▼                                    │
//! ┌─────────────────────────────────────────────────┴────────┐
//! │  Reconciler: match by name, create, refresh, NOT_FOUND   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`introspect`] reads the live schema.
//! - [`catalog`] persists what has been seen.
//! - [`sync`] reconciles one against the other.
//! - [`config`] resolves instances, catalog location and worker settings.
//! - [`worker`] talks to the out-of-process driver.

pub mod catalog;
pub mod config;
pub mod introspect;
pub mod sync;
pub mod worker;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{Catalog, CatalogError, SqliteCatalog, SyncStatus};
    pub use crate::config::{ConnectionConfig, Settings};
    pub use crate::introspect::{
        LiveDatabase, LiveSchemaSnapshot, LiveTable, SchemaIntrospector, StaticIntrospector,
    };
    pub use crate::sync::{Instance, Reconciler, SyncError, SyncOptions, SyncResultSet};
}
