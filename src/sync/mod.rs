//! Schema synchronization.
//!
//! One run reads the live schema of an instance once, loads the instance's
//! catalog databases once, and drives the catalog toward the snapshot:
//!
//! ```text
//!   live ∩ catalog (by name)  ──►  patch OK + timestamp, then sync tables
//!   live only                 ──►  create database + every table
//!   catalog only              ──►  patch NOT_FOUND + timestamp (tables untouched)
//! ```
//!
//! The first failing catalog call ends the run. Writes made before it stay.
//! Runs for the same instance must be serialized by the caller; see
//! [`InstanceLocks`].

mod error;
mod lock;
mod ping;
mod reconciler;
mod result;

pub use error::{Scope, SyncError, SyncErrorKind};
pub use lock::InstanceLocks;
pub use ping::ping;
pub use reconciler::{Reconciler, SyncOptions};
pub use result::{SyncResultSet, SyncSummary};

use crate::catalog::InstanceId;
use crate::config::ConnectionConfig;

/// Name of the internal database every run skips.
pub const DEFAULT_RESERVED_DATABASE: &str = "schemasync";

/// A live instance as the reconciler sees it.
#[derive(Debug, Clone)]
pub struct Instance {
    pub id: InstanceId,
    pub name: String,
    pub connection: ConnectionConfig,
}

/// Whether `name` is the reserved internal database, ignoring case.
pub fn is_reserved_database(name: &str, reserved: &str) -> bool {
    name.eq_ignore_ascii_case(reserved)
}
