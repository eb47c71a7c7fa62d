//! Outcome of a run as reported to callers.

use std::fmt;

use serde::Serialize;

/// Result set returned to the caller of a sync or ping.
///
/// An empty `error` means success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncResultSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncResultSet {
    pub fn ok() -> Self {
        Self { error: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for SyncResultSet {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(_) => SyncResultSet::ok(),
            Err(e) => SyncResultSet::failed(e.to_string()),
        }
    }
}

/// Counts of catalog writes made by one successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub databases_created: usize,
    pub databases_refreshed: usize,
    pub databases_missing: usize,
    pub tables_created: usize,
    pub tables_refreshed: usize,
    /// Live databases skipped because they carry the reserved name.
    pub reserved_skipped: usize,
}

impl SyncSummary {
    /// Total catalog writes.
    pub fn writes(&self) -> usize {
        self.databases_created
            + self.databases_refreshed
            + self.databases_missing
            + self.tables_created
            + self.tables_refreshed
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "databases: {} created, {} refreshed, {} not found; tables: {} created, {} refreshed",
            self.databases_created,
            self.databases_refreshed,
            self.databases_missing,
            self.tables_created,
            self.tables_refreshed
        )
    }
}
