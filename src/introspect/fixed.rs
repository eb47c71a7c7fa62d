//! Introspector serving a snapshot that is already in memory.

use std::path::Path;

use async_trait::async_trait;

use super::provider::{IntrospectError, IntrospectResult, SchemaIntrospector};
use super::types::{LiveDatabase, LiveSchemaSnapshot, LiveTable};

/// Serves a fixed snapshot. Used for offline runs (`sync --snapshot`) and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIntrospector {
    snapshot: LiveSchemaSnapshot,
}

impl StaticIntrospector {
    pub fn new(snapshot: LiveSchemaSnapshot) -> Self {
        Self { snapshot }
    }

    /// Load a JSON snapshot file.
    pub fn from_json_file(path: impl AsRef<Path>) -> IntrospectResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            IntrospectError::IntrospectionFailed(format!(
                "failed to read snapshot '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let snapshot: LiveSchemaSnapshot = serde_json::from_str(&content)?;
        Ok(Self::new(snapshot))
    }

    pub fn snapshot(&self) -> &LiveSchemaSnapshot {
        &self.snapshot
    }
}

#[async_trait]
impl SchemaIntrospector for StaticIntrospector {
    async fn ping(&self) -> IntrospectResult<()> {
        Ok(())
    }

    async fn list_databases(&self) -> IntrospectResult<Vec<LiveDatabase>> {
        Ok(self
            .snapshot
            .databases
            .iter()
            .map(|db| LiveDatabase {
                tables: Vec::new(),
                ..db.clone()
            })
            .collect())
    }

    async fn list_tables(&self, database: &str) -> IntrospectResult<Vec<LiveTable>> {
        self.snapshot
            .database(database)
            .map(|db| db.tables.clone())
            .ok_or_else(|| {
                IntrospectError::IntrospectionFailed(format!("unknown database: {}", database))
            })
    }
}
