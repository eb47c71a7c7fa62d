//! Live schema snapshot types.
//!
//! A snapshot is produced fresh on every run and never persisted.

use serde::{Deserialize, Serialize};

/// Databases of one instance as read at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveSchemaSnapshot {
    /// Databases in the order the instance reported them.
    #[serde(default)]
    pub databases: Vec<LiveDatabase>,
}

impl LiveSchemaSnapshot {
    pub fn new(databases: Vec<LiveDatabase>) -> Self {
        Self { databases }
    }

    /// Find a database by exact name.
    pub fn database(&self, name: &str) -> Option<&LiveDatabase> {
        self.databases.iter().find(|db| db.name == name)
    }

    /// Whether a database with this exact name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.database(name).is_some()
    }

    /// Total number of tables across all databases.
    pub fn table_count(&self) -> usize {
        self.databases.iter().map(|db| db.tables.len()).sum()
    }
}

/// One logical database on the instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveDatabase {
    pub name: String,
    #[serde(default)]
    pub character_set: String,
    #[serde(default)]
    pub collation: String,
    #[serde(default)]
    pub tables: Vec<LiveTable>,
}

impl LiveDatabase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_charset(mut self, character_set: impl Into<String>, collation: impl Into<String>) -> Self {
        self.character_set = character_set.into();
        self.collation = collation.into();
        self
    }

    pub fn with_table(mut self, table: LiveTable) -> Self {
        self.tables.push(table);
        self
    }
}

/// Structural and statistical attributes of one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveTable {
    pub name: String,
    /// `BASE TABLE`, `VIEW`, ...
    #[serde(rename = "type", default)]
    pub table_type: String,
    #[serde(default)]
    pub engine: String,
    #[serde(default)]
    pub collation: String,
    #[serde(default)]
    pub row_count: i64,
    /// Bytes.
    #[serde(default)]
    pub data_size: i64,
    /// Bytes.
    #[serde(default)]
    pub index_size: i64,
    /// Allocated but unused bytes.
    #[serde(default)]
    pub data_free: i64,
    #[serde(default)]
    pub create_options: String,
    #[serde(default)]
    pub comment: String,
}

impl LiveTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_type: "BASE TABLE".to_string(),
            ..Default::default()
        }
    }
}
