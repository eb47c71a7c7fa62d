//! Sync error taxonomy.

use std::fmt;

use crate::catalog::{CatalogError, EntityKind};
use crate::introspect::IntrospectError;

/// Where in the instance a failure happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub instance: String,
    pub database: Option<String>,
}

impl Scope {
    pub fn instance(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            database: None,
        }
    }

    pub fn database(instance: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            database: Some(database.into()),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance: {}", self.instance)?;
        if let Some(database) = &self.database {
            write!(f, ", database: {}", database)?;
        }
        Ok(())
    }
}

/// The first failure of a run. The run stops here; earlier writes stay.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Instance unreachable or credentials rejected. Catalog untouched.
    #[error("failed to connect instance: {instance} with user: {username}. Error {source}")]
    Connection {
        instance: String,
        username: String,
        #[source]
        source: IntrospectError,
    },

    /// Live schema could not be read. Catalog untouched.
    #[error("failed to read schema for instance: {instance}. Error {source}")]
    Introspection {
        instance: String,
        #[source]
        source: IntrospectError,
    },

    /// A create hit an existing unique key.
    #[error("failed to sync {entity} for {scope}. {} name already exists: {name}", .entity.title())]
    Conflict {
        entity: EntityKind,
        scope: Scope,
        name: String,
    },

    /// A patch target vanished between read and write.
    #[error("failed to sync {entity} for {scope}. {} not found: {name}", .entity.title())]
    CatalogNotFound {
        entity: EntityKind,
        scope: Scope,
        name: String,
    },

    /// The catalog failed for infrastructure reasons.
    #[error("failed to sync {entity} for {scope}. Failed to {action}. Error {source}")]
    Persistence {
        entity: EntityKind,
        scope: Scope,
        action: String,
        #[source]
        source: CatalogError,
    },
}

/// Tag of a [`SyncError`] for exhaustive matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorKind {
    Connection,
    Introspection,
    Conflict,
    CatalogNotFound,
    Persistence,
}

impl SyncError {
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            SyncError::Connection { .. } => SyncErrorKind::Connection,
            SyncError::Introspection { .. } => SyncErrorKind::Introspection,
            SyncError::Conflict { .. } => SyncErrorKind::Conflict,
            SyncError::CatalogNotFound { .. } => SyncErrorKind::CatalogNotFound,
            SyncError::Persistence { .. } => SyncErrorKind::Persistence,
        }
    }

    /// Classify a failed schema read.
    ///
    /// Transport and connection failures mean the instance was never reached.
    pub fn from_introspection(
        instance: &str,
        username: &str,
        source: IntrospectError,
    ) -> Self {
        if source.is_connection_failure() {
            SyncError::Connection {
                instance: instance.to_string(),
                username: username.to_string(),
                source,
            }
        } else {
            SyncError::Introspection {
                instance: instance.to_string(),
                source,
            }
        }
    }

    /// Wrap a catalog failure with the context of the entity being synced.
    ///
    /// `name` is the entity the reconciler was working on. When the catalog
    /// reports the owning database missing instead, the database name is used.
    pub fn from_catalog(
        entity: EntityKind,
        scope: Scope,
        name: &str,
        action: impl Into<String>,
        source: CatalogError,
    ) -> Self {
        match source {
            CatalogError::Conflict { .. } => SyncError::Conflict {
                entity,
                scope,
                name: name.to_string(),
            },
            CatalogError::NotFound {
                entity: missing, ..
            } => {
                let name = match (&scope.database, missing) {
                    (Some(database), EntityKind::Database) if entity == EntityKind::Table => {
                        database.clone()
                    }
                    _ => name.to_string(),
                };
                SyncError::CatalogNotFound {
                    entity: missing,
                    scope,
                    name,
                }
            }
            source => SyncError::Persistence {
                entity,
                scope,
                action: action.into(),
                source,
            },
        }
    }
}
