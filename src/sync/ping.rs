//! Connectivity check against a live instance.

use tracing::{debug, warn};

use super::SyncResultSet;
use crate::config::ConnectionConfig;
use crate::introspect::SchemaIntrospector;

/// Verify that the instance described by `config` accepts a connection.
///
/// Connection failures are reported with host, user and whether a password
/// was sent. Other failures carry the driver's message as is.
pub async fn ping<I>(config: &ConnectionConfig, introspector: &I) -> SyncResultSet
where
    I: SchemaIntrospector + ?Sized,
{
    debug!(host = %config.host_port(), user = %config.username, "pinging instance");

    match introspector.ping().await {
        Ok(()) => SyncResultSet::ok(),
        Err(e) if e.is_connection_failure() => {
            warn!(host = %config.host_port(), error = %e, "ping failed");
            SyncResultSet::failed(format!(
                "failed to connect '{}' for user '{}' (using password: {}), {}",
                config.host_port(),
                config.username,
                if config.uses_password() { "YES" } else { "NO" },
                e
            ))
        }
        Err(e) => {
            warn!(host = %config.host_port(), error = %e, "ping failed");
            SyncResultSet::failed(e.to_string())
        }
    }
}
