//! Instance connection configuration.
//!
//! Supports configuration via environment variables:
//! - `SCHEMASYNC_DB_DRIVER`: Database driver (mysql, postgres)
//! - `SCHEMASYNC_DB_HOST`: Database server hostname
//! - `SCHEMASYNC_DB_PORT`: Port (optional, uses driver default)
//! - `SCHEMASYNC_DB_USER`: Username
//! - `SCHEMASYNC_DB_PASSWORD`: Password (optional)

use std::env;
use std::fmt;

/// Error type for connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported driver: {0}. Supported: mysql, postgres")]
    UnsupportedDriver(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// MySQL and wire-compatible servers (TiDB, MariaDB)
    MySql,
    /// PostgreSQL
    Postgres,
}

impl Driver {
    /// Parse driver from string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConnectionError> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" | "tidb" => Ok(Driver::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Driver::Postgres),
            other => Err(ConnectionError::UnsupportedDriver(other.to_string())),
        }
    }

    /// Get the driver name for the worker.
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::MySql => "mysql",
            Driver::Postgres => "postgres",
        }
    }

    /// Get the default port for this driver.
    pub fn default_port(&self) -> u16 {
        match self {
            Driver::MySql => 3306,
            Driver::Postgres => 5432,
        }
    }
}

/// Connection parameters for one live instance.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Database driver.
    pub driver: Driver,
    /// Server hostname.
    pub host: String,
    /// Port (optional).
    pub port: Option<u16>,
    /// Login user.
    pub username: String,
    /// Login password. Empty means no password is sent.
    pub password: String,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &if self.uses_password() { "***" } else { "" })
            .finish()
    }
}

impl ConnectionConfig {
    /// Create a new MySQL connection config.
    pub fn mysql(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            driver: Driver::MySql,
            host: host.into(),
            port: None,
            username: username.into(),
            password: password.into(),
        }
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `SCHEMASYNC_DB_DRIVER`: mysql or postgres
    /// - `SCHEMASYNC_DB_HOST`: Server hostname
    /// - `SCHEMASYNC_DB_USER`: Username
    ///
    /// Optional:
    /// - `SCHEMASYNC_DB_PORT`: Server port
    /// - `SCHEMASYNC_DB_PASSWORD`: Password
    pub fn from_env() -> Result<Self, ConnectionError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from `SCHEMASYNC_DB_*` keys resolved by `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConnectionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| ConnectionError::MissingEnvVar(key.to_string()))
        };

        let driver = Driver::from_str(&required("SCHEMASYNC_DB_DRIVER")?)?;
        let host = required("SCHEMASYNC_DB_HOST")?;
        let username = required("SCHEMASYNC_DB_USER")?;

        let port = match lookup("SCHEMASYNC_DB_PORT") {
            Some(p) => Some(p.parse().map_err(|_| {
                ConnectionError::InvalidConfig(format!("SCHEMASYNC_DB_PORT is not a port: {}", p))
            })?),
            None => None,
        };

        let password = lookup("SCHEMASYNC_DB_PASSWORD").unwrap_or_default();

        Ok(Self {
            driver,
            host,
            port,
            username,
            password,
        })
    }

    /// The port the worker will dial.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.driver.default_port())
    }

    /// `host` or `host:port` as the user configured it.
    pub fn host_port(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// Whether a password will be sent on connect.
    pub fn uses_password(&self) -> bool {
        !self.password.is_empty()
    }

    /// Build the connection string for the worker.
    ///
    /// User and password are percent-encoded so reserved characters stay
    /// inside the userinfo.
    pub fn to_connection_string(&self) -> String {
        let user = urlencoding::encode(&self.username);
        let auth = if self.uses_password() {
            format!("{}:{}", user, urlencoding::encode(&self.password))
        } else {
            user.into_owned()
        };
        format!(
            "{}://{}@{}:{}/",
            self.driver.as_str(),
            auth,
            self.host,
            self.effective_port()
        )
    }

    /// Get the driver name for the worker.
    pub fn driver_name(&self) -> &'static str {
        self.driver.as_str()
    }
}
