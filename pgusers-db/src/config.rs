//! Connection configuration
//!
//! Five required fields plus pool tuning. The password never shows up in
//! `Debug` output, which is what error messages embed.

use std::fmt;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::error::{DbError, Result};

/// Default maximum connections for the pool.
/// Kept low: the binary issues statements one at a time.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default time to wait for a pooled connection (including the first connect)
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time allowed for releasing the pool on close
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Database connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub close_timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(
        host: impl Into<String>,
        port: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Check that every required field is set and the port is numeric.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("host", &self.host),
            ("port", &self.port),
            ("user", &self.user),
            ("password", &self.password),
            ("database", &self.database),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(DbError::configuration(
                format!("All fields must be set, missing: {}", missing.join(", ")),
                format!("{:?}", self),
            ));
        }

        self.port_number()?;
        Ok(())
    }

    /// Driver connect options assembled from the five fields.
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port_number()?)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database))
    }

    pub(crate) fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
    }

    fn port_number(&self) -> Result<u16> {
        self.port.parse().map_err(|_| {
            DbError::configuration(
                format!("Port '{}' is not a valid TCP port", self.port),
                format!("{:?}", self),
            )
        })
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_empty() { "" } else { "***" };
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &password)
            .field("database", &self.database)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ConnectionConfig {
        ConnectionConfig::new("localhost", "5432", "postgres", "secret", "pgusers")
    }

    #[test]
    fn complete_config_validates() {
        assert!(complete().validate().is_ok());
    }

    #[test]
    fn each_missing_field_is_a_configuration_error() {
        let blank: [fn(&mut ConnectionConfig); 5] = [
            |c| c.host.clear(),
            |c| c.port.clear(),
            |c| c.user.clear(),
            |c| c.password.clear(),
            |c| c.database.clear(),
        ];

        for (clear, field) in blank
            .iter()
            .zip(["host", "port", "user", "password", "database"])
        {
            let mut config = complete();
            clear(&mut config);
            let err = config.validate().unwrap_err();
            assert!(matches!(err, DbError::Configuration { .. }), "{field}");
            assert!(err.to_string().contains(&format!("missing: {field}")));
        }
    }

    #[test]
    fn lists_all_missing_fields() {
        let err = ConnectionConfig::new("", "5432", "", "x", "db")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("missing: host, user"));
    }

    #[test]
    fn non_numeric_port_rejected() {
        let mut config = complete();
        config.port = "postgres".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("not a valid TCP port"));
    }

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", complete());
        assert!(rendered.contains("***"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("pgusers"));
    }

    #[test]
    fn defaults_and_builders() {
        let config = complete()
            .with_max_connections(2)
            .with_close_timeout(Duration::from_millis(50));
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.acquire_timeout, DEFAULT_ACQUIRE_TIMEOUT);
        assert_eq!(config.close_timeout, Duration::from_millis(50));
    }

    #[test]
    fn connect_options_carry_fields() {
        let options = complete().connect_options().unwrap();
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_username(), "postgres");
        assert_eq!(options.get_database(), Some("pgusers"));
    }
}
