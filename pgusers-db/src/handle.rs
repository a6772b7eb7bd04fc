//! Connection handle: one sqlx pool plus the config it was opened from.

use sqlx::{Connection, PgConnection, PgPool};
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::error::{DbError, Result};

/// Owned handle to a PostgreSQL pool.
///
/// Gateways borrow the handle, so it cannot be closed while one is alive.
pub struct ConnectionHandle {
    pool: Option<PgPool>,
    config: ConnectionConfig,
}

impl ConnectionHandle {
    /// Validate `config`, open a pool and ping the server.
    ///
    /// The check runs on a dedicated connection rather than through the
    /// pool, so a refused or rejected login surfaces at once with its cause.
    ///
    /// # Errors
    ///
    /// `Configuration` if a field is missing (no network call is made),
    /// `Connection` if the server can't be reached or rejects the login.
    pub async fn connect(config: ConnectionConfig) -> Result<Self> {
        let pool = build_pool(&config)?;

        let mut conn = PgConnection::connect_with(&config.connect_options()?)
            .await
            .map_err(|e| DbError::connection("open connection to", format!("{:?}", config), e))?;
        conn.ping()
            .await
            .map_err(|e| DbError::connection("ping", format!("{:?}", config), e))?;
        conn.close()
            .await
            .map_err(|e| DbError::connection("release verification connection to", format!("{:?}", config), e))?;

        info!(database = %config.database, host = %config.host, "Successfully connected to database");
        Ok(Self {
            pool: Some(pool),
            config,
        })
    }

    /// Validate `config` and build the pool without touching the network.
    ///
    /// The first statement issued through the pool opens a connection.
    pub fn connect_lazy(config: ConnectionConfig) -> Result<Self> {
        let pool = build_pool(&config)?;
        Ok(Self {
            pool: Some(pool),
            config,
        })
    }

    /// Release all pooled connections.
    ///
    /// A no-op once the handle is closed.
    pub async fn close(&mut self) -> Result<()> {
        let Some(pool) = self.pool.take() else {
            debug!(database = %self.config.database, "Close on already closed handle");
            return Ok(());
        };

        tokio::time::timeout(self.config.close_timeout, pool.close())
            .await
            .map_err(|_| DbError::Close {
                database: self.config.database.clone(),
                reason: format!("pool not released within {:?}", self.config.close_timeout),
            })?;

        info!(database = %self.config.database, "Successfully closed connection to database");
        Ok(())
    }

    /// The pool, or `None` after [`close`](Self::close).
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.pool.is_some()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }
}

fn build_pool(config: &ConnectionConfig) -> Result<PgPool> {
    config.validate()?;
    let pool = config
        .pool_options()
        .connect_lazy_with(config.connect_options()?);
    debug!(database = %config.database, max = config.max_connections, "Pool created");
    Ok(pool)
}
