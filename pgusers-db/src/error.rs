//! Structured error types for pgusers-db.
//!
//! Every variant names the failed operation and the data involved.
//! Driver errors are kept as the error source so callers (and `anyhow`
//! chains in the binary) see the full cause.

use thiserror::Error;

use crate::validation::ValidationError;

/// Postgres error code for `duplicate_table`
const DUPLICATE_TABLE: &str = "42P07";

/// Postgres error code for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

/// Main error type for pgusers-db operations
#[derive(Error, Debug)]
pub enum DbError {
    /// Required configuration missing or malformed, or the handle is closed
    #[error("Configuration error: {reason} ({config})")]
    Configuration { reason: String, config: String },

    /// Opening or pinging the database failed
    #[error("Couldn't {operation} postgres database ({config}): {source}")]
    Connection {
        operation: &'static str,
        config: String,
        #[source]
        source: sqlx::Error,
    },

    /// Releasing the pool did not complete
    #[error("Errored closing database connection to {database}: {reason}")]
    Close { database: String, reason: String },

    /// Table creation failed for a reason other than "already exists"
    #[error("{table} table creation query failed: {source}")]
    Schema {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Insert fields or lookup key rejected before any database call
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Insert, select or row decode failed
    #[error("{operation} failed ({data}): {source}")]
    Storage {
        operation: String,
        data: String,
        #[source]
        source: sqlx::Error,
    },

    /// A single-row lookup matched more than one row
    #[error("Expected at most one row in {table} for {column} = '{key}', found several")]
    MultipleRows {
        table: &'static str,
        column: &'static str,
        key: String,
    },
}

/// Result type alias for pgusers-db operations
pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    /// Create a configuration error
    pub fn configuration(reason: impl Into<String>, config: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
            config: config.into(),
        }
    }

    /// Create a connection error for `operation` ("open", "ping")
    pub fn connection(operation: &'static str, config: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Connection {
            operation,
            config: config.into(),
            source,
        }
    }

    /// Create a storage error with the offending data
    pub fn storage(operation: impl Into<String>, data: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Storage {
            operation: operation.into(),
            data: data.into(),
            source,
        }
    }

    /// True for a storage error caused by a unique constraint (e.g. duplicate username)
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Storage { source, .. } => sqlx_code(source) == Some(UNIQUE_VIOLATION),
            _ => false,
        }
    }
}

/// Whether a DDL failure only means the table is already there.
///
/// Two concurrent `CREATE TABLE IF NOT EXISTS` can still collide on the
/// catalog's unique index, which surfaces as `unique_violation`.
pub(crate) fn is_already_exists(err: &sqlx::Error) -> bool {
    matches!(sqlx_code(err), Some(DUPLICATE_TABLE) | Some(UNIQUE_VIOLATION))
}

fn sqlx_code(err: &sqlx::Error) -> Option<&'static str> {
    let sqlx::Error::Database(db) = err else {
        return None;
    };
    match db.code().as_deref() {
        Some(DUPLICATE_TABLE) => Some(DUPLICATE_TABLE),
        Some(UNIQUE_VIOLATION) => Some(UNIQUE_VIOLATION),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::configuration("All fields must be set, missing: host", "cfg");
        assert_eq!(
            err.to_string(),
            "Configuration error: All fields must be set, missing: host (cfg)"
        );

        let err = DbError::MultipleRows {
            table: "users",
            column: "username",
            key: "alice".into(),
        };
        assert!(err.to_string().contains("username = 'alice'"));
    }

    #[test]
    fn test_validation_conversion() {
        let err: DbError = ValidationError::Empty { field: "password" }.into();
        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(err.to_string(), "Validation error: password cannot be empty");
    }

    #[test]
    fn test_non_database_errors_are_not_constraint_errors() {
        let err = DbError::storage("insert into users", "alice", sqlx::Error::RowNotFound);
        assert!(!err.is_unique_violation());
        assert!(!is_already_exists(&sqlx::Error::PoolTimedOut));
    }
}
