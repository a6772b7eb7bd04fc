//! sessions table
//!
//! No foreign key to `users` is declared; a session may reference a user id
//! that does not exist.

use serde::Serialize;
use sqlx::FromRow;

use crate::error::Result;
use crate::gateway::{InsertQuery, KeyedTable, Table, TableGateway};
use crate::validation::{require, ValidationError};

/// Session record as persisted
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct SessionRow {
    pub id: String,
    pub active: bool,
    #[sqlx(rename = "userid")]
    pub user_id: String,
}

/// Fields for a new session
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: String,
    pub active: bool,
}

/// The `sessions` table
pub struct Sessions;

impl Table for Sessions {
    const NAME: &'static str = "sessions";

    const CREATE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id CHAR(36) PRIMARY KEY,
            active BOOLEAN NOT NULL,
            userid CHAR(36) NOT NULL
        )
    "#;

    const INSERT_COLUMNS: &'static [&'static str] = &["id", "active", "userid"];
    const COLUMNS: &'static [&'static str] = &["id", "active", "userid"];

    type Row = SessionRow;
    type New = NewSession;

    fn validate(new: &NewSession) -> std::result::Result<(), ValidationError> {
        require("user id", &new.user_id)
    }

    fn bind_insert<'q>(
        query: InsertQuery<'q, SessionRow>,
        new: &NewSession,
    ) -> InsertQuery<'q, SessionRow> {
        query.bind(new.active).bind(new.user_id.clone())
    }
}

impl KeyedTable for Sessions {
    const KEY_COLUMN: &'static str = "userid";
    const KEY_FIELD: &'static str = "user id";
}

pub type SessionsTable<'h> = TableGateway<'h, Sessions>;

impl TableGateway<'_, Sessions> {
    /// Store a session for `user_id`. Every call creates a new row.
    pub async fn insert_session(&self, user_id: &str, active: bool) -> Result<SessionRow> {
        self.insert(&NewSession {
            user_id: user_id.to_owned(),
            active,
        })
        .await
    }

    /// Every session stored for `user_id`, in arrival order.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<SessionRow>> {
        self.lookup_all(user_id).await
    }
}
