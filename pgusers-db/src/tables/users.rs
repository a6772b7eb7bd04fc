//! users table
//!
//! Passwords are stored as given (plaintext). Callers that need real
//! credentials must hash before calling [`UsersTable::insert_user`].

use std::fmt;

use serde::Serialize;
use sqlx::FromRow;

use crate::error::Result;
use crate::gateway::{InsertQuery, KeyedTable, Table, TableGateway};
use crate::validation::{require, ValidationError};

/// User record as persisted
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// Fields for a new user
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// The `users` table
pub struct Users;

impl Table for Users {
    const NAME: &'static str = "users";

    const CREATE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS users (
            id CHAR(36) PRIMARY KEY,
            password VARCHAR(64) NOT NULL,
            username VARCHAR(100) UNIQUE NOT NULL
        )
    "#;

    const INSERT_COLUMNS: &'static [&'static str] = &["id", "username", "password"];
    const COLUMNS: &'static [&'static str] = &["id", "username", "password"];

    type Row = UserRow;
    type New = NewUser;

    fn validate(new: &NewUser) -> std::result::Result<(), ValidationError> {
        require("username", &new.username)?;
        require("password", &new.password)
    }

    fn bind_insert<'q>(query: InsertQuery<'q, UserRow>, new: &NewUser) -> InsertQuery<'q, UserRow> {
        query.bind(new.username.clone()).bind(new.password.clone())
    }
}

impl KeyedTable for Users {
    const KEY_COLUMN: &'static str = "username";
    const KEY_FIELD: &'static str = "username";
}

pub type UsersTable<'h> = TableGateway<'h, Users>;

impl TableGateway<'_, Users> {
    /// Insert a user. A taken username fails with a storage error
    /// (`is_unique_violation()`), not a validation error.
    pub async fn insert_user(&self, username: &str, password: &str) -> Result<UserRow> {
        self.insert(&NewUser {
            username: username.to_owned(),
            password: password.to_owned(),
        })
        .await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.lookup_one(username).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::testing::offline_handle;
    use crate::DbError;

    #[tokio::test]
    async fn empty_username_or_password_rejected_without_database_call() {
        let handle = offline_handle();
        let users = UsersTable::attach(handle.pool().unwrap());

        let err = users.insert_user("", "secret").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::Empty { field: "username" })
        ));

        let err = users.insert_user("alice", "").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::Empty { field: "password" })
        ));
    }

    #[tokio::test]
    async fn empty_lookup_key_rejected() {
        let handle = offline_handle();
        let users = UsersTable::attach(handle.pool().unwrap());

        let err = users.get_by_username("").await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn closed_handle_is_configuration_error() {
        let mut handle = offline_handle();
        handle.close().await.unwrap();

        let err = UsersTable::new(&handle)
            .await
            .err()
            .expect("closed handle must be rejected");
        assert!(matches!(err, DbError::Configuration { .. }));
        assert!(err.to_string().contains("users"));
    }

    #[test]
    fn new_user_debug_hides_password() {
        let new = NewUser {
            username: "alice".into(),
            password: "secret".into(),
        };
        let rendered = format!("{:?}", new);
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn serialized_user_omits_password() {
        let row = UserRow {
            id: "00000000-0000-0000-0000-000000000000".into(),
            username: "alice".into(),
            password: "secret".into(),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["username"], "alice");
        assert!(json.get("password").is_none());
    }
}
