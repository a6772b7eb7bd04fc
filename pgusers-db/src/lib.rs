//! pgusers-db: PostgreSQL access for the users/sessions/events schema
//!
//! A [`ConnectionHandle`] owns the sqlx pool. Table gateways borrow it,
//! create their table on construction and expose insert/lookup operations.
//!
//! ```ignore
//! let mut handle = ConnectionHandle::connect(config).await?;
//! {
//!     let users = UsersTable::new(&handle).await?;
//!     let alice = users.insert_user("alice", "secret").await?;
//! }
//! handle.close().await?;
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod handle;
pub mod tables;
pub mod validation;

pub use config::ConnectionConfig;
pub use error::{DbError, Result};
pub use gateway::{KeyedTable, Table, TableGateway};
pub use handle::ConnectionHandle;
pub use tables::{
    EventRow, Events, EventsTable, NewEvent, NewSession, NewUser, SessionRow, Sessions,
    SessionsTable, UserRow, Users, UsersTable,
};
pub use validation::ValidationError;
