//! Table definitions
//!
//! Each module describes one table for the generic gateway and adds a few
//! typed helpers on top of it.

pub mod events;
pub mod sessions;
pub mod users;

pub use events::{EventRow, Events, EventsTable, NewEvent};
pub use sessions::{NewSession, SessionRow, Sessions, SessionsTable};
pub use users::{NewUser, UserRow, Users, UsersTable};
