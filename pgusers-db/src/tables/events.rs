//! events table

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::error::Result;
use crate::gateway::{InsertQuery, KeyedTable, Table, TableGateway};
use crate::validation::{require, ValidationError};

/// Event record as persisted
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct EventRow {
    pub id: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    /// Filled in by the server on insert. The column is nullable, so rows
    /// written by other clients may carry `NULL`.
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub kind: String,
}

/// The `events` table
pub struct Events;

impl Table for Events {
    const NAME: &'static str = "events";

    const CREATE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS events (
            id CHAR(36) PRIMARY KEY,
            type TEXT NOT NULL,
            created_at TIMESTAMPTZ DEFAULT now()
        )
    "#;

    const INSERT_COLUMNS: &'static [&'static str] = &["id", "type"];
    const COLUMNS: &'static [&'static str] = &["id", "type", "created_at"];

    type Row = EventRow;
    type New = NewEvent;

    fn validate(new: &NewEvent) -> std::result::Result<(), ValidationError> {
        require("type", &new.kind)
    }

    fn bind_insert<'q>(query: InsertQuery<'q, EventRow>, new: &NewEvent) -> InsertQuery<'q, EventRow> {
        query.bind(new.kind.clone())
    }
}

impl KeyedTable for Events {
    const KEY_COLUMN: &'static str = "type";
    const KEY_FIELD: &'static str = "type";
}

pub type EventsTable<'h> = TableGateway<'h, Events>;

impl TableGateway<'_, Events> {
    pub async fn insert_event(&self, kind: &str) -> Result<EventRow> {
        self.insert(&NewEvent {
            kind: kind.to_owned(),
        })
        .await
    }

    /// Every event of type `kind`, in arrival order.
    pub async fn list_by_type(&self, kind: &str) -> Result<Vec<EventRow>> {
        self.lookup_all(kind).await
    }
}
