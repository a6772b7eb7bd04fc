//! Generic table gateway
//!
//! A [`Table`] describes one relational table: its name, DDL, column lists
//! and row codec. [`TableGateway`] runs the shared create/insert/lookup
//! pattern for any such table over a borrowed pool.
//!
//! Patterns:
//! - DDL is `CREATE TABLE IF NOT EXISTS` (idempotent)
//! - ids are generated client-side (UUIDv4), never by a sequence
//! - inserts use `RETURNING` so the caller sees what was persisted
//! - lookups stream the cursor; it is released on every exit path

use std::fmt;
use std::marker::PhantomData;

use futures::{Stream, TryStreamExt};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgPool, Postgres};
use tracing::debug;
use uuid::Uuid;

use crate::error::{is_already_exists, DbError, Result};
use crate::handle::ConnectionHandle;
use crate::validation::{self, ValidationError};

/// Insert statement with the generated id already bound
pub type InsertQuery<'q, R> = QueryAs<'q, Postgres, R, PgArguments>;

/// Description of one table handled by a [`TableGateway`]
pub trait Table {
    /// Table name
    const NAME: &'static str;

    /// `CREATE TABLE IF NOT EXISTS ...`
    const CREATE: &'static str;

    /// Columns written on insert, in bind order. Must start with `id`.
    const INSERT_COLUMNS: &'static [&'static str];

    /// Columns returned by insert and selected by lookups, in row order
    const COLUMNS: &'static [&'static str];

    /// Decoded row
    type Row: for<'r> FromRow<'r, PgRow> + Send + Unpin;

    /// Fields supplied by the caller on insert
    type New: fmt::Debug + Send + Sync;

    /// Reject unusable insert fields before any database call.
    fn validate(new: &Self::New) -> std::result::Result<(), ValidationError>;

    /// Bind the caller's fields after the id, matching `INSERT_COLUMNS[1..]`.
    fn bind_insert<'q>(query: InsertQuery<'q, Self::Row>, new: &Self::New) -> InsertQuery<'q, Self::Row>;

    fn insert_sql() -> String {
        let placeholders: Vec<String> = (1..=Self::INSERT_COLUMNS.len())
            .map(|i| format!("${i}"))
            .collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            Self::NAME,
            Self::INSERT_COLUMNS.join(", "),
            placeholders.join(", "),
            Self::COLUMNS.join(", ")
        )
    }
}

/// A table that can be looked up by one text column
pub trait KeyedTable: Table {
    /// Column filtered on by lookups
    const KEY_COLUMN: &'static str;

    /// Name used in validation errors for an empty key
    const KEY_FIELD: &'static str;

    fn lookup_sql() -> String {
        format!(
            "SELECT {} FROM {} WHERE {} = $1",
            Self::COLUMNS.join(", "),
            Self::NAME,
            Self::KEY_COLUMN
        )
    }
}

/// Gateway scoped to one table, borrowing the handle's pool
pub struct TableGateway<'h, T: Table> {
    pool: &'h PgPool,
    insert_sql: String,
    _table: PhantomData<fn() -> T>,
}

impl<'h, T: Table> TableGateway<'h, T> {
    /// Attach to `handle` and make sure the table exists.
    ///
    /// # Errors
    ///
    /// `Configuration` if the handle is closed, `Schema` if the DDL fails
    /// for any reason other than the table already existing.
    pub async fn new(handle: &'h ConnectionHandle) -> Result<Self> {
        let pool = handle.pool().ok_or_else(|| {
            DbError::configuration(
                format!("Can't create {} table without an open connection handle", T::NAME),
                format!("{:?}", handle.config()),
            )
        })?;

        let gateway = Self::attach(pool);
        gateway.create_table().await?;
        Ok(gateway)
    }

    pub(crate) fn attach(pool: &'h PgPool) -> Self {
        Self {
            pool,
            insert_sql: T::insert_sql(),
            _table: PhantomData,
        }
    }

    /// Run the idempotent DDL. Safe to call any number of times.
    pub async fn create_table(&self) -> Result<()> {
        match sqlx::query(T::CREATE).execute(self.pool).await {
            Ok(_) => {
                debug!(table = T::NAME, "Table ready");
                Ok(())
            }
            Err(e) if is_already_exists(&e) => {
                debug!(table = T::NAME, "Table created concurrently, treating as ready");
                Ok(())
            }
            Err(source) => Err(DbError::Schema {
                table: T::NAME,
                source,
            }),
        }
    }

    /// Insert a row with a freshly generated id and return it as persisted.
    pub async fn insert(&self, new: &T::New) -> Result<T::Row> {
        T::validate(new)?;

        let id = Uuid::new_v4().to_string();
        let query = sqlx::query_as::<_, T::Row>(&self.insert_sql).bind(id.clone());

        let row = T::bind_insert(query, new)
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                DbError::storage(
                    format!("Insert into {}", T::NAME),
                    format!("{:?}", new),
                    e,
                )
            })?;

        debug!(table = T::NAME, %id, "Row inserted");
        Ok(row)
    }
}

impl<'h, T: KeyedTable> TableGateway<'h, T> {
    /// All rows matching `key`, in arrival order.
    pub async fn lookup_all(&self, key: &str) -> Result<Vec<T::Row>> {
        validation::require(T::KEY_FIELD, key)?;

        let sql = T::lookup_sql();
        let mut rows = sqlx::query(&sql).bind(key).fetch(self.pool);

        let mut found = Vec::new();
        while let Some(row) = Self::next_row(&mut rows, key).await? {
            found.push(row);
        }

        debug!(table = T::NAME, key, count = found.len(), "Lookup complete");
        Ok(found)
    }

    /// The row matching `key`, if any.
    ///
    /// # Errors
    ///
    /// `MultipleRows` as soon as a second matching row arrives.
    pub async fn lookup_one(&self, key: &str) -> Result<Option<T::Row>> {
        validation::require(T::KEY_FIELD, key)?;

        let sql = T::lookup_sql();
        let mut rows = sqlx::query(&sql).bind(key).fetch(self.pool);

        let Some(first) = Self::next_row(&mut rows, key).await? else {
            return Ok(None);
        };
        if Self::next_row(&mut rows, key).await?.is_some() {
            return Err(DbError::MultipleRows {
                table: T::NAME,
                column: T::KEY_COLUMN,
                key: key.to_owned(),
            });
        }

        Ok(Some(first))
    }

    async fn next_row<S>(rows: &mut S, key: &str) -> Result<Option<T::Row>>
    where
        S: Stream<Item = std::result::Result<PgRow, sqlx::Error>> + Unpin,
    {
        let context = || format!("{}={}", T::KEY_COLUMN, key);

        let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| DbError::storage(format!("Listing {}", T::NAME), context(), e))?
        else {
            return Ok(None);
        };

        <T::Row as FromRow<'_, PgRow>>::from_row(&row)
            .map(Some)
            .map_err(|e| DbError::storage(format!("Scanning {} row", T::NAME), context(), e))
    }
}
