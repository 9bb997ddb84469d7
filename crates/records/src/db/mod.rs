//! Storage port and its adapters.
//!
//! The record writer and the soft-delete model only ever talk to a
//! [`RowStore`]. Rows cross that boundary as column-keyed JSON objects whose
//! values are already normalised (integers, strings, two-place decimal
//! strings, booleans, null).
//!
//! # Adapters
//!
//! - [`postgres::PgStore`] - `PostgreSQL` through sqlx, SQL built from [`Schema`]
//! - [`memory::MemoryStore`] - in-process tables with the same key and
//!   foreign-key behaviour, for tests and embedding
//!
//! # Tables
//!
//! `PgStore::create_tables` provisions the six tables from the static schema:
//! ```bash
//! cargo run -p wepay-records-cli -- init-db
//! ```

pub mod filter;
pub mod memory;
pub mod postgres;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use serde_json::{Map, Value};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::schema::Schema;

pub use filter::{DeletedScope, Filter};
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A stored row, keyed by column name.
pub type Row = Map<String, Value>;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (duplicate primary key, dangling or still
    /// referenced foreign key).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A payload or filter value does not fit its column.
    #[error("invalid value for {table}.{field}: {reason}")]
    InvalidValue {
        /// Table being written.
        table: &'static str,
        /// Offending field.
        field: String,
        /// What is wrong with the value.
        reason: String,
    },

    /// A payload does not describe a complete record.
    #[error("invalid {table} record: {reason}")]
    InvalidRecord {
        /// Table being written.
        table: &'static str,
        /// Why the record was rejected.
        reason: String,
    },

    /// A filter named a column the table does not declare.
    #[error("unknown column {table}.{column}")]
    UnknownColumn {
        /// Table being queried.
        table: &'static str,
        /// The undeclared column.
        column: String,
    },
}

/// Row-level storage used by the record writer and the soft-delete model.
///
/// Implementations keep rows ordered by primary key, reject duplicate primary
/// keys, reject references to missing rows, and on delete either refuse
/// (non-null references) or null out (nullable references) rows that still
/// point at the removed row.
pub trait RowStore: Send + Sync {
    /// Insert a new row and return it as stored.
    ///
    /// A null primary key on a table with a store-assigned id is replaced
    /// by the next id.
    fn insert(
        &self,
        schema: &'static Schema,
        row: Row,
    ) -> impl Future<Output = Result<Row, RepositoryError>> + Send;

    /// Overwrite the row with the same primary key, or insert it if absent.
    fn save(
        &self,
        schema: &'static Schema,
        row: Row,
    ) -> impl Future<Output = Result<Row, RepositoryError>> + Send;

    /// Rows matching `filter`, ordered by primary key.
    ///
    /// An unset deleted scope matches rows in either state.
    fn select(
        &self,
        schema: &'static Schema,
        filter: &Filter,
    ) -> impl Future<Output = Result<Vec<Row>, RepositoryError>> + Send;

    /// Apply `changes` to every row matching `filter`; returns the count.
    fn update_where(
        &self,
        schema: &'static Schema,
        filter: &Filter,
        changes: &Row,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    /// Physically remove the row with primary key `pk`; returns the count.
    fn delete(
        &self,
        schema: &'static Schema,
        pk: i64,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;
}

/// Primary key of a row, if set.
#[must_use]
pub fn primary_key(schema: &Schema, row: &Row) -> Option<i64> {
    row.get(schema.primary_key).and_then(Value::as_i64)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
