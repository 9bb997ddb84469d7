//! WePay Records - soft-deleting persistence for WePay API objects.
//!
//! Stores users, accounts, preapprovals, checkouts, withdrawals and shipping
//! addresses as they come back from the WePay API:
//! - payload keys the tables do not declare are dropped, and bounded strings
//!   are cut to their column length instead of failing the write
//! - reads exclude soft-deleted rows unless a filter asks for them
//! - deleting a user or account deletes what it owns, softly or for good
//!   depending on [`RecordsConfig`]
//! - a record can be revived by writing its payload again
//!
//! # Architecture
//!
//! [`Records`] pairs a [`RowStore`] with a [`RecordsConfig`]. Typed access goes
//! through [`Records::objects`], which hands out a [`Manager`] per entity.
//! Table shapes live in [`schema`] as static declarations shared by both
//! stores:
//! - [`PgStore`] - `PostgreSQL` via sqlx
//! - [`MemoryStore`] - in-process, same key and foreign-key rules
//!
//! # Modules
//!
//! - [`schema`] - Table declarations and DDL
//! - [`payload`] - Whitelisting, truncation and value normalisation
//! - [`models`] - Typed records
//! - [`db`] - Storage port, filters and adapters
//! - [`config`] - Environment configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

mod cascade;
pub mod config;
pub mod db;
mod manager;
pub mod models;
pub mod payload;
mod records;
pub mod schema;

pub use cascade::Deletion;
pub use config::{ConfigError, DatabaseConfig, RecordsConfig};
pub use db::{
    DeletedScope, Filter, MemoryStore, PgStore, RepositoryError, Row, RowStore, create_pool,
};
pub use manager::Manager;
pub use models::{Account, Address, Checkout, Entity, Preapproval, User, Withdrawal};
pub use records::Records;
pub use wepay_records_core as core;
