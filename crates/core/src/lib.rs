//! WePay Records Core - Shared types library.
//!
//! This crate provides the value types used by the persistence layer and its
//! tools:
//! - `records` - Schema, record writer and soft-delete model
//! - `cli` - Table provisioning and payload import from the shell
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access. This keeps
//! it lightweight and allows WePay client code to share the same ids and
//! enumerations without pulling in a database driver.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, decimal money and WePay choice enumerations

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
