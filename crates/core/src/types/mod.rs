//! Core types for WePay records.
//!
//! This module provides type-safe wrappers for the values WePay hands back.

pub mod id;
pub mod money;
pub mod status;

pub use id::*;
pub use money::{Money, MoneyError};
pub use status::*;
