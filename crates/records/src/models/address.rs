//! Shipping address.

use serde::{Deserialize, Serialize};
use wepay_records_core::AddressId;

use super::Entity;
use crate::schema::{ADDRESS, Schema};

/// A postal address owned by a preapproval or checkout.
///
/// The id is assigned by the store the first time the address is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Locally assigned id; `None` until stored.
    #[serde(default)]
    pub id: Option<AddressId>,
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    pub city: String,
    /// Two-letter state code.
    pub state: String,
    pub zip: String,
    pub country: String,
    /// Recipient name.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub deleted: bool,
}

impl Entity for Address {
    const SCHEMA: &'static Schema = &ADDRESS;

    fn pk(&self) -> Option<i64> {
        self.id.map(|id| id.as_i64())
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }
}
