//! Typed records for the six WePay tables.
//!
//! Each record serializes to exactly its table's column-keyed row, so the
//! same serde derive converts a prepared payload into a validated record
//! (applying field defaults and closed choice sets) and a stored row back
//! into a record.

mod account;
mod address;
mod checkout;
mod preapproval;
mod user;
mod withdrawal;

pub use account::Account;
pub use address::Address;
pub use checkout::Checkout;
pub use preapproval::Preapproval;
pub use user::User;
pub use withdrawal::Withdrawal;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::db::{RepositoryError, Row};
use crate::schema::Schema;

/// A record type bound to its table declaration.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The table this record is stored in.
    const SCHEMA: &'static Schema;

    /// Primary key, if assigned.
    fn pk(&self) -> Option<i64>;

    /// Whether the soft-delete flag is set.
    fn is_deleted(&self) -> bool;

    /// Set the soft-delete flag.
    fn set_deleted(&mut self, deleted: bool);
}

/// Implements [`Entity`] for a record keyed by its WePay id.
macro_rules! wepay_entity {
    ($record:ty, $schema:expr, $pk:ident) => {
        impl $crate::models::Entity for $record {
            const SCHEMA: &'static $crate::schema::Schema = &$schema;

            fn pk(&self) -> Option<i64> {
                Some(self.$pk.as_i64())
            }

            fn is_deleted(&self) -> bool {
                self.deleted
            }

            fn set_deleted(&mut self, deleted: bool) {
                self.deleted = deleted;
            }
        }
    };
}

pub(crate) use wepay_entity;

pub(crate) const fn default_true() -> bool {
    true
}

/// Serialize a record into its column-keyed row.
pub(crate) fn to_row<E: Entity>(record: &E) -> Result<Row, RepositoryError> {
    let invalid = |reason: String| RepositoryError::InvalidRecord {
        table: E::SCHEMA.table,
        reason,
    };
    match serde_json::to_value(record) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(_) => Err(invalid("record did not serialize to an object".to_owned())),
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// Materialise a record from a prepared payload row.
pub(crate) fn from_payload_row<E: Entity>(row: Row) -> Result<E, RepositoryError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| RepositoryError::InvalidRecord {
        table: E::SCHEMA.table,
        reason: e.to_string(),
    })
}

/// Decode a row read back from the store.
pub(crate) fn from_stored_row<E: Entity>(row: Row) -> Result<E, RepositoryError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| {
        RepositoryError::DataCorruption(format!("{} row: {e}", E::SCHEMA.table))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::ALL;

    fn columns<E: Entity>(record: &E) -> Vec<String> {
        to_row(record).unwrap().keys().cloned().collect()
    }

    fn declared(schema: &Schema) -> Vec<String> {
        let mut columns: Vec<String> = schema.fields.iter().map(|f| f.column.to_owned()).collect();
        columns.sort();
        columns
    }

    #[test]
    fn test_records_serialize_to_declared_columns() {
        let user: User = from_payload_row(
            json!({
                "user_id": 1,
                "access_token": "t",
                "user_name": "Ada",
                "email": "ada@example.com",
                "state": "registered"
            })
            .as_object()
            .cloned()
            .unwrap(),
        )
        .unwrap();
        assert_eq!(columns(&user), declared(User::SCHEMA));
        assert_eq!(declared(User::SCHEMA), declared(ALL[1]));
    }

    #[test]
    fn test_bad_stored_row_is_corruption() {
        let err = from_stored_row::<User>(json!({"user_id": "x"}).as_object().cloned().unwrap())
            .unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[test]
    fn test_bad_payload_row_is_invalid_record() {
        let err = from_payload_row::<User>(json!({"user_id": 1}).as_object().cloned().unwrap())
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidRecord { table: "wepay_user", .. }));
    }
}
