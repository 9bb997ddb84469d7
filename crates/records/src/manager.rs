//! Per-entity manager: creation, revival, bulk updates and filtered reads.
//!
//! Every write goes through the same preparation: undeclared payload keys are
//! dropped, bounded strings are truncated, and a nested `shipping_address`
//! object is stored as its own address row. Reads exclude soft-deleted rows
//! unless the filter says otherwise.

use std::marker::PhantomData;

use serde_json::Value;
use tracing::instrument;

use crate::db::{Filter, RepositoryError, RowStore, primary_key};
use crate::models::{Entity, from_payload_row, from_stored_row, to_row};
use crate::payload::{Prepared, into_payload, prepare};
use crate::records::Records;
use crate::schema::{DELETED, SHIPPING_ADDRESS_ID};

/// Query and write operations for records of type `E`.
#[derive(Debug)]
pub struct Manager<'a, E, S> {
    records: &'a Records<S>,
    _entity: PhantomData<fn() -> E>,
}

impl<'a, E: Entity, S: RowStore> Manager<'a, E, S> {
    pub(crate) const fn new(records: &'a Records<S>) -> Self {
        Self {
            records,
            _entity: PhantomData,
        }
    }

    /// Create a new record from a WePay payload.
    ///
    /// A nested shipping address is stored first (reviving an address whose
    /// id it names) and linked. Fields absent from the payload take their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidRecord` if a required field is missing
    /// or a choice is unknown, and `RepositoryError::Conflict` if the primary
    /// key is taken or a referenced row does not exist.
    #[instrument(skip_all, fields(table = E::SCHEMA.table))]
    pub async fn create(&self, payload: Value) -> Result<E, RepositoryError> {
        let schema = E::SCHEMA;
        let Prepared {
            mut row,
            shipping_address,
        } = prepare(schema, into_payload(schema, payload)?)?;

        // Validate before the address is written
        from_payload_row::<E>(row.clone())?;

        if let Some(address) = shipping_address {
            let address_id = self.records.create_address(address, true).await?;
            row.insert(SHIPPING_ADDRESS_ID.to_owned(), Value::from(address_id));
        }

        let record: E = from_payload_row(row)?;
        let stored = self.records.store().insert(schema, to_row(&record)?).await?;
        tracing::debug!(pk = primary_key(schema, &stored), "created record");
        from_stored_row(stored)
    }

    /// Create a record, or overwrite and undelete the row with the same
    /// primary key.
    ///
    /// Every declared field is written: fields absent from the payload take
    /// their defaults. The stored shipping-address link is kept, and a nested
    /// address updates the linked address in place (creating and linking one
    /// if there is none).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidRecord` if the payload does not
    /// describe a complete record, and `RepositoryError::Conflict` if a
    /// referenced row does not exist.
    #[instrument(skip_all, fields(table = E::SCHEMA.table))]
    pub async fn revive_or_create(&self, payload: Value) -> Result<E, RepositoryError> {
        let schema = E::SCHEMA;
        let Prepared {
            mut row,
            shipping_address,
        } = prepare(schema, into_payload(schema, payload)?)?;
        row.insert(DELETED.to_owned(), Value::Bool(false));

        let existing = match primary_key(schema, &row) {
            Some(pk) => self.records.fetch_row(schema, pk).await?,
            None => None,
        };
        if schema.has_shipping_address()
            && !row.contains_key(SHIPPING_ADDRESS_ID)
            && let Some(linked) = existing.as_ref().and_then(|r| r.get(SHIPPING_ADDRESS_ID))
        {
            row.insert(SHIPPING_ADDRESS_ID.to_owned(), linked.clone());
        }

        let record: E = from_payload_row(row)?;
        let mut stored = self.records.store().save(schema, to_row(&record)?).await?;
        if existing.is_some() {
            tracing::debug!(pk = primary_key(schema, &stored), "revived record");
        }

        if let Some(address) = shipping_address {
            let linked = stored.get(SHIPPING_ADDRESS_ID).and_then(Value::as_i64);
            let address_id = self.records.write_linked_address(linked, address).await?;
            if linked != Some(address_id) {
                stored.insert(SHIPPING_ADDRESS_ID.to_owned(), Value::from(address_id));
                stored = self.records.store().save(schema, stored).await?;
            }
        }

        from_stored_row(stored)
    }

    /// Set `payload` values on every row matching `filter` and return the
    /// number of rows matched.
    ///
    /// Soft-deleted rows are excluded unless the filter names a deleted
    /// scope. Nested addresses cannot be written this way.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidValue` for a nested address or a value
    /// that does not fit its column, and `RepositoryError::UnknownColumn` if
    /// the filter names an undeclared column.
    #[instrument(skip_all, fields(table = E::SCHEMA.table))]
    pub async fn update(&self, filter: Filter, payload: Value) -> Result<u64, RepositoryError> {
        let schema = E::SCHEMA;
        let Prepared {
            row,
            shipping_address,
        } = prepare(schema, into_payload(schema, payload)?)?;

        if shipping_address.is_some() {
            return Err(RepositoryError::InvalidValue {
                table: schema.table,
                field: "shipping_address".to_owned(),
                reason: "bulk updates take an address id, not an address".to_owned(),
            });
        }
        let filter = filter.or_active().normalized(schema)?;
        if row.is_empty() {
            return Ok(0);
        }

        let count = self
            .records
            .store()
            .update_where(schema, &filter, &row)
            .await?;
        tracing::debug!(count, "bulk update");
        Ok(count)
    }

    /// Records matching `filter`, ordered by primary key.
    ///
    /// Soft-deleted rows are excluded unless the filter names a deleted
    /// scope.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::UnknownColumn` for an undeclared column and
    /// `RepositoryError::DataCorruption` if a stored row cannot be decoded.
    #[instrument(skip_all, fields(table = E::SCHEMA.table))]
    pub async fn filter(&self, filter: Filter) -> Result<Vec<E>, RepositoryError> {
        let schema = E::SCHEMA;
        let filter = filter.or_active().normalized(schema)?;
        self.records
            .store()
            .select(schema, &filter)
            .await?
            .into_iter()
            .map(from_stored_row)
            .collect()
    }

    /// All records that are not soft-deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the read fails.
    pub async fn all(&self) -> Result<Vec<E>, RepositoryError> {
        self.filter(Filter::new()).await
    }

    /// The record with primary key `pk`, unless it is missing or soft-deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the read fails.
    pub async fn get(&self, pk: impl Into<i64> + Send) -> Result<Option<E>, RepositoryError> {
        let filter = Filter::new().eq(E::SCHEMA.primary_key, pk.into());
        Ok(self.filter(filter).await?.into_iter().next())
    }
}
