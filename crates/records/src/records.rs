//! The records context: a row store plus deletion configuration.

use serde_json::Value;
use tracing::instrument;

use crate::config::RecordsConfig;
use crate::db::{Filter, RepositoryError, Row, RowStore, primary_key};
use crate::manager::Manager;
use crate::models::{Address, Entity, from_payload_row, from_stored_row, to_row};
use crate::payload::{Payload, coerce, into_payload, prepare};
use crate::schema::{ADDRESS, DELETED, FieldKind, Schema};

/// Entry point for reading, writing and deleting WePay records.
///
/// ```
/// use wepay_records::{MemoryStore, Records, RecordsConfig, User};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), wepay_records::RepositoryError> {
/// let records = Records::new(MemoryStore::new(), RecordsConfig::default());
/// let users: Vec<User> = records.objects::<User>().all().await?;
/// assert!(users.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Records<S> {
    store: S,
    config: RecordsConfig,
}

impl<S: RowStore> Records<S> {
    /// Create a context over `store`.
    pub const fn new(store: S, config: RecordsConfig) -> Self {
        Self { store, config }
    }

    /// The underlying row store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Deletion configuration.
    pub const fn config(&self) -> &RecordsConfig {
        &self.config
    }

    /// Manager for records of type `E`.
    pub const fn objects<E: Entity>(&self) -> Manager<'_, E, S> {
        Manager::new(self)
    }

    /// Persist `record` as is, inserting it if it has no stored row yet.
    ///
    /// The record is refreshed from the stored row, so a new address picks
    /// up its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store rejects the row.
    #[instrument(skip_all, fields(table = E::SCHEMA.table, pk = record.pk()))]
    pub async fn save<E: Entity>(&self, record: &mut E) -> Result<(), RepositoryError> {
        let stored = self.store.save(E::SCHEMA, to_row(record)?).await?;
        *record = from_stored_row(stored)?;
        Ok(())
    }

    /// Assign payload values to `record` field by field, persisting after
    /// each assignment.
    ///
    /// Fields are visited in declaration order. Undeclared keys and the
    /// primary key are ignored. Bounded strings are truncated. A nested
    /// `shipping_address` object updates the linked address in place, or
    /// creates and links one if there is none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a value does not fit its field or a write
    /// fails. Fields assigned before the failure stay persisted.
    #[instrument(skip_all, fields(table = E::SCHEMA.table, pk = record.pk()))]
    pub async fn update_record<E: Entity>(
        &self,
        record: &mut E,
        payload: Value,
    ) -> Result<(), RepositoryError> {
        let schema = E::SCHEMA;
        let mut payload = into_payload(schema, payload)?;
        let mut row = to_row(record)?;

        for field in schema.fields {
            let Some(value) = payload.remove(field.name) else {
                continue;
            };
            if field.column == schema.primary_key {
                tracing::debug!(field = field.name, "ignoring primary key in update payload");
                continue;
            }

            let value = match (field.kind, value) {
                (FieldKind::ShippingAddress, Value::Object(address)) => {
                    let linked = row.get(field.column).and_then(Value::as_i64);
                    Value::from(self.write_linked_address(linked, address).await?)
                }
                (_, value) => coerce(schema, field, value)?,
            };
            row.insert(field.column.to_owned(), value);

            from_payload_row::<E>(row.clone())?;
            row = self.store.save(schema, row).await?;
            *record = from_stored_row(row.clone())?;
        }

        Ok(())
    }

    /// Fetch a row by primary key in any deleted state.
    pub(crate) async fn fetch_row(
        &self,
        schema: &'static Schema,
        pk: i64,
    ) -> Result<Option<Row>, RepositoryError> {
        let filter = Filter::new()
            .eq(schema.primary_key, pk)
            .with_deleted();
        Ok(self.store.select(schema, &filter).await?.into_iter().next())
    }

    /// Store a new address from a nested payload and return its id.
    ///
    /// With `revive`, an address payload naming an existing id overwrites
    /// that row and clears its `deleted` flag instead of conflicting.
    pub(crate) async fn create_address(
        &self,
        payload: Payload,
        revive: bool,
    ) -> Result<i64, RepositoryError> {
        let prepared = prepare(&ADDRESS, payload)?;
        let mut row = prepared.row;
        row.insert(DELETED.to_owned(), Value::Bool(false));
        let row = to_row(&from_payload_row::<Address>(row)?)?;

        let stored = if revive && primary_key(&ADDRESS, &row).is_some() {
            self.store.save(&ADDRESS, row).await?
        } else {
            self.store.insert(&ADDRESS, row).await?
        };
        let id = primary_key(&ADDRESS, &stored).ok_or(RepositoryError::NotFound)?;
        tracing::debug!(address_id = id, "stored shipping address");
        Ok(id)
    }

    /// Update the linked address in place, or create a new one when nothing
    /// is linked or the linked row is gone. Returns the address id.
    pub(crate) async fn write_linked_address(
        &self,
        linked: Option<i64>,
        payload: Payload,
    ) -> Result<i64, RepositoryError> {
        let existing = match linked {
            Some(id) => self.fetch_row(&ADDRESS, id).await?,
            None => None,
        };
        let Some(mut row) = existing else {
            return self.create_address(payload, false).await;
        };

        let mut prepared = prepare(&ADDRESS, payload)?;
        // The link decides which row is written
        prepared.row.remove(ADDRESS.primary_key);
        row.extend(prepared.row);
        let row = to_row(&from_payload_row::<Address>(row)?)?;
        let stored = self.store.save(&ADDRESS, row).await?;
        primary_key(&ADDRESS, &stored).ok_or(RepositoryError::NotFound)
    }
}
