//! In-process row store.
//!
//! Tables are `BTreeMap`s keyed by primary key behind one `RwLock`, so a
//! write checks its keys and references and applies its change under the
//! same guard. Foreign keys behave like the `PostgreSQL` tables: a reference
//! to a missing row is refused, and deleting a referenced row is refused for
//! non-null columns and nulls out nullable ones.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tokio::sync::RwLock;

use super::{Filter, RepositoryError, Row, RowStore, primary_key};
use crate::schema::{ALL, Schema};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, Row>,
    last_id: i64,
}

type Tables = HashMap<&'static str, Table>;

/// Row store holding every table in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in `schema`'s table, deleted or not.
    pub async fn count(&self, schema: &'static Schema) -> usize {
        self.tables
            .read()
            .await
            .get(schema.table)
            .map_or(0, |t| t.rows.len())
    }
}

/// Keep only declared columns, filling absent ones with null.
fn conform(schema: &Schema, mut row: Row) -> Row {
    schema
        .fields
        .iter()
        .map(|field| {
            let value = row.remove(field.column).unwrap_or(Value::Null);
            (field.column.to_owned(), value)
        })
        .collect()
}

fn contains(tables: &Tables, table: &str, pk: i64) -> bool {
    tables.get(table).is_some_and(|t| t.rows.contains_key(&pk))
}

fn check_references(tables: &Tables, schema: &Schema, row: &Row) -> Result<(), RepositoryError> {
    for field in schema.fields {
        let Some(target) = field.references() else {
            continue;
        };
        let Some(id) = row.get(field.column).and_then(Value::as_i64) else {
            continue;
        };
        if !contains(tables, target, id) {
            return Err(RepositoryError::Conflict(format!(
                "{}.{} = {id} is not present in {target}",
                schema.table, field.column
            )));
        }
    }
    Ok(())
}

fn insert_row(tables: &mut Tables, schema: &'static Schema, row: Row) -> Result<Row, RepositoryError> {
    let mut row = conform(schema, row);
    check_references(tables, schema, &row)?;

    let table = tables.entry(schema.table).or_default();
    let pk = match primary_key(schema, &row) {
        Some(pk) => pk,
        None if schema.has_auto_id() => table.last_id + 1,
        None => {
            return Err(RepositoryError::Conflict(format!(
                "null value in {}.{}",
                schema.table, schema.primary_key
            )));
        }
    };
    if table.rows.contains_key(&pk) {
        return Err(RepositoryError::Conflict(format!(
            "duplicate key {}.{} = {pk}",
            schema.table, schema.primary_key
        )));
    }

    table.last_id = table.last_id.max(pk);
    row.insert(schema.primary_key.to_owned(), Value::from(pk));
    table.rows.insert(pk, row.clone());
    Ok(row)
}

impl RowStore for MemoryStore {
    async fn insert(&self, schema: &'static Schema, row: Row) -> Result<Row, RepositoryError> {
        let mut tables = self.tables.write().await;
        insert_row(&mut tables, schema, row)
    }

    async fn save(&self, schema: &'static Schema, row: Row) -> Result<Row, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(pk) = primary_key(schema, &row).filter(|pk| contains(&tables, schema.table, *pk))
        else {
            return insert_row(&mut tables, schema, row);
        };

        let row = conform(schema, row);
        check_references(&tables, schema, &row)?;
        tables
            .entry(schema.table)
            .or_default()
            .rows
            .insert(pk, row.clone());
        Ok(row)
    }

    async fn select(
        &self,
        schema: &'static Schema,
        filter: &Filter,
    ) -> Result<Vec<Row>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(schema.table)
            .map(|t| {
                t.rows
                    .values()
                    .filter(|row| filter.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_where(
        &self,
        schema: &'static Schema,
        filter: &Filter,
        changes: &Row,
    ) -> Result<u64, RepositoryError> {
        if let Some(column) = changes.keys().find(|c| schema.column(c).is_none()) {
            return Err(RepositoryError::UnknownColumn {
                table: schema.table,
                column: column.clone(),
            });
        }

        let mut tables = self.tables.write().await;
        let Some(table) = tables.get(schema.table) else {
            return Ok(0);
        };

        // Build every updated row before touching the table
        let mut updated = Vec::new();
        for (old_pk, row) in table.rows.iter().filter(|(_, row)| filter.matches(row)) {
            let mut row = row.clone();
            row.extend(changes.iter().map(|(k, v)| (k.clone(), v.clone())));
            check_references(&tables, schema, &row)?;
            let new_pk = primary_key(schema, &row).ok_or_else(|| {
                RepositoryError::Conflict(format!(
                    "null value in {}.{}",
                    schema.table, schema.primary_key
                ))
            })?;
            updated.push((*old_pk, new_pk, row));
        }

        let table = tables.entry(schema.table).or_default();
        for (old_pk, _, _) in &updated {
            table.rows.remove(old_pk);
        }
        for (_, new_pk, _) in &updated {
            if table.rows.contains_key(new_pk) {
                return Err(RepositoryError::Conflict(format!(
                    "duplicate key {}.{} = {new_pk}",
                    schema.table, schema.primary_key
                )));
            }
        }
        let count = updated.len();
        for (_, new_pk, row) in updated {
            table.rows.insert(new_pk, row);
        }

        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn delete(&self, schema: &'static Schema, pk: i64) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !contains(&tables, schema.table, pk) {
            return Ok(0);
        }

        let mut set_null = Vec::new();
        for referencing in ALL {
            for field in referencing
                .fields
                .iter()
                .filter(|f| f.references() == Some(schema.table))
            {
                let Some(table) = tables.get(referencing.table) else {
                    continue;
                };
                for (child_pk, row) in &table.rows {
                    if row.get(field.column).and_then(Value::as_i64) != Some(pk) {
                        continue;
                    }
                    if !field.null {
                        return Err(RepositoryError::Conflict(format!(
                            "{}.{} = {pk} is still referenced from {}.{}",
                            schema.table, schema.primary_key, referencing.table, field.column
                        )));
                    }
                    set_null.push((referencing.table, *child_pk, field.column));
                }
            }
        }

        for (table, child_pk, column) in set_null {
            if let Some(row) = tables
                .get_mut(table)
                .and_then(|t| t.rows.get_mut(&child_pk))
            {
                row.insert(column.to_owned(), Value::Null);
            }
        }

        let removed = tables
            .get_mut(schema.table)
            .and_then(|t| t.rows.remove(&pk))
            .is_some();
        Ok(u64::from(removed))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::{ACCOUNT, ADDRESS, CHECKOUT, USER};

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    async fn seed_user(store: &MemoryStore, user_id: i64) {
        store
            .insert(&USER, row(json!({"user_id": user_id, "deleted": false})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insert_assigns_address_ids() {
        let store = MemoryStore::new();
        let first = store
            .insert(&ADDRESS, row(json!({"city": "Palo Alto", "deleted": false})))
            .await
            .unwrap();
        let second = store
            .insert(&ADDRESS, row(json!({"id": null, "deleted": false})))
            .await
            .unwrap();

        assert_eq!(first["id"], json!(1));
        assert_eq!(second["id"], json!(2));
        assert_eq!(second["city"], Value::Null);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_key() {
        let store = MemoryStore::new();
        seed_user(&store, 1).await;
        let err = store
            .insert(&USER, row(json!({"user_id": 1, "deleted": false})))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_insert_rejects_missing_parent() {
        let store = MemoryStore::new();
        let err = store
            .insert(&ACCOUNT, row(json!({"account_id": 1, "user_id": 99})))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(store.count(&ACCOUNT).await, 0);
    }

    #[tokio::test]
    async fn test_save_overwrites_and_drops_undeclared_columns() {
        let store = MemoryStore::new();
        seed_user(&store, 1).await;
        let saved = store
            .save(
                &USER,
                row(json!({"user_id": 1, "user_name": "Ada", "nickname": "A", "deleted": true})),
            )
            .await
            .unwrap();

        assert_eq!(saved["user_name"], json!("Ada"));
        assert!(!saved.contains_key("nickname"));
        assert_eq!(store.count(&USER).await, 1);
    }

    #[tokio::test]
    async fn test_select_orders_by_primary_key() {
        let store = MemoryStore::new();
        for id in [3, 1, 2] {
            seed_user(&store, id).await;
        }
        let rows = store.select(&USER, &Filter::new()).await.unwrap();
        let ids: Vec<i64> = rows.iter().filter_map(|r| r["user_id"].as_i64()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_update_where_counts_matches() {
        let store = MemoryStore::new();
        for id in [1, 2, 3] {
            seed_user(&store, id).await;
        }
        let count = store
            .update_where(
                &USER,
                &Filter::new().eq("user_id", 2),
                &row(json!({"user_name": "Grace"})),
            )
            .await
            .unwrap();

        assert_eq!(count, 1);
        let rows = store
            .select(&USER, &Filter::new().eq("user_name", "Grace"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_update_where_rejects_dangling_reference_without_writing() {
        let store = MemoryStore::new();
        seed_user(&store, 1).await;
        store
            .insert(&ACCOUNT, row(json!({"account_id": 10, "user_id": 1})))
            .await
            .unwrap();

        let err = store
            .update_where(&ACCOUNT, &Filter::new(), &row(json!({"user_id": 2})))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let rows = store.select(&ACCOUNT, &Filter::new()).await.unwrap();
        assert_eq!(rows[0]["user_id"], json!(1));
    }

    #[tokio::test]
    async fn test_delete_refuses_while_referenced() {
        let store = MemoryStore::new();
        seed_user(&store, 1).await;
        store
            .insert(&ACCOUNT, row(json!({"account_id": 10, "user_id": 1})))
            .await
            .unwrap();

        let err = store.delete(&USER, 1).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(store.count(&USER).await, 1);
    }

    #[tokio::test]
    async fn test_delete_nulls_nullable_references() {
        let store = MemoryStore::new();
        seed_user(&store, 1).await;
        store
            .insert(&ACCOUNT, row(json!({"account_id": 10, "user_id": 1})))
            .await
            .unwrap();
        let address = store
            .insert(&ADDRESS, row(json!({"deleted": false})))
            .await
            .unwrap();
        store
            .insert(
                &CHECKOUT,
                row(json!({
                    "checkout_id": 100,
                    "account_id": 10,
                    "shipping_address_id": address["id"],
                })),
            )
            .await
            .unwrap();

        assert_eq!(store.delete(&ADDRESS, 1).await.unwrap(), 1);
        let checkout = store.select(&CHECKOUT, &Filter::new()).await.unwrap();
        assert_eq!(checkout[0]["shipping_address_id"], Value::Null);
    }

    #[tokio::test]
    async fn test_delete_missing_row_is_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.delete(&USER, 1).await.unwrap(), 0);
    }
}
