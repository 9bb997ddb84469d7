//! `PostgreSQL` row store.
//!
//! Statements are assembled with [`QueryBuilder`] from the static [`Schema`]:
//! only declared, quoted column names reach the SQL text and every value is
//! bound. Runtime-checked queries keep the crate buildable without a live
//! database.

use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::error::ErrorKind;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row as _};
use tracing::instrument;
use wepay_records_core::Money;

use super::{DeletedScope, Filter, RepositoryError, Row, RowStore, primary_key};
use crate::schema::{ALL, Field, FieldKind, Schema};

/// Row store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create every table and index that does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    #[instrument(skip(self))]
    pub async fn create_tables(&self) -> Result<(), RepositoryError> {
        for schema in ALL {
            for statement in schema.create_table_sql() {
                sqlx::query(&statement).execute(&self.pool).await?;
            }
            tracing::debug!(table = schema.table, "table ready");
        }
        Ok(())
    }

    async fn insert_returning(
        &self,
        schema: &'static Schema,
        row: &Row,
        upsert: bool,
    ) -> Result<Row, RepositoryError> {
        // A null auto id is left to the sequence
        let fields: Vec<&Field> = schema
            .fields
            .iter()
            .filter(|f| f.kind != FieldKind::AutoId || row.get(f.column).is_some_and(|v| !v.is_null()))
            .collect();

        let mut qb = QueryBuilder::<Postgres>::new(format!("INSERT INTO \"{}\" (", schema.table));
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(format!("\"{}\"", field.column));
        }
        qb.push(") VALUES (");
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, schema, field, row.get(field.column).unwrap_or(&Value::Null))?;
        }
        qb.push(")");

        if upsert {
            qb.push(format!(" ON CONFLICT (\"{}\") DO UPDATE SET ", schema.primary_key));
            let updates: Vec<String> = fields
                .iter()
                .filter(|f| f.column != schema.primary_key)
                .map(|f| format!("\"{0}\" = EXCLUDED.\"{0}\"", f.column))
                .collect();
            qb.push(updates.join(", "));
        }
        qb.push(" RETURNING *");

        let stored = qb
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        // An explicit id bypasses the sequence
        if let Some(statement) = fields
            .iter()
            .find(|f| f.kind == FieldKind::AutoId)
            .map(|f| sequence_sync_sql(schema, f))
        {
            sqlx::query(&statement).execute(&self.pool).await?;
            tracing::debug!(table = schema.table, "sequence resynced");
        }
        decode_row(schema, &stored)
    }
}

/// Move the id sequence of `field` past the highest stored id.
fn sequence_sync_sql(schema: &Schema, field: &Field) -> String {
    format!(
        "SELECT setval(pg_get_serial_sequence('\"{table}\"', '{column}'), \
         GREATEST((SELECT MAX(\"{column}\") FROM \"{table}\"), 1))",
        table = schema.table,
        column = field.column,
    )
}

impl RowStore for PgStore {
    #[instrument(skip(self, row), fields(table = schema.table))]
    async fn insert(&self, schema: &'static Schema, row: Row) -> Result<Row, RepositoryError> {
        self.insert_returning(schema, &row, false).await
    }

    #[instrument(skip(self, row), fields(table = schema.table))]
    async fn save(&self, schema: &'static Schema, row: Row) -> Result<Row, RepositoryError> {
        let upsert = primary_key(schema, &row).is_some();
        self.insert_returning(schema, &row, upsert).await
    }

    #[instrument(skip(self, filter), fields(table = schema.table))]
    async fn select(
        &self,
        schema: &'static Schema,
        filter: &Filter,
    ) -> Result<Vec<Row>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT * FROM \"{}\"", schema.table));
        push_where(&mut qb, schema, filter)?;
        qb.push(format!(" ORDER BY \"{}\"", schema.primary_key));

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(|row| decode_row(schema, row)).collect()
    }

    #[instrument(skip(self, filter, changes), fields(table = schema.table))]
    async fn update_where(
        &self,
        schema: &'static Schema,
        filter: &Filter,
        changes: &Row,
    ) -> Result<u64, RepositoryError> {
        if changes.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE \"{}\" SET ", schema.table));
        for (i, (column, value)) in changes.iter().enumerate() {
            let field = schema
                .column(column)
                .ok_or_else(|| RepositoryError::UnknownColumn {
                    table: schema.table,
                    column: column.clone(),
                })?;
            if i > 0 {
                qb.push(", ");
            }
            qb.push(format!("\"{}\" = ", field.column));
            push_value(&mut qb, schema, field, value)?;
        }
        push_where(&mut qb, schema, filter)?;

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(table = schema.table))]
    async fn delete(&self, schema: &'static Schema, pk: i64) -> Result<u64, RepositoryError> {
        let result = sqlx::query(&format!(
            "DELETE FROM \"{}\" WHERE \"{}\" = $1",
            schema.table, schema.primary_key
        ))
        .bind(pk)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(result.rows_affected())
    }
}

fn push_where(
    qb: &mut QueryBuilder<'_, Postgres>,
    schema: &'static Schema,
    filter: &Filter,
) -> Result<(), RepositoryError> {
    qb.push(" WHERE TRUE");
    for (column, value) in filter.conditions() {
        let field = schema
            .column(column)
            .ok_or_else(|| RepositoryError::UnknownColumn {
                table: schema.table,
                column: column.clone(),
            })?;
        if value.is_null() {
            qb.push(format!(" AND \"{}\" IS NULL", field.column));
        } else {
            qb.push(format!(" AND \"{}\" = ", field.column));
            push_value(qb, schema, field, value)?;
        }
    }
    match filter.deleted_scope() {
        Some(DeletedScope::Active) => {
            qb.push(" AND \"deleted\" = FALSE");
        }
        Some(DeletedScope::Deleted) => {
            qb.push(" AND \"deleted\" = TRUE");
        }
        Some(DeletedScope::All) | None => {}
    }
    Ok(())
}

/// Bind a normalised JSON value with the column's SQL type.
fn push_value(
    qb: &mut QueryBuilder<'_, Postgres>,
    schema: &Schema,
    field: &Field,
    value: &Value,
) -> Result<(), RepositoryError> {
    let mismatch = |expected: &str| RepositoryError::InvalidValue {
        table: schema.table,
        field: field.name.to_owned(),
        reason: format!("expected {expected}, got {value}"),
    };
    let null = value.is_null();

    match field.kind {
        FieldKind::AutoId
        | FieldKind::Integer
        | FieldKind::ForeignKey { .. }
        | FieldKind::ShippingAddress => {
            let bound = value.as_i64();
            if bound.is_none() && !null {
                return Err(mismatch("an integer"));
            }
            qb.push_bind(bound);
        }
        FieldKind::Char { .. } | FieldKind::Text => {
            let bound = value.as_str().map(str::to_owned);
            if bound.is_none() && !null {
                return Err(mismatch("a string"));
            }
            qb.push_bind(bound);
        }
        FieldKind::Money => {
            let bound = match value.as_str() {
                Some(text) => Some(
                    Money::parse(text)
                        .map_err(|_| mismatch("an amount"))?
                        .amount(),
                ),
                None if null => None,
                None => return Err(mismatch("an amount")),
            };
            qb.push_bind(bound);
        }
        FieldKind::Boolean => {
            let bound = value.as_bool();
            if bound.is_none() && !null {
                return Err(mismatch("a boolean"));
            }
            qb.push_bind(bound);
        }
    }
    Ok(())
}

/// Decode a result row into the normalised JSON shape.
fn decode_row(schema: &Schema, row: &PgRow) -> Result<Row, RepositoryError> {
    let mut decoded = Row::new();
    for field in schema.fields {
        let column = field.column;
        let value = match field.kind {
            FieldKind::AutoId
            | FieldKind::Integer
            | FieldKind::ForeignKey { .. }
            | FieldKind::ShippingAddress => row
                .try_get::<Option<i64>, _>(column)?
                .map_or(Value::Null, Value::from),
            FieldKind::Char { .. } | FieldKind::Text => row
                .try_get::<Option<String>, _>(column)?
                .map_or(Value::Null, Value::String),
            FieldKind::Money => row
                .try_get::<Option<Decimal>, _>(column)?
                .map_or(Value::Null, |amount| Value::from(Money::new(amount))),
            FieldKind::Boolean => row
                .try_get::<Option<bool>, _>(column)?
                .map_or(Value::Null, Value::Bool),
        };
        decoded.insert(column.to_owned(), value);
    }
    Ok(decoded)
}

/// Constraint violations become `Conflict`; everything else stays a
/// database error.
fn map_db_error(error: sqlx::Error) -> RepositoryError {
    let conflict = match &error {
        sqlx::Error::Database(db) => matches!(
            db.kind(),
            ErrorKind::UniqueViolation | ErrorKind::ForeignKeyViolation | ErrorKind::NotNullViolation
        )
        .then(|| db.message().to_owned()),
        _ => None,
    };
    conflict.map_or(RepositoryError::Database(error), RepositoryError::Conflict)
}
