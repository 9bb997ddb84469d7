//! Payload whitelisting, truncation and value normalisation.
//!
//! A payload is a JSON object in the shape WePay returns. Preparing it for a
//! table keeps only the keys the table declares, cuts bounded strings down to
//! their column length, canonicalises money to two-place decimal strings, and
//! splits a nested `shipping_address` object out for a separate write.
//! Nothing here rejects an oversized string or an unknown key.

use serde_json::{Map, Value};
use wepay_records_core::Money;

use crate::db::{RepositoryError, Row};
use crate::schema::{Field, FieldKind, Schema};

/// A field-keyed JSON object supplied by the caller.
pub type Payload = Map<String, Value>;

/// A payload ready for storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prepared {
    /// Declared, normalised values keyed by column.
    pub row: Row,
    /// Nested shipping address, still field-keyed.
    pub shipping_address: Option<Payload>,
}

/// Unwrap a JSON object payload.
///
/// # Errors
///
/// Returns `RepositoryError::InvalidRecord` if `value` is not an object.
pub fn into_payload(schema: &Schema, value: Value) -> Result<Payload, RepositoryError> {
    match value {
        Value::Object(payload) => Ok(payload),
        other => Err(RepositoryError::InvalidRecord {
            table: schema.table,
            reason: format!("payload must be a JSON object, got {}", json_type(&other)),
        }),
    }
}

/// Whitelist, truncate and normalise a payload for `schema`.
///
/// # Errors
///
/// Returns `RepositoryError::InvalidValue` if a declared field holds a value
/// its column cannot store.
pub fn prepare(schema: &'static Schema, mut payload: Payload) -> Result<Prepared, RepositoryError> {
    let mut prepared = Prepared::default();

    for field in schema.fields {
        let Some(value) = payload.remove(field.name) else {
            continue;
        };
        if field.kind == FieldKind::ShippingAddress
            && let Value::Object(address) = value
        {
            prepared.shipping_address = Some(address);
            continue;
        }
        prepared
            .row
            .insert(field.column.to_owned(), coerce(schema, field, value)?);
    }

    if !payload.is_empty() {
        let dropped: Vec<&str> = payload.keys().map(String::as_str).collect();
        tracing::debug!(table = schema.table, ?dropped, "dropped undeclared payload fields");
    }

    Ok(prepared)
}

/// Normalise one value for `field`.
///
/// # Errors
///
/// Returns `RepositoryError::InvalidValue` if the value has the wrong JSON
/// type, is null for a non-null column, or is not a decimal amount.
pub fn coerce(schema: &Schema, field: &Field, value: Value) -> Result<Value, RepositoryError> {
    let invalid = |reason: String| RepositoryError::InvalidValue {
        table: schema.table,
        field: field.name.to_owned(),
        reason,
    };

    if value.is_null() {
        return if field.null || field.kind == FieldKind::AutoId {
            Ok(Value::Null)
        } else {
            Err(invalid("null is not allowed".to_owned()))
        };
    }

    match field.kind {
        FieldKind::AutoId
        | FieldKind::Integer
        | FieldKind::ForeignKey { .. }
        | FieldKind::ShippingAddress => integer(&value)
            .map(Value::from)
            .ok_or_else(|| invalid(format!("expected an integer, got {}", json_type(&value)))),
        FieldKind::Char { max_length } => match value {
            Value::String(s) => Ok(Value::String(truncate(schema, field, s, max_length))),
            other => Err(invalid(format!("expected a string, got {}", json_type(&other)))),
        },
        FieldKind::Text => match value {
            Value::String(s) => Ok(Value::String(s)),
            other => Err(invalid(format!("expected a string, got {}", json_type(&other)))),
        },
        FieldKind::Money => {
            let text = match &value {
                Value::String(s) => s.clone(),
                // Number's text is the decimal as written, not an f64 product
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(invalid(format!(
                        "expected an amount, got {}",
                        json_type(other)
                    )));
                }
            };
            Money::parse(&text)
                .map(Value::from)
                .map_err(|e| invalid(e.to_string()))
        }
        FieldKind::Boolean => match value {
            Value::Bool(b) => Ok(Value::Bool(b)),
            Value::Number(ref n) if n.as_i64() == Some(0) => Ok(Value::Bool(false)),
            Value::Number(ref n) if n.as_i64() == Some(1) => Ok(Value::Bool(true)),
            other => Err(invalid(format!("expected a boolean, got {}", json_type(&other)))),
        },
    }
}

/// Cut `value` to at most `max_length` characters.
#[must_use]
pub fn truncate_chars(value: &str, max_length: usize) -> Option<&str> {
    value
        .char_indices()
        .nth(max_length)
        .map(|(byte_index, _)| value.get(..byte_index).unwrap_or(value))
}

fn truncate(schema: &Schema, field: &Field, value: String, max_length: usize) -> String {
    match truncate_chars(&value, max_length) {
        Some(kept) => {
            tracing::debug!(
                table = schema.table,
                field = field.name,
                max_length,
                original_length = value.chars().count(),
                "truncated value to column length"
            );
            kept.to_owned()
        }
        None => value,
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
