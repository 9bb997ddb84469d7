//! Equality filters with an explicit soft-delete scope.

use serde_json::Value;

use super::{RepositoryError, Row};
use crate::payload::coerce;
use crate::schema::{DELETED, FieldKind, Schema};

/// Which rows a filter matches by their `deleted` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletedScope {
    /// `deleted = false`.
    Active,
    /// `deleted = true`.
    Deleted,
    /// Either state.
    All,
}

/// Conjunction of column equality conditions.
///
/// The soft-delete condition is tracked separately so the manager can tell
/// whether the caller said anything about it:
///
/// ```
/// use wepay_records::{DeletedScope, Filter};
///
/// let filter = Filter::new().eq("user_id", 7);
/// assert_eq!(filter.deleted_scope(), None);
///
/// let filter = Filter::new().eq("deleted", true);
/// assert_eq!(filter.deleted_scope(), Some(DeletedScope::Deleted));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
    deleted: Option<DeletedScope>,
}

impl Filter {
    /// A filter matching every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `column = value`.
    ///
    /// A boolean condition on `deleted` sets the soft-delete scope.
    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        let value = value.into();
        if column == DELETED
            && let Value::Bool(deleted) = value
        {
            return self.deleted(deleted);
        }
        self.conditions.push((column, value));
        self
    }

    /// Match only deleted (`true`) or only active (`false`) rows.
    #[must_use]
    pub const fn deleted(mut self, deleted: bool) -> Self {
        self.deleted = Some(if deleted {
            DeletedScope::Deleted
        } else {
            DeletedScope::Active
        });
        self
    }

    /// Match rows in either state.
    #[must_use]
    pub const fn with_deleted(mut self) -> Self {
        self.deleted = Some(DeletedScope::All);
        self
    }

    /// Apply the default scope (active rows) unless one was given.
    #[must_use]
    pub fn or_active(mut self) -> Self {
        self.deleted.get_or_insert(DeletedScope::Active);
        self
    }

    /// The equality conditions, in the order they were added.
    #[must_use]
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// The soft-delete scope, if the caller set one.
    #[must_use]
    pub const fn deleted_scope(&self) -> Option<DeletedScope> {
        self.deleted
    }

    /// Check every column against `schema` and normalise the values the way
    /// writes normalise them, so `"10"` matches a stored `"10.00"`.
    ///
    /// Strings are compared as given: a value longer than its column is not
    /// truncated and matches nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::UnknownColumn` for an undeclared column and
    /// `RepositoryError::InvalidValue` for a value the column cannot hold.
    pub fn normalized(self, schema: &'static Schema) -> Result<Self, RepositoryError> {
        let conditions = self
            .conditions
            .into_iter()
            .map(|(column, value)| {
                let field = schema
                    .column(&column)
                    .ok_or_else(|| RepositoryError::UnknownColumn {
                        table: schema.table,
                        column: column.clone(),
                    })?;
                // `col = NULL` never matches; a null condition means IS NULL
                if value.is_null() {
                    return Ok((column, value));
                }
                if field.kind == FieldKind::ShippingAddress && value.is_object() {
                    return Err(RepositoryError::InvalidValue {
                        table: schema.table,
                        field: column,
                        reason: "filter by address id, not by address fields".to_owned(),
                    });
                }
                if matches!(field.kind, FieldKind::Char { .. }) && value.is_string() {
                    return Ok((column, value));
                }
                Ok((column, coerce(schema, field, value)?))
            })
            .collect::<Result<_, RepositoryError>>()?;

        Ok(Self {
            conditions,
            deleted: self.deleted,
        })
    }

    /// Whether a stored row satisfies the filter.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        let scope_matches = match self.deleted {
            Some(DeletedScope::Active) => row.get(DELETED) == Some(&Value::Bool(false)),
            Some(DeletedScope::Deleted) => row.get(DELETED) == Some(&Value::Bool(true)),
            Some(DeletedScope::All) | None => true,
        };

        scope_matches
            && self
                .conditions
                .iter()
                .all(|(column, value)| row.get(column).unwrap_or(&Value::Null) == value)
    }
}
