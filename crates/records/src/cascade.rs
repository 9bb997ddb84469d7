//! Soft and hard deletion with ownership cascade.
//!
//! Deleting a user deletes its accounts; deleting an account deletes its
//! preapprovals and checkouts (and withdrawals, when configured). Children are
//! always handled before their parent, depth first, in primary-key order, and
//! the parent's soft/hard choice applies to the whole walk.

use std::collections::HashSet;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::instrument;

use crate::config::RecordsConfig;
use crate::db::{Filter, RepositoryError, Row, RowStore, primary_key};
use crate::models::{Entity, to_row};
use crate::records::Records;
use crate::schema::{ALL, DELETED, Schema};

type Planned = (&'static Schema, i64, Row);

/// How a record is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deletion {
    /// Soft unless `RecordsConfig::retain_records` is off.
    #[default]
    Default,
    /// Set `deleted` and keep the row.
    Soft,
    /// Remove the row.
    Hard,
}

impl Deletion {
    /// Whether this deletion removes rows under `config`.
    #[must_use]
    pub const fn is_hard(self, config: &RecordsConfig) -> bool {
        match self {
            Self::Default => !config.retain_records,
            Self::Soft => false,
            Self::Hard => true,
        }
    }
}

impl<S: RowStore> Records<S> {
    /// Delete `record` and everything it owns.
    ///
    /// A soft deletion sets `deleted` on the record and its active children;
    /// a hard deletion removes the record and all its children, soft-deleted
    /// ones included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record was never stored and
    /// `RepositoryError::Conflict` if a hard deletion would orphan a row that
    /// is not part of the cascade. The conflict is found before any row is
    /// removed.
    #[instrument(skip_all, fields(table = E::SCHEMA.table, pk = record.pk()))]
    pub async fn delete<E: Entity>(
        &self,
        record: &mut E,
        deletion: Deletion,
    ) -> Result<(), RepositoryError> {
        if record.pk().is_none() {
            return Err(RepositoryError::NotFound);
        }
        let hard = deletion.is_hard(self.config());
        tracing::info!(hard, "deleting record");

        let plan = self.plan_deletion(E::SCHEMA, to_row(record)?, hard).await?;
        if hard {
            self.check_restricted(&plan).await?;
        }

        for (schema, pk, mut row) in plan {
            if hard {
                let removed = self.store().delete(schema, pk).await?;
                tracing::debug!(table = schema.table, pk, removed, "removed row");
            } else {
                row.insert(DELETED.to_owned(), Value::Bool(true));
                self.store().save(schema, row).await?;
                tracing::debug!(table = schema.table, pk, "flagged row deleted");
            }
        }
        if !hard {
            record.set_deleted(true);
        }
        Ok(())
    }

    /// Rows to delete, children before their parent.
    fn plan_deletion<'a>(
        &'a self,
        schema: &'static Schema,
        row: Row,
        hard: bool,
    ) -> BoxFuture<'a, Result<Vec<Planned>, RepositoryError>> {
        async move {
            let pk = primary_key(schema, &row).ok_or(RepositoryError::NotFound)?;
            let mut plan = Vec::new();

            for relation in schema.owned {
                if relation.opt_in && !self.config().cascade_withdrawals {
                    continue;
                }
                let scope = if hard {
                    Filter::new().with_deleted()
                } else {
                    Filter::new().deleted(false)
                };
                let filter = scope.eq(relation.foreign_key, pk);
                let children = self.store().select(relation.child, &filter).await?;
                for child in children {
                    plan.extend(self.plan_deletion(relation.child, child, hard).await?);
                }
            }

            plan.push((schema, pk, row));
            Ok(plan)
        }
        .boxed()
    }

    /// Fail if a row outside `plan` holds a non-null reference into it.
    async fn check_restricted(&self, plan: &[Planned]) -> Result<(), RepositoryError> {
        let doomed: HashSet<(&str, i64)> = plan
            .iter()
            .map(|(schema, pk, _)| (schema.table, *pk))
            .collect();

        for (schema, pk, _) in plan {
            for referencing in ALL {
                for field in referencing
                    .fields
                    .iter()
                    .filter(|f| !f.null && f.references() == Some(schema.table))
                {
                    let filter = Filter::new().with_deleted().eq(field.column, *pk);
                    for row in self.store().select(referencing, &filter).await? {
                        let blocking = primary_key(referencing, &row);
                        if blocking.is_none_or(|id| !doomed.contains(&(referencing.table, id))) {
                            return Err(RepositoryError::Conflict(format!(
                                "{}.{} = {pk} is still referenced from {}.{}",
                                schema.table, schema.primary_key, referencing.table, field.column
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
