//! Record import, listing and deletion.

use std::path::Path;

use serde_json::Value;
use wepay_records::{
    Account, Address, Checkout, Deletion, Entity, Filter, PgStore, Preapproval, Records,
    RecordsConfig, User, Withdrawal,
};

use super::{CommandError, connect};
use crate::EntityKind;

/// Which rows `list` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    Active,
    Deleted,
    All,
}

impl ListScope {
    fn filter(self) -> Filter {
        match self {
            Self::Active => Filter::new(),
            Self::Deleted => Filter::new().deleted(true),
            Self::All => Filter::new().with_deleted(),
        }
    }
}

async fn open() -> Result<Records<PgStore>, CommandError> {
    let config = RecordsConfig::from_env()?;
    Ok(Records::new(connect().await?, config))
}

/// Revive or create every object in `file`.
pub async fn import(entity: EntityKind, file: &Path) -> Result<(), CommandError> {
    let text = tokio::fs::read_to_string(file)
        .await
        .map_err(|source| CommandError::Io {
            path: file.display().to_string(),
            source,
        })?;
    let payloads = match serde_json::from_str::<Value>(&text)? {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => return Err(CommandError::NotObjects(file.display().to_string())),
    };

    let records = open().await?;
    let count = payloads.len();
    for payload in payloads {
        match entity {
            EntityKind::User => import_one::<User>(&records, payload).await?,
            EntityKind::Account => import_one::<Account>(&records, payload).await?,
            EntityKind::Preapproval => import_one::<Preapproval>(&records, payload).await?,
            EntityKind::Checkout => import_one::<Checkout>(&records, payload).await?,
            EntityKind::Withdrawal => import_one::<Withdrawal>(&records, payload).await?,
            EntityKind::Address => import_one::<Address>(&records, payload).await?,
        }
    }
    tracing::info!(count, ?entity, "Import complete");
    Ok(())
}

async fn import_one<E: Entity>(records: &Records<PgStore>, payload: Value) -> Result<(), CommandError> {
    let record = records.objects::<E>().revive_or_create(payload).await?;
    tracing::debug!(pk = record.pk(), table = E::SCHEMA.table, "imported");
    Ok(())
}

/// Print records as JSON lines, ordered by primary key.
pub async fn list(entity: EntityKind, scope: ListScope) -> Result<(), CommandError> {
    let records = open().await?;
    match entity {
        EntityKind::User => print_all::<User>(&records, scope).await,
        EntityKind::Account => print_all::<Account>(&records, scope).await,
        EntityKind::Preapproval => print_all::<Preapproval>(&records, scope).await,
        EntityKind::Checkout => print_all::<Checkout>(&records, scope).await,
        EntityKind::Withdrawal => print_all::<Withdrawal>(&records, scope).await,
        EntityKind::Address => print_all::<Address>(&records, scope).await,
    }
}

#[allow(clippy::print_stdout)]
async fn print_all<E: Entity>(
    records: &Records<PgStore>,
    scope: ListScope,
) -> Result<(), CommandError> {
    for record in records.objects::<E>().filter(scope.filter()).await? {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}

/// Delete one record and its owned children.
pub async fn delete(entity: EntityKind, id: i64, deletion: Deletion) -> Result<(), CommandError> {
    let records = open().await?;
    match entity {
        EntityKind::User => delete_one::<User>(&records, id, deletion).await,
        EntityKind::Account => delete_one::<Account>(&records, id, deletion).await,
        EntityKind::Preapproval => delete_one::<Preapproval>(&records, id, deletion).await,
        EntityKind::Checkout => delete_one::<Checkout>(&records, id, deletion).await,
        EntityKind::Withdrawal => delete_one::<Withdrawal>(&records, id, deletion).await,
        EntityKind::Address => delete_one::<Address>(&records, id, deletion).await,
    }
}

async fn delete_one<E: Entity>(
    records: &Records<PgStore>,
    id: i64,
    deletion: Deletion,
) -> Result<(), CommandError> {
    let filter = Filter::new().eq(E::SCHEMA.primary_key, id).with_deleted();
    let mut record = records
        .objects::<E>()
        .filter(filter)
        .await?
        .into_iter()
        .next()
        .ok_or(CommandError::NotFound {
            entity: E::SCHEMA.table,
            id,
        })?;

    records.delete(&mut record, deletion).await?;
    tracing::info!(table = E::SCHEMA.table, id, "Deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use wepay_records::DeletedScope;

    use super::*;

    #[test]
    fn test_list_scope_filters() {
        assert_eq!(ListScope::Active.filter().deleted_scope(), None);
        assert_eq!(
            ListScope::Deleted.filter().deleted_scope(),
            Some(DeletedScope::Deleted)
        );
        assert_eq!(
            ListScope::All.filter().deleted_scope(),
            Some(DeletedScope::All)
        );
    }
}
