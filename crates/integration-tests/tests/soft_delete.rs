//! Default read scope and soft deletion.

use serde_json::json;
use wepay_records::{
    Account, Address, Checkout, Deletion, Entity, Filter, MemoryStore, Preapproval, Records,
    RepositoryError, User, Withdrawal,
};
use wepay_records_integration_tests::{memory_records, seed_tree, seed_withdrawal, user_payload};

async fn assert_hidden_when_flagged<E: Entity>(records: &Records<MemoryStore>) {
    let manager = records.objects::<E>();
    let before = manager.all().await.expect("list before");
    assert!(!before.is_empty(), "{} has no rows", E::SCHEMA.table);

    manager
        .update(Filter::new(), json!({"deleted": true}))
        .await
        .expect("flag rows");

    assert!(manager.all().await.expect("list after").is_empty());
    let flagged = manager
        .filter(Filter::new().eq("deleted", true))
        .await
        .expect("list deleted");
    assert_eq!(flagged.len(), before.len());
    assert!(flagged.iter().all(Entity::is_deleted));
}

#[tokio::test]
async fn test_default_filter_excludes_deleted_rows_for_every_entity() {
    let records = memory_records();
    seed_tree(&records).await;
    seed_withdrawal(&records).await;

    assert_hidden_when_flagged::<Withdrawal>(&records).await;
    assert_hidden_when_flagged::<Checkout>(&records).await;
    assert_hidden_when_flagged::<Preapproval>(&records).await;
    assert_hidden_when_flagged::<Address>(&records).await;
    assert_hidden_when_flagged::<Account>(&records).await;
    assert_hidden_when_flagged::<User>(&records).await;
}

#[tokio::test]
async fn test_account_delete_keeps_row_under_default_retention() {
    let records = memory_records();
    records
        .objects::<User>()
        .create(user_payload(7))
        .await
        .expect("create user");
    let mut account = records
        .objects::<Account>()
        .create(json!({
            "account_id": 1,
            "name": "Acme",
            "description": "Widgets",
            "account_uri": "https://stage.wepay.com/account/1",
            "verification_state": "verified",
            "type": "business",
            "pending_balance": "10.00",
            "available_balance": "0.00",
            "user_id": 7
        }))
        .await
        .expect("create account");
    assert!(!account.deleted);

    records
        .delete(&mut account, Deletion::Default)
        .await
        .expect("delete account");
    assert!(account.deleted);

    let manager = records.objects::<Account>();
    assert!(manager.filter(Filter::new()).await.expect("filter").is_empty());
    let deleted = manager
        .filter(Filter::new().deleted(true))
        .await
        .expect("filter deleted");
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].pending_balance.to_string(), "10.00");
    assert_eq!(records.store().count(Account::SCHEMA).await, 1);
}

#[tokio::test]
async fn test_with_deleted_returns_both_states_in_key_order() {
    let records = memory_records();
    let tree = seed_tree(&records).await;
    let mut first = tree.checkouts[0].clone();
    records
        .delete(&mut first, Deletion::Soft)
        .await
        .expect("soft delete");

    let checkouts = records
        .objects::<Checkout>()
        .filter(Filter::new().eq("account_id", 10).with_deleted())
        .await
        .expect("filter");
    let ids: Vec<Option<i64>> = checkouts.iter().map(Entity::pk).collect();
    assert_eq!(ids, vec![Some(1000), Some(1001)]);
    assert!(checkouts[0].deleted);
    assert!(!checkouts[1].deleted);
}

#[tokio::test]
async fn test_get_hides_soft_deleted_record() {
    let records = memory_records();
    let mut tree = seed_tree(&records).await;
    records
        .delete(&mut tree.preapproval, Deletion::Soft)
        .await
        .expect("soft delete");

    let found = records
        .objects::<Preapproval>()
        .get(100)
        .await
        .expect("get");
    assert!(found.is_none());
}

#[tokio::test]
async fn test_filter_rejects_undeclared_column() {
    let records = memory_records();
    let err = records
        .objects::<User>()
        .filter(Filter::new().eq("first_name", "Bill"))
        .await
        .expect_err("undeclared column");
    assert!(matches!(err, RepositoryError::UnknownColumn { .. }));
}
