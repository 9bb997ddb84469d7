//! Ownership cascade on delete.

use wepay_records::{
    Account, Address, Checkout, Deletion, Entity, Filter, Preapproval, RecordsConfig,
    RepositoryError, User, Withdrawal,
};
use wepay_records_integration_tests::{
    account_payload, address_payload, memory_records, memory_records_with, seed_tree,
    seed_withdrawal,
};

fn purge() -> RecordsConfig {
    RecordsConfig {
        retain_records: false,
        ..RecordsConfig::default()
    }
}

#[tokio::test]
async fn test_soft_delete_user_flags_whole_tree() {
    let records = memory_records();
    let mut tree = seed_tree(&records).await;

    records
        .delete(&mut tree.user, Deletion::Default)
        .await
        .expect("delete user");

    assert!(tree.user.deleted);
    let store = records.store();
    assert_eq!(store.count(User::SCHEMA).await, 1);
    assert_eq!(store.count(Account::SCHEMA).await, 1);
    assert_eq!(store.count(Preapproval::SCHEMA).await, 1);
    assert_eq!(store.count(Checkout::SCHEMA).await, 2);

    assert!(records.objects::<User>().all().await.expect("users").is_empty());
    assert!(records.objects::<Account>().all().await.expect("accounts").is_empty());
    assert!(records.objects::<Preapproval>().all().await.expect("preapprovals").is_empty());
    assert!(records.objects::<Checkout>().all().await.expect("checkouts").is_empty());
    let deleted = records
        .objects::<Checkout>()
        .filter(Filter::new().deleted(true))
        .await
        .expect("deleted checkouts");
    assert_eq!(deleted.len(), 2);
}

#[tokio::test]
async fn test_hard_delete_user_removes_whole_tree() {
    let records = memory_records_with(purge());
    let mut tree = seed_tree(&records).await;

    records
        .delete(&mut tree.user, Deletion::Default)
        .await
        .expect("delete user");

    let store = records.store();
    assert_eq!(store.count(User::SCHEMA).await, 0);
    assert_eq!(store.count(Account::SCHEMA).await, 0);
    assert_eq!(store.count(Preapproval::SCHEMA).await, 0);
    assert_eq!(store.count(Checkout::SCHEMA).await, 0);
    // Addresses are not owned; the preapproval's link is gone with it
    assert_eq!(store.count(Address::SCHEMA).await, 1);
}

#[tokio::test]
async fn test_hard_delete_includes_soft_deleted_children() {
    let records = memory_records();
    let mut tree = seed_tree(&records).await;
    let mut checkout = tree.checkouts[0].clone();
    records
        .delete(&mut checkout, Deletion::Soft)
        .await
        .expect("soft delete checkout");

    records
        .delete(&mut tree.account, Deletion::Hard)
        .await
        .expect("hard delete account");

    assert_eq!(records.store().count(Checkout::SCHEMA).await, 0);
    assert_eq!(records.store().count(Account::SCHEMA).await, 0);
    assert_eq!(records.store().count(User::SCHEMA).await, 1);
}

#[tokio::test]
async fn test_explicit_soft_overrides_purge_config() {
    let records = memory_records_with(purge());
    let mut tree = seed_tree(&records).await;

    records
        .delete(&mut tree.account, Deletion::Soft)
        .await
        .expect("soft delete account");

    assert_eq!(records.store().count(Account::SCHEMA).await, 1);
    assert_eq!(records.store().count(Checkout::SCHEMA).await, 2);
    assert!(records.objects::<Checkout>().all().await.expect("checkouts").is_empty());
}

#[tokio::test]
async fn test_withdrawals_are_not_cascaded_by_default() {
    let records = memory_records();
    let mut tree = seed_tree(&records).await;
    seed_withdrawal(&records).await;

    records
        .delete(&mut tree.account, Deletion::Soft)
        .await
        .expect("soft delete account");
    let withdrawals = records.objects::<Withdrawal>().all().await.expect("withdrawals");
    assert_eq!(withdrawals.len(), 1);

    let err = records
        .delete(&mut tree.account, Deletion::Hard)
        .await
        .expect_err("withdrawal still references the account");
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

#[tokio::test]
async fn test_refused_hard_delete_leaves_tree_intact() {
    let records = memory_records_with(purge());
    let mut tree = seed_tree(&records).await;
    seed_withdrawal(&records).await;

    let err = records
        .delete(&mut tree.user, Deletion::Default)
        .await
        .expect_err("withdrawal still references the account");
    assert!(matches!(err, RepositoryError::Conflict(_)));

    let store = records.store();
    assert_eq!(store.count(User::SCHEMA).await, 1);
    assert_eq!(store.count(Account::SCHEMA).await, 1);
    assert_eq!(store.count(Preapproval::SCHEMA).await, 1);
    assert_eq!(store.count(Checkout::SCHEMA).await, 2);
    assert_eq!(store.count(Withdrawal::SCHEMA).await, 1);
    assert!(!tree.user.deleted);
}

#[tokio::test]
async fn test_cascade_withdrawals_opt_in() {
    let records = memory_records_with(RecordsConfig {
        retain_records: false,
        cascade_withdrawals: true,
    });
    let mut tree = seed_tree(&records).await;
    seed_withdrawal(&records).await;

    records
        .delete(&mut tree.user, Deletion::Default)
        .await
        .expect("delete user");

    assert_eq!(records.store().count(Withdrawal::SCHEMA).await, 0);
    assert_eq!(records.store().count(User::SCHEMA).await, 0);
}

#[tokio::test]
async fn test_soft_delete_leaves_sibling_accounts_alone() {
    let records = memory_records();
    let tree = seed_tree(&records).await;
    let mut other = records
        .objects::<Account>()
        .create(account_payload(11, 1))
        .await
        .expect("second account");

    records
        .delete(&mut other, Deletion::Soft)
        .await
        .expect("delete second account");

    let active = records.objects::<Account>().all().await.expect("accounts");
    assert_eq!(active, vec![tree.account]);
    assert_eq!(records.objects::<Checkout>().all().await.expect("checkouts").len(), 2);
}

#[tokio::test]
async fn test_delete_unsaved_address_is_not_found() {
    let records = memory_records();
    let mut address: Address = serde_json::from_value(address_payload()).expect("address");

    let err = records
        .delete(&mut address, Deletion::Default)
        .await
        .expect_err("never stored");
    assert!(matches!(err, RepositoryError::NotFound));
}
