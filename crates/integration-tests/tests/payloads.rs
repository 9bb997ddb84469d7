//! Payload whitelisting, truncation, money and nested addresses.

use serde_json::{Value, json};
use wepay_records::schema::ALL;
use wepay_records::{
    Account, Address, Checkout, Entity, Filter, Preapproval, RepositoryError, User,
};
use wepay_records_integration_tests::{
    account_payload, address_payload, checkout_payload, memory_records, preapproval_payload,
    seed_tree, user_payload,
};

#[tokio::test]
async fn test_long_strings_keep_exactly_max_length_characters() {
    let records = memory_records();
    let mut payload = user_payload(1);
    payload["user_name"] = json!("é".repeat(80));
    payload["email"] = json!(format!("{}@example.com", "a".repeat(100)));

    let user = records.objects::<User>().create(payload).await.expect("create");

    assert_eq!(user.user_name, "é".repeat(61));
    assert_eq!(user.email.chars().count(), 75);
    assert!(user.email.starts_with("aaaa"));
}

#[test]
fn test_every_bounded_field_truncates() {
    for schema in ALL {
        for field in schema.fields {
            let Some(max_length) = field.max_length() else {
                continue;
            };
            let long = "x".repeat(max_length + 10);
            let prepared = wepay_records::payload::prepare(
                schema,
                json!({ field.name: long }).as_object().cloned().expect("object"),
            )
            .expect("prepare");
            let stored = prepared.row[field.column].as_str().expect("string");
            assert_eq!(stored.chars().count(), max_length, "{}.{}", schema.table, field.name);
        }
    }
}

#[tokio::test]
async fn test_undeclared_keys_are_dropped() {
    let records = memory_records();
    let user = records
        .objects::<User>()
        .create(user_payload(1))
        .await
        .expect("create");

    let row = serde_json::to_value(&user).expect("serialize");
    assert!(row.get("first_name").is_none());
    assert!(row.get("token_type").is_none());
}

#[tokio::test]
async fn test_money_is_stored_with_two_places() {
    let records = memory_records();
    let tree = seed_tree(&records).await;

    assert_eq!(tree.preapproval.amount.to_string(), "19.99");
    assert_eq!(tree.preapproval.app_fee.to_string(), "0.00");
    assert_eq!(tree.account.pending_balance.to_string(), "10.00");

    let matched = records
        .objects::<Checkout>()
        .filter(Filter::new().eq("amount", 25))
        .await
        .expect("filter by amount");
    assert_eq!(matched.len(), 2);
}

#[tokio::test]
async fn test_nested_address_creates_linked_row() {
    let records = memory_records();
    let tree = seed_tree(&records).await;

    let address_id = tree
        .preapproval
        .shipping_address_id
        .expect("preapproval links an address");
    let address = records
        .objects::<Address>()
        .get(address_id)
        .await
        .expect("get")
        .expect("address exists");
    assert_eq!(address.city, "Palo Alto");
    assert_eq!(address.state, "CA");

    let mut payload = checkout_payload(2000, 10);
    payload["shipping_address"] = address_payload();
    let checkout = records
        .objects::<Checkout>()
        .create(payload)
        .await
        .expect("create checkout");
    let checkout_address = checkout.shipping_address_id.expect("checkout links an address");
    assert_ne!(checkout_address, address_id);
    assert_eq!(records.store().count(Address::SCHEMA).await, 2);
}

#[tokio::test]
async fn test_nested_address_fields_are_truncated() {
    let records = memory_records();
    seed_tree(&records).await;
    let mut payload = preapproval_payload(101, 10);
    payload["shipping_address"]["state"] = json!("California");

    let preapproval = records
        .objects::<Preapproval>()
        .create(payload)
        .await
        .expect("create");
    let address = records
        .objects::<Address>()
        .get(preapproval.shipping_address_id.expect("linked"))
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(address.state, "Ca");
}

#[tokio::test]
async fn test_unknown_choice_is_rejected() {
    let records = memory_records();
    records.objects::<User>().create(user_payload(1)).await.expect("user");
    let mut payload = account_payload(10, 1);
    payload["type"] = json!("charity");

    let err = records
        .objects::<Account>()
        .create(payload)
        .await
        .expect_err("unknown account type");
    assert!(matches!(err, RepositoryError::InvalidRecord { .. }));
}

#[tokio::test]
async fn test_reference_to_missing_account_conflicts() {
    let records = memory_records();
    let err = records
        .objects::<Checkout>()
        .create(checkout_payload(1000, 99))
        .await
        .expect_err("no account 99");
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

#[tokio::test]
async fn test_non_object_payload_is_rejected() {
    let records = memory_records();
    let err = records
        .objects::<User>()
        .create(Value::Array(vec![user_payload(1)]))
        .await
        .expect_err("array payload");
    assert!(matches!(err, RepositoryError::InvalidRecord { .. }));
    assert!(records.objects::<User>().all().await.expect("users").is_empty());
    assert_eq!(User::SCHEMA.table, "wepay_user");
}
