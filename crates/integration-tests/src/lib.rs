//! Integration tests for WePay Records.
//!
//! # Running Tests
//!
//! ```bash
//! # Behaviour tests (in-memory store)
//! cargo test -p wepay-records-integration-tests
//!
//! # Include the PostgreSQL round-trips
//! WEPAY_TEST_DATABASE_URL=postgres://localhost/wepay_test \
//!     cargo test -p wepay-records-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `soft_delete` - Default read scope and soft deletion
//! - `cascade` - Ownership cascade, soft and hard
//! - `payloads` - Whitelisting, truncation, money, nested addresses
//! - `revive` - Revive-or-create and field-by-field updates
//! - `postgres` - The same flows against a live database
//!
//! This crate holds fixtures shared by the test files: WePay-shaped payloads
//! and a small account tree.

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use serde_json::{Value, json};
use wepay_records::{
    Account, Checkout, MemoryStore, Preapproval, Records, RecordsConfig, RowStore, User,
    Withdrawal,
};

/// Records context over an empty in-memory store, default configuration.
#[must_use]
pub fn memory_records() -> Records<MemoryStore> {
    memory_records_with(RecordsConfig::default())
}

/// Records context over an empty in-memory store.
#[must_use]
pub fn memory_records_with(config: RecordsConfig) -> Records<MemoryStore> {
    Records::new(MemoryStore::new(), config)
}

/// `/user` response.
#[must_use]
pub fn user_payload(user_id: i64) -> Value {
    json!({
        "user_id": user_id,
        "access_token": "STAGE_8a19aff55b85a436dad5cd1386db1999437facb5914b494f4da5f206a56a5d20",
        "token_type": "BEARER",
        "user_name": "Bill Clerico",
        "first_name": "Bill",
        "last_name": "Clerico",
        "email": "bill@example.com",
        "state": "registered",
        "expires": null
    })
}

/// `/account` response.
#[must_use]
pub fn account_payload(account_id: i64, user_id: i64) -> Value {
    json!({
        "account_id": account_id,
        "name": "Acme",
        "description": "Widgets, wholesale",
        "account_uri": format!("https://stage.wepay.com/account/{account_id}"),
        "payment_limit": null,
        "verification_state": "unverified",
        "type": "business",
        "pending_balance": "10.00",
        "available_balance": "0.00",
        "currency": "USD",
        "user_id": user_id
    })
}

/// Address as nested in checkout and preapproval responses.
#[must_use]
pub fn address_payload() -> Value {
    json!({
        "address1": "380 Portage Ave",
        "address2": "",
        "city": "Palo Alto",
        "state": "CA",
        "zip": "94306",
        "country": "US",
        "name": "Bill Clerico"
    })
}

/// `/preapproval` response.
#[must_use]
pub fn preapproval_payload(preapproval_id: i64, account_id: i64) -> Value {
    json!({
        "preapproval_id": preapproval_id,
        "preapproval_uri": format!("https://stage.wepay.com/api/preapproval/{preapproval_id}"),
        "manage_uri": format!("https://stage.wepay.com/preapproval/view/{preapproval_id}"),
        "account_id": account_id,
        "short_description": "Monthly widgets",
        "amount": 19.99,
        "fee_payer": "payee",
        "state": "approved",
        "app_fee": 0,
        "period": "monthly",
        "start_time": 1_367_958_263,
        "end_time": 1_399_494_263,
        "payer_email": "payer@example.com",
        "payer_name": "Pat Payer",
        "require_shipping": true,
        "shipping_address": address_payload(),
        "create_time": 1_367_958_263
    })
}

/// `/checkout` response.
#[must_use]
pub fn checkout_payload(checkout_id: i64, account_id: i64) -> Value {
    json!({
        "checkout_id": checkout_id,
        "account_id": account_id,
        "state": "captured",
        "short_description": "One widget",
        "amount": "25.00",
        "fee": "1.03",
        "gross": "26.03",
        "app_fee": "0.00",
        "fee_payer": "payer",
        "payer_email": "payer@example.com",
        "payer_name": "Pat Payer",
        "auto_capture": true,
        "require_shipping": false,
        "shipping_address": null,
        "amount_refunded": null,
        "create_time": 1_367_958_263,
        "preapproval_id": null
    })
}

/// `/withdrawal` response.
#[must_use]
pub fn withdrawal_payload(withdrawal_id: i64, account_id: i64) -> Value {
    json!({
        "withdrawal_id": withdrawal_id,
        "account_id": account_id,
        "state": "new",
        "withdrawal_uri": format!("https://stage.wepay.com/api/withdrawal/{withdrawal_id}"),
        "redirect_uri": "https://example.com/withdrawn",
        "amount": null,
        "note": "Payout",
        "recipient_confirmed": false,
        "create_time": 1_367_958_263
    })
}

/// A user with one account that has one preapproval and two checkouts.
#[derive(Debug, Clone)]
pub struct Tree {
    pub user: User,
    pub account: Account,
    pub preapproval: Preapproval,
    pub checkouts: Vec<Checkout>,
}

/// Create user 1, account 10, preapproval 100 and checkouts 1000 and 1001.
pub async fn seed_tree<S: RowStore>(records: &Records<S>) -> Tree {
    let user = records
        .objects::<User>()
        .create(user_payload(1))
        .await
        .expect("create user");
    let account = records
        .objects::<Account>()
        .create(account_payload(10, 1))
        .await
        .expect("create account");
    let preapproval = records
        .objects::<Preapproval>()
        .create(preapproval_payload(100, 10))
        .await
        .expect("create preapproval");
    let mut checkouts = Vec::new();
    for checkout_id in [1000, 1001] {
        checkouts.push(
            records
                .objects::<Checkout>()
                .create(checkout_payload(checkout_id, 10))
                .await
                .expect("create checkout"),
        );
    }

    Tree {
        user,
        account,
        preapproval,
        checkouts,
    }
}

/// Add withdrawal 5000 to account 10.
pub async fn seed_withdrawal<S: RowStore>(records: &Records<S>) -> Withdrawal {
    records
        .objects::<Withdrawal>()
        .create(withdrawal_payload(5000, 10))
        .await
        .expect("create withdrawal")
}
