//! WePay account.

use serde::{Deserialize, Serialize};
use wepay_records_core::{AccountId, AccountType, AccountVerificationState, Money, UserId};

use super::wepay_entity;
use crate::schema::ACCOUNT;

/// A WePay account belonging to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    pub name: String,
    pub description: String,
    pub account_uri: String,
    pub payment_limit: Option<Money>,
    pub verification_state: AccountVerificationState,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    #[serde(default)]
    pub pending_balance: Money,
    #[serde(default)]
    pub available_balance: Money,
    /// Owning user.
    pub user_id: UserId,
    #[serde(default)]
    pub verification_uri: String,
    #[serde(default)]
    pub deleted: bool,
}

wepay_entity!(Account, ACCOUNT, account_id);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_balances_default_to_zero() {
        let account: Account = serde_json::from_value(json!({
            "account_id": 3,
            "name": "Bake sale",
            "description": "Cookies",
            "account_uri": "https://stage.wepay.com/account/3",
            "verification_state": "unverified",
            "type": "personal",
            "user_id": 1
        }))
        .unwrap();

        assert_eq!(account.pending_balance.to_string(), "0.00");
        assert_eq!(account.available_balance, Money::ZERO);
        assert_eq!(account.payment_limit, None);
        assert_eq!(account.account_type, AccountType::Personal);
    }

    #[test]
    fn test_type_column_round_trips_through_rename() {
        let value = serde_json::to_value(Account {
            account_id: AccountId::new(3),
            name: String::new(),
            description: String::new(),
            account_uri: String::new(),
            payment_limit: Some(Money::parse("500").unwrap()),
            verification_state: AccountVerificationState::Verified,
            account_type: AccountType::Business,
            pending_balance: Money::ZERO,
            available_balance: Money::ZERO,
            user_id: UserId::new(1),
            verification_uri: String::new(),
            deleted: false,
        })
        .unwrap();

        assert_eq!(value["type"], json!("business"));
        assert_eq!(value["payment_limit"], json!("500.00"));
    }
}
