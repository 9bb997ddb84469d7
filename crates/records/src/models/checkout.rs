//! Single checkout.

use serde::{Deserialize, Serialize};
use wepay_records_core::{AccountId, AddressId, CheckoutId, CheckoutState, FeePayer, Money, PreapprovalId};

use super::{default_true, wepay_entity};
use crate::schema::CHECKOUT;

/// One payment into an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkout {
    pub checkout_id: CheckoutId,
    pub account_id: AccountId,
    pub state: CheckoutState,
    pub amount: Money,
    pub fee: Option<Money>,
    pub gross: Option<Money>,
    pub app_fee: Money,
    #[serde(default)]
    pub fee_payer: FeePayer,
    pub payer_email: String,
    pub payer_name: String,
    #[serde(default)]
    pub cancel_reason: String,
    #[serde(default)]
    pub refund_reason: String,
    #[serde(default = "default_true")]
    pub auto_capture: bool,
    #[serde(default)]
    pub require_shipping: bool,
    pub shipping_address_id: Option<AddressId>,
    pub amount_refunded: Option<Money>,
    pub create_time: i64,
    /// Preapproval this checkout was charged against, if any.
    pub preapproval_id: Option<PreapprovalId>,
    #[serde(default)]
    pub deleted: bool,
}

wepay_entity!(Checkout, CHECKOUT, checkout_id);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_declared_defaults() {
        let checkout: Checkout = serde_json::from_value(json!({
            "checkout_id": 9,
            "account_id": 3,
            "state": "charged back",
            "amount": "25.00",
            "app_fee": "0.00",
            "payer_email": "payer@example.com",
            "payer_name": "Payer",
            "create_time": 1_367_958_263
        }))
        .unwrap();

        assert!(checkout.auto_capture);
        assert!(!checkout.require_shipping);
        assert_eq!(checkout.fee_payer, FeePayer::Payer);
        assert_eq!(checkout.cancel_reason, "");
        assert_eq!(checkout.state, CheckoutState::ChargedBack);
        assert_eq!(checkout.shipping_address_id, None);
    }
}
