//! Recurring-payment preapproval.

use serde::{Deserialize, Serialize};
use wepay_records_core::{
    AccountId, AddressId, FeePayer, Money, PreapprovalId, PreapprovalPeriod, PreapprovalState,
};

use super::wepay_entity;
use crate::schema::PREAPPROVAL;

/// A payer's authorization for an account to charge them repeatedly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preapproval {
    pub preapproval_id: PreapprovalId,
    pub preapproval_uri: String,
    pub manage_uri: String,
    pub account_id: AccountId,
    pub amount: Money,
    #[serde(default)]
    pub fee_payer: FeePayer,
    pub state: PreapprovalState,
    pub app_fee: Money,
    pub period: PreapprovalPeriod,
    pub start_time: i64,
    pub end_time: i64,
    pub payer_email: String,
    pub payer_name: String,
    #[serde(default)]
    pub require_shipping: bool,
    /// Linked shipping address, written through the nested `shipping_address`
    /// payload field.
    pub shipping_address_id: Option<AddressId>,
    pub create_time: i64,
    #[serde(default)]
    pub deleted: bool,
}

wepay_entity!(Preapproval, PREAPPROVAL, preapproval_id);
