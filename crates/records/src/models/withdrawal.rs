//! Withdrawal.

use serde::{Deserialize, Serialize};
use wepay_records_core::{AccountId, Money, WithdrawalId, WithdrawalState};

use super::{default_true, wepay_entity};
use crate::schema::WITHDRAWAL;

/// Money moved out of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub withdrawal_id: WithdrawalId,
    pub account_id: AccountId,
    pub state: WithdrawalState,
    pub withdrawal_uri: String,
    pub amount: Option<Money>,
    pub note: String,
    #[serde(default = "default_true")]
    pub recipient_confirmed: bool,
    pub create_time: i64,
    #[serde(default)]
    pub deleted: bool,
}

wepay_entity!(Withdrawal, WITHDRAWAL, withdrawal_id);
