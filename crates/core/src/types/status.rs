//! Choice enumerations for WePay entity states.
//!
//! Each enumeration is closed and persisted as the exact string WePay uses on
//! the wire (`"charged back"` included), so stored values round-trip to the
//! API unchanged.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not one of an enumeration's values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind} value: {value:?}")]
pub struct ChoiceError {
    /// Name of the enumeration.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Declares a closed string enumeration with its wire values.
macro_rules! choices {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The string persisted for this value.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ChoiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(ChoiceError {
                        kind: stringify!($name),
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

choices! {
    /// State of a WePay user.
    UserState {
        Registered => "registered",
        /// The user has not confirmed their email yet.
        Pending => "pending",
    }
}

choices! {
    /// Verification state of a WePay account.
    AccountVerificationState {
        Unverified => "unverified",
        Pending => "pending",
        Verified => "verified",
    }
}

choices! {
    /// Kind of WePay account.
    AccountType {
        Personal => "personal",
        Nonprofit => "nonprofit",
        Business => "business",
    }
}

choices! {
    /// State of a recurring-payment preapproval.
    PreapprovalState {
        New => "new",
        Approved => "approved",
        Expired => "expired",
        Revoked => "revoked",
        Cancelled => "cancelled",
        Stopped => "stopped",
        Completed => "completed",
        /// A charge failed and WePay is retrying it.
        Retrying => "retrying",
    }
}

choices! {
    /// Billing period of a preapproval.
    PreapprovalPeriod {
        Hourly => "hourly",
        Daily => "daily",
        Weekly => "weekly",
        Biweekly => "biweekly",
        Monthly => "monthly",
        Bimonthly => "bimonthly",
        Quarterly => "quarterly",
        Yearly => "yearly",
        Once => "once",
    }
}

choices! {
    /// State of a checkout.
    CheckoutState {
        New => "new",
        Authorized => "authorized",
        Reserved => "reserved",
        Captured => "captured",
        Settled => "settled",
        Cancelled => "cancelled",
        Refunded => "refunded",
        ChargedBack => "charged back",
        Failed => "failed",
        Expired => "expired",
    }
}

choices! {
    /// Party paying the WePay fee.
    #[derive(Default)]
    FeePayer {
        #[default]
        Payer => "payer",
        Payee => "payee",
    }
}

choices! {
    /// State of a withdrawal.
    WithdrawalState {
        New => "new",
        Started => "started",
        Captured => "captured",
        Settled => "settled",
        Cancelled => "cancelled",
        Failed => "failed",
        Expired => "expired",
    }
}
