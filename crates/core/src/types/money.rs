//! Decimal money amounts.
//!
//! WePay reports amounts with two decimal places. Amounts are held as
//! [`Decimal`] so that balances never pick up floating point drift, and are
//! normalised to exactly two places the way a `NUMERIC(11, 2)` column would
//! store them.

use core::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Money`] amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The input string is empty.
    #[error("amount cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("invalid amount {input:?}: {reason}")]
    Invalid {
        /// The rejected input.
        input: String,
        /// Why the decimal parser rejected it.
        reason: String,
    },
}

/// A monetary amount with two decimal places.
///
/// ## Examples
///
/// ```
/// use wepay_records_core::Money;
///
/// let amount = Money::parse("10.5").unwrap();
/// assert_eq!(amount.to_string(), "10.50");
///
/// // Halves round away from zero
/// assert_eq!(Money::parse("0.125").unwrap().to_string(), "0.13");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Number of decimal places stored.
    pub const SCALE: u32 = 2;

    /// Zero, as `0.00`.
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, Self::SCALE));

    /// Create an amount, rounding to two decimal places.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        let mut rounded =
            amount.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(Self::SCALE);
        Self(rounded)
    }

    /// Parse an amount from its decimal text.
    ///
    /// Accepts plain (`"12.5"`) and scientific (`"1.25e1"`) notation.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or not a decimal number.
    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::Empty);
        }

        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(Self::new)
            .map_err(|e| MoneyError::Invalid {
                input: s.to_owned(),
                reason: e.to_string(),
            })
    }

    /// Returns the underlying decimal.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl From<Money> for serde_json::Value {
    fn from(money: Money) -> Self {
        Self::String(money.to_string())
    }
}
