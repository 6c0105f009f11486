//! Money amounts in minor currency units.
//!
//! The cart API reports every amount as an integer number of cents. Display
//! goes through [`rust_decimal::Decimal`] so formatting never touches floats.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a price input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceParseError {
    /// The input contained nothing but currency decoration.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
    /// The amount does not fit in minor units.
    #[error("price out of range")]
    OutOfRange,
}

/// An amount of money in minor units (cents).
///
/// ```
/// use storefront_cart_core::Money;
///
/// assert_eq!(Money::from_cents(1999).to_string(), "$19.99");
/// assert_eq!(Money::parse("$1,234.50").unwrap(), Money::from_cents(123_450));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Create an amount from minor units.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Amount in minor units.
    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Amount as a decimal in major units (e.g., dollars).
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Parse a user-entered price such as `"$1,234.50"` into minor units.
    ///
    /// Dollar signs and thousands separators are ignored; fractional cents
    /// are rounded to the nearest cent, halves away from zero.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing numeric remains, the number is malformed,
    /// or the amount overflows.
    pub fn parse(input: &str) -> Result<Self, PriceParseError> {
        let cleaned: String = input
            .chars()
            .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
            .collect();

        if cleaned.is_empty() {
            return Err(PriceParseError::Empty);
        }

        let amount: Decimal = cleaned
            .parse()
            .map_err(|_| PriceParseError::Invalid(input.to_string()))?;

        let cents = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(PriceParseError::OutOfRange)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

        cents
            .to_i64()
            .map(Self)
            .ok_or(PriceParseError::OutOfRange)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self.as_decimal();
        if amount.is_sign_negative() {
            write!(f, "-${:.2}", amount.abs())
        } else {
            write!(f, "${amount:.2}")
        }
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}
