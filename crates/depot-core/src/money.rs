//! # Money Module
//!
//! Provides the `Money` type for unit prices and sale totals.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    total_price = quantity × unit_price, computed in integers and       │
//! │    rounded half away from zero exactly once                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use depot_core::money::Money;
//! use depot_core::quantity::Quantity;
//!
//! let unit_price = Money::from_cents(1099);
//! let total = unit_price.times(Quantity::from_units(3)).unwrap();
//! assert_eq!(total.cents(), 3297);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use ts_rs::TS;

use crate::quantity::{Quantity, QUANTITY_SCALE};

/// A monetary value in the smallest currency unit (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use depot_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a (possibly fractional) quantity.
    ///
    /// Quantities carry three decimals, so the product is scaled back by
    /// 1000 with half-away-from-zero rounding. The product is taken in
    /// `i128`; `None` when the rounded total does not fit back into cents.
    ///
    /// ## Example
    /// ```rust
    /// use depot_core::money::Money;
    /// use depot_core::quantity::Quantity;
    ///
    /// let per_kg = Money::from_cents(250);
    /// let half_kg = Quantity::from_milli(500);
    /// assert_eq!(per_kg.times(half_kg).map(|m| m.cents()), Some(125));
    /// ```
    pub fn times(&self, quantity: Quantity) -> Option<Money> {
        let product = self.0 as i128 * quantity.milli() as i128;
        let scale = QUANTITY_SCALE as i128;
        let half = scale / 2;
        let rounded = if product >= 0 {
            (product + half) / scale
        } else {
            (product - half) / scale
        };
        i64::try_from(rounded).ok().map(Money)
    }
}

/// Debug-oriented display; currency formatting is the caller's concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_times_whole_units() {
        let unit_price = Money::from_cents(299);
        assert_eq!(unit_price.times(Quantity::from_units(3)), Some(Money::from_cents(897)));
    }

    #[test]
    fn test_times_rounds_half_away_from_zero() {
        // 0.333 × 1.50 = 0.4995 → 0.50
        let price = Money::from_cents(150);
        assert_eq!(price.times(Quantity::from_milli(333)), Some(Money::from_cents(50)));

        // 0.001 × 4.99 = 0.00499 → 0.00
        let price = Money::from_cents(499);
        assert_eq!(price.times(Quantity::from_milli(1)), Some(Money::zero()));
    }

    #[test]
    fn test_times_overflow_is_none() {
        // 1e11 × 1e10 = 1e21 cents, far past i64::MAX
        let price = Money::from_cents(10_000_000_000_000);
        let quantity = Quantity::from_units(10_000_000_000);
        assert_eq!(price.times(quantity), None);

        let price = Money::from_cents(i64::MAX);
        assert_eq!(price.times(Quantity::from_units(1)), Some(price));
        assert_eq!(price.times(Quantity::from_units(2)), None);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);
        assert_eq!((a + b).cents(), 1250);
        assert_eq!((a - b).cents(), 750);
    }
}
