//! # Quantity Module
//!
//! Provides the `Quantity` type for stock amounts.
//!
//! ## Why Fixed-Point Quantity?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE LEDGER REPLAY PROBLEM                                              │
//! │                                                                         │
//! │  With floating point:                                                   │
//! │    0.1 + 0.2 - 0.3 = 0.00000000000000005  ❌ history ≠ stock level       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer thousandths                                      │
//! │    100 + 200 - 300 = 0                                                 │
//! │    Summing every change_qty always reproduces the stock level exactly  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use depot_core::quantity::Quantity;
//!
//! let received = Quantity::from_units(28);
//! let damaged: Quantity = "2".parse().unwrap();
//! assert_eq!((received + damaged).to_string(), "30");
//!
//! let kg: Quantity = "12.5".parse().unwrap();
//! assert_eq!(kg.milli(), 12_500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// Number of stored sub-units per whole unit (three decimal places).
pub const QUANTITY_SCALE: i64 = 1000;

/// A stock amount in thousandths of a unit.
///
/// Signed so the same type carries deltas (`-30` for a mutation leaving
/// the source warehouse) as well as levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    /// Zero quantity.
    pub const ZERO: Quantity = Quantity(0);

    /// Creates a quantity from whole units.
    ///
    /// ## Example
    /// ```rust
    /// use depot_core::quantity::Quantity;
    ///
    /// assert_eq!(Quantity::from_units(3).milli(), 3000);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * QUANTITY_SCALE)
    }

    /// Creates a quantity from thousandths of a unit.
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Returns the raw value in thousandths.
    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit part (truncated toward zero).
    #[inline]
    pub const fn whole_units(&self) -> i64 {
        self.0 / QUANTITY_SCALE
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Quantity(self.0.abs())
    }

    /// Adds two quantities, returning `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Quantity) -> Option<Quantity> {
        self.0.checked_add(other.0).map(Quantity)
    }
}

impl fmt::Display for Quantity {
    /// Renders with trailing fractional zeros trimmed: `100`, `12.5`, `-0.125`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / QUANTITY_SCALE as u64;
        let frac = abs % QUANTITY_SCALE as u64;

        if frac == 0 {
            return write!(f, "{}{}", sign, whole);
        }

        let digits = format!("{:03}", frac);
        write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
    }
}

impl FromStr for Quantity {
    type Err = ValidationError;

    /// Parses a decimal string with at most three fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (whole_str, frac_str) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole_str.is_empty() && frac_str.is_empty() {
            return Err(invalid("empty value"));
        }
        if frac_str.len() > 3 {
            return Err(invalid("at most 3 decimal places"));
        }
        if !whole_str.chars().chain(frac_str.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a decimal number"));
        }

        let whole: i64 = if whole_str.is_empty() {
            0
        } else {
            whole_str.parse().map_err(|_| invalid("value too large"))?
        };
        let frac: i64 = if frac_str.is_empty() {
            0
        } else {
            format!("{:0<3}", frac_str)
                .parse()
                .map_err(|_| invalid("must be a decimal number"))?
        };

        let milli = whole
            .checked_mul(QUANTITY_SCALE)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(|| invalid("value too large"))?;

        Ok(Quantity(if negative { -milli } else { milli }))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::ZERO
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl SubAssign for Quantity {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Quantity {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Quantity(-self.0)
    }
}

impl std::iter::Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::ZERO, |acc, q| acc + q)
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
        assert_eq!(Quantity::from_units(100).to_string(), "100");
        assert_eq!(Quantity::from_milli(12_500).to_string(), "12.5");
        assert_eq!(Quantity::from_milli(-125).to_string(), "-0.125");
        assert_eq!(Quantity::from_units(-8).to_string(), "-8");
        assert_eq!(Quantity::ZERO.to_string(), "0");
    }

    #[test]
    fn test_parse() {
        assert_eq!("42".parse::<Quantity>().unwrap(), Quantity::from_units(42));
        assert_eq!("0.5".parse::<Quantity>().unwrap(), Quantity::from_milli(500));
        assert_eq!(".25".parse::<Quantity>().unwrap(), Quantity::from_milli(250));
        assert_eq!("-3.1".parse::<Quantity>().unwrap(), Quantity::from_milli(-3100));

        assert!("".parse::<Quantity>().is_err());
        assert!("1.2345".parse::<Quantity>().is_err());
        assert!("1e3".parse::<Quantity>().is_err());
        assert!("ten".parse::<Quantity>().is_err());
    }

    #[test]
    fn test_arithmetic() {
        let sent = Quantity::from_units(30);
        let received = Quantity::from_units(28);
        let damaged = Quantity::from_units(2);

        assert_eq!(sent - received - damaged, Quantity::ZERO);
        assert_eq!(-sent, Quantity::from_units(-30));
        assert_eq!((received - sent).abs(), damaged);
    }

    #[test]
    fn test_sum_of_deltas() {
        // 0.1 + 0.2 - 0.3 stays exact
        let deltas = [
            Quantity::from_milli(100),
            Quantity::from_milli(200),
            Quantity::from_milli(-300),
        ];
        let total: Quantity = deltas.into_iter().sum();
        assert!(total.is_zero());
    }

    #[test]
    fn test_sign_checks() {
        assert!(Quantity::from_units(1).is_positive());
        assert!(Quantity::from_units(-1).is_negative());
        assert!(!Quantity::ZERO.is_positive());
        assert!(!Quantity::ZERO.is_negative());
    }
}
