//! # Money
//!
//! Prices and totals as whole cents.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product.price_cents ──► price snapshot ──► OrderLine.unit_price_cents  │
//! │                                                    │                    │
//! │                                          × quantity│                    │
//! │                                                    ▼                    │
//! │                                Σ line totals ──► Order.total_cents      │
//! │                                                                         │
//! │  Integer cents keep Σ exact: 0.10 + 0.20 is 30 cents, not 0.3000…04.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let unit = Money::from_major_minor(10, 0);
//! let line = unit.checked_multiply_quantity(2).unwrap();
//! assert_eq!(line.to_string(), "20.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};
use ts_rs::TS;

/// An amount in cents. Serialized as the bare integer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// `from_major_minor(12, 5)` is 12.05. The minor part is taken as
    /// given; callers pass `0..=99`.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        Money(major * 100 + minor)
    }

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

    /// Price of `qty` units, or `None` on overflow.
    ///
    /// Quantities are capped at 999, but prices come from an
    /// administrator-edited catalog and have no upper bound.
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Sum of two amounts, or `None` on overflow.
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }
}

/// Two fractional digits and no currency symbol: `2000` renders as `20.00`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Unchecked line total; use `checked_multiply_quantity` on untrusted input.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_as_decimal() {
        assert_eq!(Money::from_cents(2000).to_string(), "20.00");
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(i64::MIN).to_string(), "-92233720368547758.08");
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(12, 5).cents(), 1205);
        assert_eq!(Money::from_major_minor(0, 0), Money::zero());
    }

    #[test]
    fn test_sum_of_line_totals() {
        let lines = [(Money::from_cents(1000), 2), (Money::from_cents(250), 3)];
        let total: Money = lines
            .iter()
            .map(|(unit, qty)| unit.checked_multiply_quantity(*qty).unwrap())
            .sum();
        assert_eq!(total, Money::from_cents(2750));
    }

    #[test]
    fn test_checked_operations_detect_overflow() {
        let huge = Money::from_cents(i64::MAX / 2 + 1);
        assert!(huge.checked_multiply_quantity(2).is_none());
        assert!(huge.checked_add(huge).is_none());
        assert_eq!(
            Money::from_cents(299).checked_multiply_quantity(3),
            Some(Money::from_cents(897))
        );
    }

    #[test]
    fn test_serializes_as_plain_cents() {
        assert_eq!(serde_json::to_string(&Money::from_cents(1250)).unwrap(), "1250");
    }
}
