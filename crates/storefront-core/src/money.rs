//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The REST API speaks JSON numbers:                                      │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (paise / cents)                      │
//! │    Floats are converted ONCE at the HTTP boundary, rounded to the      │
//! │    nearest minor unit. Every sum after that is exact, so "rounded to   │
//! │    2 decimal places" holds by construction.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::money::Money;
//!
//! let price = Money::from_cents(2800); // 28.00
//! let line = price * 2;                // 56.00
//! assert_eq!(line.to_major_f64(), 56.0);
//!
//! // Wire values are converted at the boundary only
//! assert_eq!(Money::from_major_f64(10.005), Money::from_cents(1001));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: subtraction never wraps; validation rejects negatives
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serde as cents**: what the UI shell receives; the REST API gets floats
///   through [`Money::to_major_f64`]
///
/// ## Where Money Flows
/// ```text
/// Product.unit_price ──┬──► pricing::compute_line_amount ──► LineItem.amount
/// Flavour/AddOn.price ─┤                                         │
/// Product.parcel_price ┘                                         ▼
///                                           pricing::compute_order_total
///                                                                │
///                                                                ▼
///                                          order payload "totalAmount": 56.0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from a decimal amount in major units.
    ///
    /// Only for values arriving over the wire. Rounds half away from zero to
    /// the nearest minor unit; non-finite input becomes zero.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_f64(28.5).cents(), 2850);
    /// assert_eq!(Money::from_major_f64(f64::NAN), Money::zero());
    /// ```
    pub fn from_major_f64(value: f64) -> Self {
        if !value.is_finite() {
            return Money::zero();
        }
        // Round the shortest decimal form once: 10.005 is read as written,
        // not as 10.00499999...
        let text = value.abs().to_string();
        let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
        let digit = |i: usize| {
            fraction
                .as_bytes()
                .get(i)
                .map_or(0, |b| i64::from(b.wrapping_sub(b'0')))
        };

        let whole: i64 = whole.parse().unwrap_or(i64::MAX);
        let mut cents = whole
            .saturating_mul(100)
            .saturating_add(digit(0) * 10 + digit(1));
        if digit(2) >= 5 {
            cents = cents.saturating_add(1);
        }
        Money(if value < 0.0 { -cents } else { cents })
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value as a decimal in major units, for wire payloads.
    #[inline]
    pub fn to_major_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity, saturating instead of overflowing.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(2800);
    /// assert_eq!(unit_price.multiply_quantity(2).cents(), 5600);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

// =============================================================================
// Parsing (user-entered amounts)
// =============================================================================

/// Parses a user-entered decimal such as `"45"`, `"45.5"` or `"45.50"`.
///
/// At most two fractional digits are accepted; anything else is rejected
/// rather than silently rounded.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (major, minor) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };

        if major.is_empty() && minor.is_empty() {
            return Err(invalid("not a number"));
        }
        if minor.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }
        if !major.chars().chain(minor.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid("not a number"));
        }

        let major: i64 = if major.is_empty() {
            0
        } else {
            major.parse().map_err(|_| invalid("too large"))?
        };
        let minor: i64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().map_err(|_| invalid("not a number"))? * 10,
            _ => minor.parse().map_err(|_| invalid("not a number"))?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money with two decimals. The UI shell does its own localized
/// formatting; this is for logs and notifications.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.major().abs(), self.minor())
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

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Wire Helpers
// =============================================================================

/// Serde adapter for amounts sent by the REST API in major units.
///
/// Accepts JSON numbers and numeric strings (`28`, `28.5`, `"28.50"`).
///
/// ```rust
/// use serde::Deserialize;
/// use storefront_core::money::{self, Money};
///
/// #[derive(Deserialize)]
/// struct Row {
///     #[serde(with = "money::major_units")]
///     price: Money,
/// }
///
/// let row: Row = serde_json::from_str(r#"{"price":"12.50"}"#).unwrap();
/// assert_eq!(row.price, Money::from_cents(1250));
/// ```
pub mod major_units {
    use super::Money;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WireAmount {
        Number(f64),
        Text(String),
    }

    fn to_money<E: serde::de::Error>(wire: WireAmount) -> Result<Money, E> {
        match wire {
            WireAmount::Number(n) => Ok(Money::from_major_f64(n)),
            WireAmount::Text(s) => s.parse().map_err(E::custom),
        }
    }

    pub fn serialize<S: Serializer>(value: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.to_major_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        to_money(WireAmount::deserialize(deserializer)?)
    }

    /// Same as the parent module, for optional fields (`null` → `None`).
    pub mod option {
        use super::{to_money, Money, WireAmount};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<Money>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(m) => serializer.serialize_some(&m.to_major_f64()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Money>, D::Error> {
            Option::<WireAmount>::deserialize(deserializer)?
                .map(to_money)
                .transpose()
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_f64_rounds_to_nearest_minor_unit() {
        assert_eq!(Money::from_major_f64(56.0).cents(), 5600);
        assert_eq!(Money::from_major_f64(0.1 + 0.2).cents(), 30);
        assert_eq!(Money::from_major_f64(10.005).cents(), 1001);
        assert_eq!(Money::from_major_f64(-4.5).cents(), -450);
        assert_eq!(Money::from_major_f64(-0.125).cents(), -13);
        assert_eq!(Money::from_major_f64(0.0000001).cents(), 0);
        assert_eq!(Money::from_major_f64(f64::INFINITY).cents(), 0);
    }

    #[test]
    fn test_from_major_f64_rounds_only_once() {
        assert_eq!(Money::from_major_f64(1.2346).cents(), 123);
        assert_eq!(Money::from_major_f64(10.0049).cents(), 1000);
        assert_eq!(Money::from_major_f64(1.2349999).cents(), 123);
        assert_eq!(Money::from_major_f64(40.1).cents(), 4010);
        assert_eq!(Money::from_major_f64(1e30).cents(), i64::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(5600)), "₹56.00");
        assert_eq!(format!("{}", Money::from_cents(5)), "₹0.05");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-₹5.50");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_parse_user_input() {
        assert_eq!("45".parse::<Money>().unwrap().cents(), 4500);
        assert_eq!("45.5".parse::<Money>().unwrap().cents(), 4550);
        assert_eq!(" 45.05 ".parse::<Money>().unwrap().cents(), 4505);
        assert_eq!(".5".parse::<Money>().unwrap().cents(), 50);
        assert_eq!("-2".parse::<Money>().unwrap().cents(), -200);

        assert!(matches!(
            "".parse::<Money>(),
            Err(ValidationError::Required { .. })
        ));
        assert!("4.555".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!(".".parse::<Money>().is_err());
        assert!("1e3".parse::<Money>().is_err());
    }

    #[test]
    fn test_major_units_serde() {
        #[derive(Serialize, Deserialize)]
        struct Row {
            #[serde(with = "major_units")]
            price: Money,
            #[serde(default, with = "major_units::option")]
            parcel: Option<Money>,
        }

        let row: Row = serde_json::from_str(r#"{"price": 20, "parcel": "5.50"}"#).unwrap();
        assert_eq!(row.price.cents(), 2000);
        assert_eq!(row.parcel, Some(Money::from_cents(550)));

        let row: Row = serde_json::from_str(r#"{"price": 3.25, "parcel": null}"#).unwrap();
        assert_eq!(row.price.cents(), 325);
        assert_eq!(row.parcel, None);

        let json = serde_json::to_value(&Row {
            price: Money::from_cents(5600),
            parcel: None,
        })
        .unwrap();
        assert_eq!(json["price"], serde_json::json!(56.0));
        assert!(json["parcel"].is_null());

        assert!(serde_json::from_str::<Row>(r#"{"price": "free"}"#).is_err());
    }

    #[test]
    fn test_multiply_quantity_saturates() {
        let huge = Money::from_cents(i64::MAX / 2);
        assert_eq!(huge.multiply_quantity(4).cents(), i64::MAX);
    }
}
