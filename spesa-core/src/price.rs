//! Monetary amounts as integer euro-cents.
//!
//! Prices observed on receipts are exact decimal values; storing them as
//! integer cents keeps comparisons total and sums exact, the same way
//! travel distances are held as whole metres rather than floats.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An exact monetary amount in euro-cents.
///
/// # Examples
/// ```
/// use spesa_core::Price;
///
/// let latte = Price::from_cents(120);
/// assert_eq!(latte.to_string(), "1.20");
/// assert!(latte > Price::from_cents(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(u64);

/// Errors returned by [`Price::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceParseError {
    /// The input was empty after trimming.
    #[error("price string is empty")]
    Empty,
    /// The input was not a non-negative decimal number.
    #[error("invalid price {input:?}")]
    Invalid {
        /// Offending input string.
        input: String,
    },
}

impl Price {
    /// Zero cents.
    pub const ZERO: Self = Self(0);

    /// Construct a price from a cent count.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// The amount in cents.
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Parse a decimal price string.
    ///
    /// Accepts `.` or `,` as the decimal separator (receipts from Italian
    /// tills use the comma) and at most two fractional digits.
    ///
    /// # Errors
    /// Returns [`PriceParseError`] for empty, negative, or non-decimal input.
    ///
    /// # Examples
    /// ```
    /// use spesa_core::Price;
    ///
    /// assert_eq!(Price::parse("1.20"), Ok(Price::from_cents(120)));
    /// assert_eq!(Price::parse("0,90"), Ok(Price::from_cents(90)));
    /// assert_eq!(Price::parse("3"), Ok(Price::from_cents(300)));
    /// assert!(Price::parse("-1").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, PriceParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PriceParseError::Empty);
        }
        let normalized = trimmed.replace(',', ".");
        let invalid = || PriceParseError::Invalid {
            input: input.to_owned(),
        };

        let mut parts = normalized.splitn(2, '.');
        let whole = parts.next().ok_or_else(invalid)?;
        let frac = parts.next().unwrap_or("");
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if frac.len() > 2 {
            return Err(invalid());
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac_cents: u64 = if frac.is_empty() {
            0
        } else {
            let parsed: u64 = frac.parse().map_err(|_| invalid())?;
            if frac.len() == 1 { parsed * 10 } else { parsed }
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac_cents))
            .map(Self)
            .ok_or_else(invalid)
    }

    /// Convert a floating-point euro amount, rounding to the nearest cent.
    ///
    /// Returns `None` for negative or non-finite values.
    #[must_use]
    pub fn from_euros(euros: f64) -> Option<Self> {
        if !euros.is_finite() || euros < 0.0 {
            return None;
        }
        let cents = (euros * 100.0).round();
        if cents > u64::MAX as f64 {
            return None;
        }
        Some(Self(cents as u64))
    }

    /// Add two prices, saturating at the representable maximum.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Subtract `other`, returning `None` when it exceeds `self`.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Scale by a quantity, rounding to the nearest cent.
    ///
    /// Returns `None` for negative or non-finite quantities. Used when a
    /// line total has to be derived from a unit price and a weight.
    #[must_use]
    pub fn scale_by(self, quantity: f64) -> Option<Self> {
        if !quantity.is_finite() || quantity < 0.0 {
            return None;
        }
        let cents = (self.0 as f64 * quantity).round();
        if cents > u64::MAX as f64 {
            return None;
        }
        Some(Self(cents as u64))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Self::parse(&text).map_err(de::Error::custom),
            Raw::Number(value) => Self::from_euros(value)
                .ok_or_else(|| de::Error::custom(format!("invalid price {value}"))),
        }
    }
}
