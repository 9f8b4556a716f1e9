//! Product price backed by decimal arithmetic.
//!
//! Prices travel as decimal text on the wire (`"12.50"`), never as floats.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Accepted price input: digits with an optional one- or two-digit fraction.
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9][0-9]?)?$").expect("Invalid regex"));

/// Errors that can occur when parsing a [`Price`] from form input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price is required")]
    Empty,
    /// The input does not look like `123` or `123.45`.
    #[error("enter numbers only (e.g., 123 or 123.45)")]
    Pattern,
}

/// A product price.
///
/// ## Examples
///
/// ```
/// use inventory_core::Price;
///
/// assert!(Price::parse("19.99").is_ok());
/// assert!(Price::parse("20").is_ok());
/// assert!(Price::parse("1.999").is_err());
/// assert!(Price::parse("-3").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Parse a price from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or does not match the
    /// `digits[.d[d]]` pattern.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PriceError::Empty);
        }

        if !PRICE_RE.is_match(s) {
            return Err(PriceError::Pattern);
        }

        s.parse::<Decimal>().map(Self).map_err(|_| PriceError::Pattern)
    }

    /// Wrap an existing decimal amount.
    #[must_use]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Wire representation with two decimal places, e.g. `"12.50"`.
    #[must_use]
    pub fn to_wire(&self) -> String {
        format!("{:.2}", self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl std::str::FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_prices() {
        assert!(Price::parse("0").is_ok());
        assert!(Price::parse("123").is_ok());
        assert!(Price::parse("123.4").is_ok());
        assert!(Price::parse("123.45").is_ok());
        assert!(Price::parse(" 9.99 ").is_ok());
    }

    #[test]
    fn test_parse_rejects_bad_patterns() {
        assert_eq!(Price::parse(""), Err(PriceError::Empty));
        assert_eq!(Price::parse("abc"), Err(PriceError::Pattern));
        assert_eq!(Price::parse("1.234"), Err(PriceError::Pattern));
        assert_eq!(Price::parse(".5"), Err(PriceError::Pattern));
        assert_eq!(Price::parse("-1"), Err(PriceError::Pattern));
        assert_eq!(Price::parse("1,50"), Err(PriceError::Pattern));
    }

    #[test]
    fn test_wire_format_has_two_places() {
        assert_eq!(Price::parse("12.5").unwrap().to_wire(), "12.50");
        assert_eq!(Price::parse("3").unwrap().to_string(), "3.00");
    }

    #[test]
    fn test_deserializes_from_decimal_text() {
        let price: Price = serde_json::from_str("\"49.99\"").unwrap();
        assert_eq!(price, Price::parse("49.99").unwrap());
    }
}
