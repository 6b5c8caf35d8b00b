//! Host fixed-decimal values
//!
//! Finite values are backed by `rust_decimal`. A host decimal may also be
//! NaN or infinite (parsed from `"NaN"`, `"Infinity"`, ...); such values
//! can be held by a record but are rejected whenever they are dumped.

use std::fmt;
use std::str::FromStr;

use rust_decimal::RoundingStrategy;
use thiserror::Error;

/// Largest number of fractional digits a fixed decimal can carry
pub const MAX_PLACES: u32 = 28;

/// A decimal value as held by a record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decimal {
    /// A finite value
    Finite(rust_decimal::Decimal),
    /// Not a number
    NaN,
    /// Positive or negative infinity
    Infinity {
        /// Sign of the infinity
        negative: bool,
    },
}

/// Failure to parse a decimal string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal literal '{0}'")]
pub struct DecimalParseError(pub String);

impl Decimal {
    /// `num * 10^-scale`
    pub fn new(num: i64, scale: u32) -> Self {
        Decimal::Finite(rust_decimal::Decimal::new(num, scale))
    }

    /// Returns true for NaN
    pub fn is_nan(&self) -> bool {
        matches!(self, Decimal::NaN)
    }

    /// Returns true for finite values
    pub fn is_finite(&self) -> bool {
        matches!(self, Decimal::Finite(_))
    }

    /// The finite value, if any
    pub fn as_finite(&self) -> Option<rust_decimal::Decimal> {
        match self {
            Decimal::Finite(d) => Some(*d),
            _ => None,
        }
    }

    /// Rounds half-to-even to `places` and pads to exactly `places`
    /// fractional digits.
    ///
    /// Returns `None` for non-finite values and for values whose integer
    /// part leaves no room for `places` digits.
    pub fn quantize(&self, places: u32) -> Option<rust_decimal::Decimal> {
        let mut d = self
            .as_finite()?
            .round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven);
        d.rescale(places);
        (d.scale() == places).then_some(d)
    }

    /// Text form with exactly `places` fractional digits, no exponent.
    pub fn to_fixed_string(&self, places: u32) -> Option<String> {
        self.quantize(places).map(|d| d.to_string())
    }
}

impl From<rust_decimal::Decimal> for Decimal {
    fn from(d: rust_decimal::Decimal) -> Self {
        Decimal::Finite(d)
    }
}

impl From<i64> for Decimal {
    fn from(n: i64) -> Self {
        Decimal::Finite(rust_decimal::Decimal::from(n))
    }
}

impl FromStr for Decimal {
    type Err = DecimalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        match unsigned.to_ascii_lowercase().as_str() {
            "nan" | "snan" => return Ok(Decimal::NaN),
            "inf" | "infinity" => return Ok(Decimal::Infinity { negative }),
            _ => {}
        }

        rust_decimal::Decimal::from_str(trimmed)
            .or_else(|_| rust_decimal::Decimal::from_scientific(trimmed))
            .map(Decimal::Finite)
            .map_err(|_| DecimalParseError(s.to_string()))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decimal::Finite(d) => write!(f, "{}", d),
            Decimal::NaN => write!(f, "NaN"),
            Decimal::Infinity { negative: true } => write!(f, "-Infinity"),
            Decimal::Infinity { negative: false } => write!(f, "Infinity"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_string_pads() {
        assert_eq!(Decimal::from(42).to_fixed_string(4).unwrap(), "42.0000");
        assert_eq!(Decimal::new(15, 1).to_fixed_string(2).unwrap(), "1.50");
        assert_eq!(Decimal::from(7).to_fixed_string(0).unwrap(), "7");
    }

    #[test]
    fn test_fixed_string_rounds_half_even() {
        assert_eq!(Decimal::new(12345, 4).to_fixed_string(3).unwrap(), "1.234");
        assert_eq!(Decimal::new(12355, 4).to_fixed_string(3).unwrap(), "1.236");
        assert_eq!(Decimal::new(-25, 1).to_fixed_string(0).unwrap(), "-2");
    }

    #[test]
    fn test_no_exponent() {
        let d: Decimal = "1e-7".parse().unwrap();
        assert_eq!(d.to_fixed_string(8).unwrap(), "0.00000010");

        let d: Decimal = "1.5e3".parse().unwrap();
        assert_eq!(d.to_fixed_string(1).unwrap(), "1500.0");
    }

    #[test]
    fn test_non_finite_has_no_fixed_form() {
        assert!(Decimal::NaN.to_fixed_string(2).is_none());
        assert!(Decimal::Infinity { negative: true }.to_fixed_string(2).is_none());
    }

    #[test]
    fn test_parse_special_values() {
        assert!("NaN".parse::<Decimal>().unwrap().is_nan());
        assert_eq!(
            "-Infinity".parse::<Decimal>().unwrap(),
            Decimal::Infinity { negative: true }
        );
        assert_eq!("inf".parse::<Decimal>().unwrap(), Decimal::Infinity { negative: false });
        assert!("abc".parse::<Decimal>().is_err());
        assert!("".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Decimal::new(4200, 2).to_string(), "42.00");
        assert_eq!(Decimal::NaN.to_string(), "NaN");
    }
}
