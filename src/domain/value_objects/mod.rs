//! Value Objects for the apparel catalog and its money arithmetic

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Rounds an amount to currency precision (2 dp, half away from zero).
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a stock or order quantity to 3 dp.
pub fn round_quantity(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
}

/// `percent`% of `amount`, rounded to currency precision.
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    round_money(amount * percent / HUNDRED)
}

/// Product code (SKU). Stored upper-cased and trimmed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(SkuError::Empty); }
        if value.len() > 50 { return Err(SkuError::TooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl TryFrom<String> for Sku {
    type Error = SkuError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Sku> for String {
    fn from(sku: Sku) -> Self { sku.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkuError {
    #[error("product code must not be empty")]
    Empty,
    #[error("product code must be at most 50 characters")]
    TooLong,
}

/// A percentage in the closed range 0..=100 (tax rates, discounts, fees).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percentage(Decimal);

impl Percentage {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, PercentageError> {
        if value < Decimal::ZERO || value > HUNDRED {
            return Err(PercentageError::OutOfRange(value));
        }
        Ok(Self(value.normalize()))
    }

    pub fn value(&self) -> Decimal { self.0 }
    pub fn is_zero(&self) -> bool { self.0.is_zero() }

    /// This percentage of `amount`, rounded to currency precision.
    pub fn of(&self, amount: Decimal) -> Decimal { percent_of(amount, self.0) }
}

impl TryFrom<Decimal> for Percentage {
    type Error = PercentageError;
    fn try_from(value: Decimal) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Percentage> for Decimal {
    fn from(p: Percentage) -> Self { p.0 }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}%", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PercentageError {
    #[error("percentage {0} is outside 0..=100")]
    OutOfRange(Decimal),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sku() { let sku = Sku::new(" kur-001 ").unwrap(); assert_eq!(sku.as_str(), "KUR-001"); }

    #[test]
    fn test_sku_rejects_blank_and_long_codes() {
        assert_eq!(Sku::new("   "), Err(SkuError::Empty));
        assert_eq!(Sku::new("X".repeat(51)), Err(SkuError::TooLong));
    }

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(dec!(2.345)), dec!(2.35));
        assert_eq!(round_money(dec!(-2.345)), dec!(-2.35));
        assert_eq!(round_money(dec!(2.344)), dec!(2.34));
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(Percentage::new(dec!(-0.01)).is_err());
        assert!(Percentage::new(dec!(100.01)).is_err());
        assert_eq!(Percentage::new(dec!(12.5)).unwrap().of(dec!(999.99)), dec!(125.00));
    }

    #[test]
    fn test_percentage_deserialize_validates() {
        let ok: Percentage = serde_json::from_str("\"18\"").unwrap();
        assert_eq!(ok.value(), dec!(18));
        assert!(serde_json::from_str::<Percentage>("\"140\"").is_err());
    }
}
