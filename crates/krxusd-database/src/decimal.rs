use crate::error::{DbError, DbResult};
use bigdecimal::BigDecimal;
use rust_decimal::Decimal;
use std::str::FromStr;

/// The domain model (`krxusd-models`) uses `rust_decimal::Decimal`
/// everywhere; diesel's `Numeric` SQL type maps to `bigdecimal::BigDecimal`
/// under this workspace's `diesel` "numeric" feature. Both types are
/// exact base-10 decimals, so the conversion is a lossless string
/// round-trip rather than a lossy float cast.
pub fn to_bigdecimal(d: Decimal) -> BigDecimal {
  BigDecimal::from_str(&d.to_string()).expect("rust_decimal output is valid decimal syntax")
}

pub fn to_bigdecimal_opt(d: Option<Decimal>) -> Option<BigDecimal> {
  d.map(to_bigdecimal)
}

pub fn from_bigdecimal(b: &BigDecimal) -> DbResult<Decimal> {
  Decimal::from_str(&b.to_string()).map_err(|e| DbError::Decimal(e.to_string()))
}

pub fn from_bigdecimal_opt(b: &Option<BigDecimal>) -> DbResult<Option<Decimal>> {
  b.as_ref().map(from_bigdecimal).transpose()
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  #[test]
  fn round_trips_through_bigdecimal_without_precision_loss() {
    let original = dec!(1450.5678);
    let big = to_bigdecimal(original);
    let back = from_bigdecimal(&big).unwrap();
    assert_eq!(original, back);
  }
}
