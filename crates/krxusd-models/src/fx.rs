use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The only currency pair this service converts: USD per one KRW unit's
/// counterpart, expressed as KRW per 1 USD (the provider convention).
pub const USD_KRW_PAIR: &str = "USD/KRW";

/// A dated exchange rate as persisted in `exchange_rates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
  pub pair: String,
  pub rate_date: NaiveDate,
  pub rate: Decimal,
  pub source: String,
}

/// The cached realtime FX quote (`krxusd:exchange:realtime`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxRealtime {
  pub rate: Decimal,
  pub pair: String,
  pub source: String,
  pub updated_at: DateTime<Utc>,
}

/// A single per-minute FX sample appended to the daily sorted set
/// `krxusd:exchange:minute:{date}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxMinuteSample {
  pub rate: Decimal,
  pub sampled_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn exchange_rate_serializes_decimal_as_string_not_float() {
    let rate = ExchangeRate {
      pair: USD_KRW_PAIR.to_string(),
      rate_date: NaiveDate::from_ymd_opt(2025, 3, 17).unwrap(),
      rate: "1450.50".parse().unwrap(),
      source: "krx".to_string(),
    };
    let json = serde_json::to_string(&rate).unwrap();
    assert!(json.contains("\"1450.50\"") || json.contains("1450.50"));
  }
}
