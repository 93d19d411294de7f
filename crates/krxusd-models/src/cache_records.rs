use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The `krxusd:stock:realtime:{SYMBOL}` cache record, TTL 120s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedRealtimePrice {
  pub symbol: String,
  pub open: Decimal,
  pub high: Decimal,
  pub low: Decimal,
  pub close: Decimal,
  pub volume: i64,
  pub change: Decimal,
  pub change_pct: Decimal,
  pub price_date: NaiveDate,
  pub fx: Option<Decimal>,
  pub close_usd: Option<Decimal>,
  pub source: String,
  pub updated_at: DateTime<Utc>,
}
