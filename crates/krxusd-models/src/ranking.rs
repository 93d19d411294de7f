use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five ranking kinds the `popular_stocks` table and the
/// `krxusd:popular:*` cache namespace distinguish. `MarketCap` is
/// tracked as a ranking dimension even though the table's check
/// constraint only lists `{volume, value, gain, loss}` for persisted
/// rows; market-cap rankings are cache-only, refreshed each batch run
/// but not persisted to `popular_stocks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingType {
  Volume,
  Value,
  Gain,
  Loss,
  MarketCap,
}

impl fmt::Display for RankingType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      RankingType::Volume => "volume",
      RankingType::Value => "value",
      RankingType::Gain => "gain",
      RankingType::Loss => "loss",
      RankingType::MarketCap => "market_cap",
    };
    write!(f, "{s}")
  }
}

impl RankingType {
  /// The subset of ranking types that are persisted to the
  /// `popular_stocks` table, bound by its check constraint.
  pub fn is_persisted(self) -> bool {
    !matches!(self, RankingType::MarketCap)
  }
}

/// One entry in a ranking snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
  pub rank: i32,
  pub symbol: String,
  pub value: Decimal,
}

/// A full ranking snapshot, as cached under `krxusd:popular:{kind}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingSnapshot {
  pub ranking_type: RankingType,
  pub entries: Vec<RankingEntry>,
  pub computed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_market_cap_is_excluded_from_persistence() {
    assert!(!RankingType::MarketCap.is_persisted());
    assert!(RankingType::Volume.is_persisted());
    assert!(RankingType::Value.is_persisted());
    assert!(RankingType::Gain.is_persisted());
    assert!(RankingType::Loss.is_persisted());
  }
}
