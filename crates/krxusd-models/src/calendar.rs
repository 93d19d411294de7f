use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// KRX market phase, as computed by `MarketCalendar::phase_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketPhase {
  PreMarket,
  MarketOpen,
  AfterHours,
  MarketClosed,
}

impl MarketPhase {
  /// `is_trading_time = phase ∈ {MARKET_OPEN, AFTER_HOURS}`.
  pub fn is_trading_time(self) -> bool {
    matches!(self, MarketPhase::MarketOpen | MarketPhase::AfterHours)
  }
}

impl fmt::Display for MarketPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      MarketPhase::PreMarket => "pre_market",
      MarketPhase::MarketOpen => "market_open",
      MarketPhase::AfterHours => "after_hours",
      MarketPhase::MarketClosed => "market_closed",
    };
    write!(f, "{s}")
  }
}

/// The `krxusd:market:status` cache payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStatus {
  pub status: MarketPhase,
  pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_open_and_after_hours_are_trading_time() {
    assert!(MarketPhase::MarketOpen.is_trading_time());
    assert!(MarketPhase::AfterHours.is_trading_time());
    assert!(!MarketPhase::PreMarket.is_trading_time());
    assert!(!MarketPhase::MarketClosed.is_trading_time());
  }
}
