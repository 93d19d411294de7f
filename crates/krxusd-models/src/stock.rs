use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three listing venues that together make up the Korea Exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
  Kospi,
  Kosdaq,
  Konex,
}

impl fmt::Display for Market {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Market::Kospi => "KOSPI",
      Market::Kosdaq => "KOSDAQ",
      Market::Konex => "KONEX",
    };
    write!(f, "{s}")
  }
}

impl std::str::FromStr for Market {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_uppercase().as_str() {
      "KOSPI" => Ok(Market::Kospi),
      "KOSDAQ" => Ok(Market::Kosdaq),
      "KONEX" => Ok(Market::Konex),
      other => Err(format!("unknown market: {other}")),
    }
  }
}

/// Master record for a single KRX-listed security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
  pub symbol: String,
  pub name: String,
  pub name_en: Option<String>,
  pub market: Market,
  pub sector: Option<String>,
  pub industry: Option<String>,
  pub listed_shares: Option<i64>,
  pub listing_date: Option<NaiveDate>,
  pub is_active: bool,
}

impl Stock {
  /// Normalize a raw symbol the way every entry point into the system
  /// (provider adapters, CLI args, cache keys) must before using it as
  /// an identity.
  pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
  }
}

/// One trading day's OHLCV bar as delivered by a `PriceSource` adapter,
/// prior to persistence or USD materialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
  pub price_date: NaiveDate,
  pub open: Decimal,
  pub high: Decimal,
  pub low: Decimal,
  pub close: Decimal,
  pub volume: i64,
  pub trading_value: Option<Decimal>,
  pub market_cap: Option<Decimal>,
}

impl DailyBar {
  /// `low ≤ open,close ≤ high ∧ volume ≥ 0`, the invariant every stored
  /// `StockPriceDaily` row must satisfy.
  pub fn is_valid(&self) -> bool {
    self.low <= self.open
      && self.open <= self.high
      && self.low <= self.close
      && self.close <= self.high
      && self.volume >= 0
  }
}

/// A stock's daily bar as persisted, including the denormalized USD
/// close captured at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPriceDaily {
  pub symbol: String,
  pub price_date: NaiveDate,
  pub open: Decimal,
  pub high: Decimal,
  pub low: Decimal,
  pub close: Decimal,
  pub volume: i64,
  pub trading_value: Option<Decimal>,
  pub market_cap: Option<Decimal>,
  pub exchange_rate: Option<Decimal>,
  pub close_price_usd: Option<Decimal>,
}

/// A realtime quote as returned by `PriceSource::fetch_realtime`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeQuote {
  pub symbol: String,
  pub open: Decimal,
  pub high: Decimal,
  pub low: Decimal,
  pub close: Decimal,
  pub volume: i64,
  pub change: Decimal,
  pub change_pct: Decimal,
  pub price_date: NaiveDate,
  pub source: String,
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  #[test]
  fn normalizes_symbol_case_and_whitespace() {
    assert_eq!(Stock::normalize_symbol("  005930 "), "005930");
    assert_eq!(Stock::normalize_symbol("005930.ks"), "005930.KS");
  }

  #[test]
  fn market_round_trips_through_display_and_from_str() {
    for m in [Market::Kospi, Market::Kosdaq, Market::Konex] {
      let s = m.to_string();
      assert_eq!(s.parse::<Market>().unwrap(), m);
    }
  }

  #[test]
  fn daily_bar_validity_rejects_inverted_high_low() {
    let bar = DailyBar {
      price_date: NaiveDate::from_ymd_opt(2025, 3, 17).unwrap(),
      open: dec!(100),
      high: dec!(90),
      low: dec!(95),
      close: dec!(92),
      volume: 1000,
      trading_value: None,
      market_cap: None,
    };
    assert!(!bar.is_valid());
  }

  #[test]
  fn daily_bar_validity_accepts_ordinary_bar() {
    let bar = DailyBar {
      price_date: NaiveDate::from_ymd_opt(2025, 3, 17).unwrap(),
      open: dec!(100),
      high: dec!(105),
      low: dec!(98),
      close: dec!(101),
      volume: 1000,
      trading_value: None,
      market_cap: None,
    };
    assert!(bar.is_valid());
  }
}
