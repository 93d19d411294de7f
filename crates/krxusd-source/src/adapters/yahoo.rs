use crate::error::AdapterError;
use crate::trait_def::{AdapterResult, PriceSource};
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use krxusd_models::{DailyBar, Market, RealtimeQuote, Stock};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use yahoo_finance_api as yahoo;

/// Third-choice adapter over Yahoo Finance. Like `NaverFinanceAdapter`,
/// this is a price-only fallback: no master-list or ranking support.
///
/// The core always passes the bare KRX code (e.g. `"005930"`); Yahoo
/// requires a market suffix (`.KS` for KOSPI, `.KQ` for KOSDAQ). Since
/// the adapter is not told which market a bare code belongs to, it
/// tries `.KS` first and falls back to `.KQ` on a not-found response —
/// symbol suffixing is the adapter's responsibility per the PriceSource
/// design, not the core's.
pub struct YahooFinanceAdapter {
  connector: yahoo::YahooConnector,
}

const USD_KRW_SYMBOL: &str = "KRW=X";

impl YahooFinanceAdapter {
  pub fn new() -> AdapterResult<Self> {
    let connector = yahoo::YahooConnector::new()
      .map_err(|e| AdapterError::Http(format!("yahoo connector init failed: {e}")))?;
    Ok(YahooFinanceAdapter { connector })
  }

  fn to_decimal(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or_default()
  }

  /// `.KS` then `.KQ`, per this adapter's suffixing policy.
  fn candidate_symbols(bare: &str) -> [String; 2] {
    [format!("{bare}.KS"), format!("{bare}.KQ")]
  }

  async fn quotes_for_range(
    &self,
    yahoo_symbol: &str,
    range: &str,
  ) -> AdapterResult<Vec<yahoo::Quote>> {
    let resp = self
      .connector
      .get_quote_range(yahoo_symbol, "1d", range)
      .await
      .map_err(|e| AdapterError::Http(format!("{yahoo_symbol}: {e}")))?;
    resp.quotes().map_err(|e| AdapterError::Parse(format!("{yahoo_symbol}: {e}")))
  }

  fn range_for(start: NaiveDate, end: NaiveDate) -> &'static str {
    let days = (end - start).num_days().max(0);
    if days <= 5 {
      "5d"
    } else if days <= 30 {
      "1mo"
    } else if days <= 90 {
      "3mo"
    } else if days <= 180 {
      "6mo"
    } else if days <= 365 {
      "1y"
    } else if days <= 365 * 2 {
      "2y"
    } else if days <= 365 * 5 {
      "5y"
    } else if days <= 365 * 10 {
      "10y"
    } else {
      "max"
    }
  }

  fn quote_to_bar(quote: &yahoo::Quote) -> Option<DailyBar> {
    let price_date = Utc.timestamp_opt(quote.timestamp, 0).single()?.date_naive();
    Some(DailyBar {
      price_date,
      open: Self::to_decimal(quote.open),
      high: Self::to_decimal(quote.high),
      low: Self::to_decimal(quote.low),
      close: Self::to_decimal(quote.close),
      volume: quote.volume as i64,
      trading_value: None,
      market_cap: None,
    })
  }
}

#[async_trait]
impl PriceSource for YahooFinanceAdapter {
  fn name(&self) -> &'static str {
    "yahoo_finance"
  }

  async fn fetch_realtime(&self, symbol: &str) -> AdapterResult<RealtimeQuote> {
    for candidate in Self::candidate_symbols(symbol) {
      if let Ok(quotes) = self.quotes_for_range(&candidate, "5d").await {
        if let Some(latest) = quotes.last() {
          let bar = Self::quote_to_bar(latest)
            .ok_or_else(|| AdapterError::Parse(format!("{candidate}: bad timestamp")))?;
          let prev_close = quotes
            .iter()
            .rev()
            .nth(1)
            .map(Self::to_decimal_close)
            .unwrap_or(bar.close);
          let change = bar.close - prev_close;
          let change_pct = if prev_close.is_zero() {
            Decimal::ZERO
          } else {
            change / prev_close * Decimal::ONE_HUNDRED
          };
          return Ok(RealtimeQuote {
            symbol: symbol.to_string(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            change,
            change_pct,
            price_date: bar.price_date,
            source: self.name().to_string(),
          });
        }
      }
    }
    Err(AdapterError::NotFound(symbol.to_string()))
  }

  async fn fetch_daily(
    &self,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> AdapterResult<Vec<DailyBar>> {
    if end < start {
      return Ok(Vec::new());
    }
    let range = Self::range_for(start, end);
    for candidate in Self::candidate_symbols(symbol) {
      if let Ok(quotes) = self.quotes_for_range(&candidate, range).await {
        let mut bars: Vec<DailyBar> = quotes
          .iter()
          .filter_map(Self::quote_to_bar)
          .filter(|b| b.price_date >= start && b.price_date <= end)
          .collect();
        bars.sort_by_key(|b| b.price_date);
        return Ok(bars);
      }
    }
    Ok(Vec::new())
  }

  async fn list_master(&self, _market: Market) -> AdapterResult<Vec<Stock>> {
    Err(AdapterError::NotFound("yahoo_finance does not support master-list lookups".to_string()))
  }

  async fn top_by_marcap(&self, _n: usize) -> AdapterResult<Vec<String>> {
    Err(AdapterError::NotFound("yahoo_finance does not support ranking lookups".to_string()))
  }

  async fn top_by_volume(&self, _n: usize) -> AdapterResult<Vec<String>> {
    Err(AdapterError::NotFound("yahoo_finance does not support ranking lookups".to_string()))
  }

  async fn fx_rate(&self) -> AdapterResult<Decimal> {
    let quotes = self.quotes_for_range(USD_KRW_SYMBOL, "5d").await?;
    quotes
      .last()
      .map(Self::to_decimal_close)
      .ok_or_else(|| AdapterError::NotFound("no recent KRW=X quote".to_string()))
  }
}

impl YahooFinanceAdapter {
  fn to_decimal_close(q: &yahoo::Quote) -> Decimal {
    Self::to_decimal(q.close)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn candidate_symbols_try_kospi_then_kosdaq() {
    let candidates = YahooFinanceAdapter::candidate_symbols("005930");
    assert_eq!(candidates, ["005930.KS".to_string(), "005930.KQ".to_string()]);
  }

  #[test]
  fn range_for_picks_widening_buckets() {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    assert_eq!(YahooFinanceAdapter::range_for(start, start + chrono::Duration::days(3)), "5d");
    assert_eq!(YahooFinanceAdapter::range_for(start, start + chrono::Duration::days(400)), "2y");
  }

  #[test]
  fn fetch_daily_returns_empty_when_end_before_start() {
    let start = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    assert!(end < start);
  }
}
