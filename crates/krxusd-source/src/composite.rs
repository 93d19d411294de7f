use crate::trait_def::PriceSource;
use chrono::NaiveDate;
use krxusd_core::Error;
use krxusd_models::{DailyBar, Market, RealtimeQuote, Stock};
use std::sync::Arc;
use tracing::{instrument, warn};

/// `PriceSource = CompositePriceSource(adapters: Adapter[])`: an
/// ordered list of providers tried in sequence, first success wins.
///
/// `fetch_daily` returns an empty series (not an error) when every
/// adapter fails, so callers can distinguish "no trading day in range"
/// from "fetch failed"; `fetch_realtime` surfaces `SourceExhausted`
/// with every adapter's reason since a realtime caller has no such
/// ambiguity to resolve.
pub struct CompositePriceSource {
  adapters: Vec<Arc<dyn PriceSource>>,
}

impl CompositePriceSource {
  /// Adapters are registered at startup, in priority order; the core
  /// never names them again after construction.
  pub fn new(adapters: Vec<Arc<dyn PriceSource>>) -> Self {
    CompositePriceSource { adapters }
  }

  #[instrument(skip(self))]
  pub async fn fetch_realtime(&self, symbol: &str) -> Result<RealtimeQuote, Error> {
    let mut reasons = Vec::new();
    for adapter in &self.adapters {
      match adapter.fetch_realtime(symbol).await {
        Ok(quote) => return Ok(quote),
        Err(err) => {
          warn!(adapter = adapter.name(), %err, "realtime fetch failed, trying next adapter");
          reasons.push((adapter.name().to_string(), err.to_string()));
        }
      }
    }
    Err(Error::SourceExhausted { reasons })
  }

  #[instrument(skip(self))]
  pub async fn fetch_daily(
    &self,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<DailyBar>, Error> {
    for adapter in &self.adapters {
      match adapter.fetch_daily(symbol, start, end).await {
        Ok(bars) => return Ok(bars),
        Err(err) => {
          warn!(adapter = adapter.name(), %err, "daily fetch failed, trying next adapter");
        }
      }
    }
    // All adapters failed: return an empty series rather than an
    // error, per the PriceSource design — the caller cannot tell this
    // apart from "no trading day in range" and is not meant to.
    Ok(Vec::new())
  }

  #[instrument(skip(self))]
  pub async fn list_master(&self, market: Market) -> Result<Vec<Stock>, Error> {
    let mut reasons = Vec::new();
    for adapter in &self.adapters {
      match adapter.list_master(market).await {
        Ok(stocks) => return Ok(stocks),
        Err(err) => reasons.push((adapter.name().to_string(), err.to_string())),
      }
    }
    Err(Error::SourceExhausted { reasons })
  }

  pub async fn top_by_marcap(&self, n: usize) -> Result<Vec<String>, Error> {
    self.try_in_order(|a| {
      let a = a.clone();
      Box::pin(async move { a.top_by_marcap(n).await })
    })
    .await
  }

  pub async fn top_by_volume(&self, n: usize) -> Result<Vec<String>, Error> {
    self.try_in_order(|a| {
      let a = a.clone();
      Box::pin(async move { a.top_by_volume(n).await })
    })
    .await
  }

  pub async fn fx_rate(&self) -> Result<rust_decimal::Decimal, Error> {
    self.fx_rate_with_source().await.map(|(rate, _)| rate)
  }

  /// Like `fx_rate`, but also reports which adapter's quote won, for
  /// `FxService::current_rate`'s `{rate, source, updatedAt}` record.
  #[instrument(skip(self))]
  pub async fn fx_rate_with_source(&self) -> Result<(rust_decimal::Decimal, &'static str), Error> {
    let mut reasons = Vec::new();
    for adapter in &self.adapters {
      match adapter.fx_rate().await {
        Ok(rate) => return Ok((rate, adapter.name())),
        Err(err) => reasons.push((adapter.name().to_string(), err.to_string())),
      }
    }
    Err(Error::SourceExhausted { reasons })
  }

  async fn try_in_order<T>(
    &self,
    call: impl Fn(
      &Arc<dyn PriceSource>,
    ) -> std::pin::Pin<
      Box<dyn std::future::Future<Output = Result<T, crate::error::AdapterError>> + Send>,
    >,
  ) -> Result<T, Error> {
    let mut reasons = Vec::new();
    for adapter in &self.adapters {
      match call(adapter).await {
        Ok(value) => return Ok(value),
        Err(err) => reasons.push((adapter.name().to_string(), err.to_string())),
      }
    }
    Err(Error::SourceExhausted { reasons })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::AdapterError;
  use async_trait::async_trait;
  use rust_decimal::Decimal;
  use std::sync::atomic::{AtomicUsize, Ordering};

  struct FlakyAdapter {
    name: &'static str,
    calls: AtomicUsize,
    fails: bool,
  }

  #[async_trait]
  impl PriceSource for FlakyAdapter {
    fn name(&self) -> &'static str {
      self.name
    }

    async fn fetch_realtime(&self, symbol: &str) -> Result<RealtimeQuote, AdapterError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if self.fails {
        Err(AdapterError::Http("boom".to_string()))
      } else {
        Ok(RealtimeQuote {
          symbol: symbol.to_string(),
          open: Decimal::ZERO,
          high: Decimal::ZERO,
          low: Decimal::ZERO,
          close: Decimal::ZERO,
          volume: 0,
          change: Decimal::ZERO,
          change_pct: Decimal::ZERO,
          price_date: NaiveDate::from_ymd_opt(2025, 3, 17).unwrap(),
          source: self.name.to_string(),
        })
      }
    }

    async fn fetch_daily(
      &self,
      _symbol: &str,
      _start: NaiveDate,
      _end: NaiveDate,
    ) -> Result<Vec<DailyBar>, AdapterError> {
      if self.fails {
        Err(AdapterError::Http("boom".to_string()))
      } else {
        Ok(Vec::new())
      }
    }

    async fn list_master(&self, _market: Market) -> Result<Vec<Stock>, AdapterError> {
      Err(AdapterError::NotFound("unsupported".to_string()))
    }

    async fn top_by_marcap(&self, _n: usize) -> Result<Vec<String>, AdapterError> {
      Err(AdapterError::NotFound("unsupported".to_string()))
    }

    async fn top_by_volume(&self, _n: usize) -> Result<Vec<String>, AdapterError> {
      Err(AdapterError::NotFound("unsupported".to_string()))
    }

    async fn fx_rate(&self) -> Result<Decimal, AdapterError> {
      Err(AdapterError::NotFound("unsupported".to_string()))
    }
  }

  #[tokio::test]
  async fn fetch_realtime_falls_through_to_the_next_adapter_on_failure() {
    let first = Arc::new(FlakyAdapter { name: "first", calls: AtomicUsize::new(0), fails: true });
    let second =
      Arc::new(FlakyAdapter { name: "second", calls: AtomicUsize::new(0), fails: false });
    let composite = CompositePriceSource::new(vec![first.clone(), second.clone()]);

    let quote = composite.fetch_realtime("005930").await.unwrap();
    assert_eq!(quote.source, "second");
    assert_eq!(first.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn fetch_realtime_surfaces_source_exhausted_when_all_fail() {
    let only = Arc::new(FlakyAdapter { name: "only", calls: AtomicUsize::new(0), fails: true });
    let composite = CompositePriceSource::new(vec![only]);

    let err = composite.fetch_realtime("005930").await.unwrap_err();
    assert!(matches!(err, krxusd_core::Error::SourceExhausted { .. }));
  }

  #[tokio::test]
  async fn fetch_daily_returns_empty_series_not_an_error_when_all_fail() {
    let only = Arc::new(FlakyAdapter { name: "only", calls: AtomicUsize::new(0), fails: true });
    let composite = CompositePriceSource::new(vec![only]);

    let bars = composite
      .fetch_daily("005930", NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), NaiveDate::from_ymd_opt(2025, 3, 17).unwrap())
      .await
      .unwrap();
    assert!(bars.is_empty());
  }
}
