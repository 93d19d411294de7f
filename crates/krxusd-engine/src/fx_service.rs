//! C4 FxService: realtime and historical USD/KRW rate, cache-through
//! to `KVCache`, day-wise lookup with carry-forward on missing dates.

use chrono::{NaiveDate, Utc};
use krxusd_cache::FxCache;
use krxusd_calendar::MarketCalendar;
use krxusd_core::Result;
use krxusd_database::StockStore;
use krxusd_models::{ExchangeRate, FxMinuteSample, FxRealtime, USD_KRW_PAIR};
use krxusd_source::CompositePriceSource;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Carry-forward substitutes a missing dated FX rate with the most
/// recent earlier rate within this many days.
pub use krxusd_core::FX_CARRY_FORWARD_DAYS;

/// Realtime and historical USD/KRW rate. Stateless beyond its
/// injected collaborators; safe to clone and share across tasks.
#[derive(Clone)]
pub struct FxService {
  cache: FxCache,
  source: Arc<CompositePriceSource>,
  store: StockStore,
  calendar: Arc<MarketCalendar>,
}

impl FxService {
  pub fn new(
    cache: FxCache,
    source: Arc<CompositePriceSource>,
    store: StockStore,
    calendar: Arc<MarketCalendar>,
  ) -> Self {
    FxService { cache, source, store, calendar }
  }

  /// `{rate, source, updatedAt}`: cache-through the `FxRealtime` key
  /// (TTL 60s); on miss, calls the composite `PriceSource`'s FX
  /// adapter, writes the cache, and appends a per-minute sample to the
  /// day's sorted set.
  #[instrument(skip(self))]
  pub async fn current_rate(&self, force: bool) -> Result<FxRealtime> {
    if !force {
      if let Some(cached) = self.cache.get_realtime().await? {
        return Ok(cached);
      }
    }

    let (rate, source) = self.source.fx_rate_with_source().await?;
    let realtime = FxRealtime { rate, pair: USD_KRW_PAIR.to_string(), source: source.to_string(), updated_at: Utc::now() };

    self.cache.set_realtime(&realtime).await?;
    self
      .cache
      .append_minute_sample(&FxMinuteSample { rate, sampled_at: realtime.updated_at })
      .await?;

    Ok(realtime)
  }

  /// Dated USD/KRW rates over `[start, end]`, with carry-forward: any
  /// date with no stored rate is filled from the most recent earlier
  /// rate within `FX_CARRY_FORWARD_DAYS`; if none exists, that date is
  /// absent from the returned map rather than erroring.
  #[instrument(skip(self))]
  pub async fn historical_rates(
    &self,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<HashMap<NaiveDate, Decimal>> {
    if start > end {
      return Ok(HashMap::new());
    }

    let today = self.calendar.today_kst(Utc::now());
    let mut resolved = HashMap::new();
    let mut date = start;
    while date <= end {
      if let Some(rate) = self.rate_for_date(date, today).await? {
        resolved.insert(date, rate);
      } else {
        debug!(%date, "no fx rate available within carry-forward window");
      }
      date += chrono::Duration::days(1);
    }
    Ok(resolved)
  }

  /// Resolves a single date: exact row, else carry-forward within the
  /// window, else — only for `today` — a live fetch-and-upsert, since
  /// the composite `PriceSource` only exposes a *current* FX quote and
  /// has no historical-series endpoint to "fetch" against.
  async fn rate_for_date(&self, date: NaiveDate, today: NaiveDate) -> Result<Option<Decimal>> {
    if let Some(exact) = self.store.exchange_rate_on(date).await? {
      return Ok(Some(exact.rate));
    }

    if let Some(carried) =
      self.store.exchange_rate_carry_forward(date, FX_CARRY_FORWARD_DAYS).await?
    {
      return Ok(Some(carried.rate));
    }

    if date == today {
      let live = self.current_rate(false).await?;
      self
        .store
        .upsert_exchange_rate(&ExchangeRate {
          pair: USD_KRW_PAIR.to_string(),
          rate_date: date,
          rate: live.rate,
          source: live.source,
        })
        .await?;
      return Ok(Some(live.rate));
    }

    Ok(None)
  }

  /// Change of `current` against the most recent dated rate strictly
  /// earlier than now.
  #[instrument(skip(self, current))]
  pub async fn change(&self, current: Decimal) -> Result<Option<Decimal>> {
    let today = self.calendar.today_kst(Utc::now());
    let yesterday = today - chrono::Duration::days(1);
    let previous =
      self.store.exchange_rate_carry_forward(yesterday, FX_CARRY_FORWARD_DAYS).await?;
    Ok(previous.map(|p| current - p.rate))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn carry_forward_window_matches_the_documented_constant() {
    assert_eq!(FX_CARRY_FORWARD_DAYS, 4);
  }
}
