//! Job R: the minute-interval realtime refresh tick.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use krxusd_cache::{ActiveSymbolTracker, MarketStatusCache, RealtimePriceCache};
use krxusd_calendar::MarketCalendar;
use krxusd_core::Result;
use krxusd_engine::FxService;
use krxusd_models::{CachedRealtimePrice, MarketStatus, SchedulerRunRecord};
use krxusd_source::CompositePriceSource;
use rust_decimal::RoundingStrategy;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Dependencies `run_realtime_tick` needs, injected once at process
/// startup and shared across every tick — "jobs should be pure
/// functions over these dependencies.
#[derive(Clone)]
pub struct RealtimeJobDeps {
  pub calendar: Arc<MarketCalendar>,
  pub tracker: ActiveSymbolTracker,
  pub source: Arc<CompositePriceSource>,
  pub fx: FxService,
  pub realtime_cache: RealtimePriceCache,
  pub market_status_cache: MarketStatusCache,
  pub max_batch: usize,
  pub fanout_concurrency: usize,
}

/// One Job R tick, steps 1-7 in order. Returns the run
/// record that the caller appends to the bounded scheduler history.
#[instrument(skip(deps))]
pub async fn run_realtime_tick(deps: &RealtimeJobDeps) -> SchedulerRunRecord {
  let started = Utc::now();

  let result = run_realtime_tick_fallible(deps).await;

  let duration_ms = (Utc::now() - started).num_milliseconds();
  match result {
    Ok(stocks_updated) => SchedulerRunRecord {
      run_at: started,
      duration_ms,
      stocks_updated,
      success: true,
      error: None,
    },
    Err(err) => {
      warn!(error = %err, "realtime refresh tick failed");
      SchedulerRunRecord {
        run_at: started,
        duration_ms,
        stocks_updated: 0,
        success: false,
        error: Some(err.to_string()),
      }
    }
  }
}

async fn run_realtime_tick_fallible(deps: &RealtimeJobDeps) -> Result<usize> {
  let now = Utc::now();

  // Step 1: always refresh market-status, regardless of phase.
  let phase = deps.calendar.phase_at(now);
  deps.market_status_cache.set(&MarketStatus { status: phase, updated_at: now }).await?;

  // Step 5 (pulled forward so it always runs, per "24x7; FX markets run
  // outside KRX hours"): refresh FX, and reuse the quote below in step
  // 4's per-symbol join rather than calling `current_rate` twice.
  let fx = deps.fx.current_rate(false).await.ok();

  let mut stocks_updated = 0usize;

  // Step 2: steps 3-4 are skipped outside trading time.
  if phase.is_trading_time() {
    // Step 3.
    let mut symbols = deps.tracker.active(None).await?;
    let original_len = symbols.len();
    cap_to_max_batch(&mut symbols, deps.max_batch);
    if symbols.len() < original_len {
      warn!(
        active = original_len,
        max_batch = deps.max_batch,
        "truncating active-symbol set to the configured batch cap"
      );
    }

    // Step 4: bounded-concurrency fan-out, no inter-symbol ordering
    // guarantee.
    let source = deps.source.clone();
    let realtime_cache = deps.realtime_cache.clone();
    let results = stream::iter(symbols.into_iter())
      .map(|symbol| {
        let source = source.clone();
        let realtime_cache = realtime_cache.clone();
        let fx = fx.clone();
        async move {
          match source.fetch_realtime(&symbol).await {
            Ok(quote) => {
              let close_usd = fx
                .as_ref()
                .filter(|f| !f.rate.is_zero())
                .map(|f| (quote.close / f.rate).round_dp_with_strategy(4, RoundingStrategy::MidpointNearestEven));
              let record = CachedRealtimePrice {
                symbol: quote.symbol.clone(),
                open: quote.open,
                high: quote.high,
                low: quote.low,
                close: quote.close,
                volume: quote.volume,
                change: quote.change,
                change_pct: quote.change_pct,
                price_date: quote.price_date,
                fx: fx.as_ref().map(|f| f.rate),
                close_usd,
                source: quote.source.clone(),
                updated_at: Utc::now(),
              };
              if let Err(err) = realtime_cache.set(&symbol, &record).await {
                warn!(%symbol, %err, "failed to write realtime cache entry");
                false
              } else {
                true
              }
            }
            Err(err) => {
              warn!(%symbol, %err, "realtime fetch failed for active symbol");
              false
            }
          }
        }
      })
      .buffer_unordered(deps.fanout_concurrency.max(1))
      .collect::<Vec<bool>>()
      .await;
    stocks_updated = results.into_iter().filter(|ok| *ok).count();
  }

  // Step 6.
  deps.tracker.purge().await?;

  Ok(stocks_updated)
}

/// Caps the active-symbol set to `maxBatch` (default 20). Pulled out as
/// a pure function so the truncation boundary is testable without a
/// live tracker.
fn cap_to_max_batch(symbols: &mut Vec<String>, max_batch: usize) {
  if symbols.len() > max_batch {
    symbols.truncate(max_batch);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cap_to_max_batch_truncates_when_over_the_cap() {
    let mut symbols: Vec<String> = (0..25).map(|i| i.to_string()).collect();
    cap_to_max_batch(&mut symbols, 20);
    assert_eq!(symbols.len(), 20);
  }

  #[test]
  fn cap_to_max_batch_leaves_smaller_sets_untouched() {
    let mut symbols = vec!["005930".to_string(), "000660".to_string()];
    cap_to_max_batch(&mut symbols, 20);
    assert_eq!(symbols.len(), 2);
  }
}
