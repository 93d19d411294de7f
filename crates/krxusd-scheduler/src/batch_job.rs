//! Job B: the once-daily post-close batch job.

use chrono::{NaiveDate, Utc};
use krxusd_cache::{BatchStateCache, PopularCache, RealtimePriceCache};
use krxusd_calendar::MarketCalendar;
use krxusd_core::{Error, Result};
use krxusd_database::StockStore;
use krxusd_engine::SyncEngine;
use krxusd_models::{
  BatchRunRecord, BatchRunState, BatchState, RankingEntry, RankingSnapshot, RankingType,
  SyncFailure,
};
use krxusd_source::CompositePriceSource;
use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Dependencies `run_batch_job` needs, injected once at process
/// startup.
#[derive(Clone)]
pub struct BatchJobDeps {
  pub calendar: Arc<MarketCalendar>,
  pub source: Arc<CompositePriceSource>,
  pub sync_engine: SyncEngine,
  pub store: StockStore,
  pub realtime_cache: RealtimePriceCache,
  pub popular_cache: PopularCache,
  pub batch_state_cache: BatchStateCache,
  pub marcap_top_n: usize,
  pub volume_top_n: usize,
  pub popular_cache_top_n: usize,
  pub sync_batch_size: usize,
  pub inter_batch_delay: Duration,
  pub retry_attempts: u32,
  pub retry_delay: Duration,
}

/// Quote captured during the sync loop, reused by the popular-cache
/// refresh step instead of re-fetching every symbol a second time.
struct TargetQuote {
  symbol: String,
  close: Decimal,
  volume: i64,
  change_pct: Decimal,
}

/// Runs Job B with its whole-job retry policy: up to
/// `retry_attempts` attempts, `retry_delay` between them, on
/// total-job exceptions. Per-symbol failures never abort a run and
/// are folded into the returned record's `failed_targets` count
/// instead. Returns `Ok(None)` when the job is skipped because
/// `today_KST` is not a trading day.
#[instrument(skip(deps))]
pub async fn run_batch_job(deps: &BatchJobDeps) -> Result<Option<BatchRunRecord>> {
  let today = deps.calendar.today_kst(Utc::now());
  if !deps.calendar.is_trading_day(today) {
    info!(%today, "skipping daily batch job: not a trading day");
    return Ok(None);
  }

  let mut last_err = None;
  for attempt in 1..=deps.retry_attempts.max(1) {
    match run_batch_job_once(deps, today).await {
      Ok(record) => return Ok(Some(record)),
      Err(err) => {
        warn!(attempt, %err, "batch job attempt failed");
        last_err = Some(err);
        if attempt < deps.retry_attempts {
          tokio::time::sleep(deps.retry_delay).await;
        }
      }
    }
  }

  let err = last_err.expect("loop runs at least once");
  let now = Utc::now();
  let failed_state = BatchState {
    state: BatchRunState::Failed,
    started_at: Some(now),
    target_date: Some(today),
    total_targets: 0,
    completed_targets: 0,
    failed_targets: 0,
    error: Some(err.to_string()),
  };
  deps.batch_state_cache.set_state(&failed_state).await?;
  deps
    .batch_state_cache
    .push_history(&BatchRunRecord {
      started_at: now,
      finished_at: now,
      target_date: today,
      total_targets: 0,
      completed_targets: 0,
      failed_targets: 0,
      success: false,
      error: Some(err.to_string()),
      failures: Vec::new(),
    })
    .await?;
  Err(err)
}

async fn run_batch_job_once(deps: &BatchJobDeps, today: NaiveDate) -> Result<BatchRunRecord> {
  let started_at = Utc::now();

  // Step 1.
  deps
    .batch_state_cache
    .set_state(&BatchState {
      state: BatchRunState::Running,
      started_at: Some(started_at),
      target_date: Some(today),
      total_targets: 0,
      completed_targets: 0,
      failed_targets: 0,
      error: None,
    })
    .await?;

  // Step 2: discover popular symbols. A total discovery failure (both
  // rankings unavailable) is a whole-job exception; one ranking
  // failing while the other succeeds degrades gracefully.
  let marcap_top = deps.source.top_by_marcap(deps.marcap_top_n).await;
  let volume_top = deps.source.top_by_volume(deps.volume_top_n).await;
  if marcap_top.is_err() && volume_top.is_err() {
    return Err(Error::SourceExhausted {
      reasons: vec![
        ("top_by_marcap".to_string(), marcap_top.unwrap_err().to_string()),
        ("top_by_volume".to_string(), volume_top.unwrap_err().to_string()),
      ],
    });
  }
  let marcap_top = marcap_top.unwrap_or_default();
  let volume_top = volume_top.unwrap_or_default();

  let mut targets = Vec::new();
  for symbol in marcap_top.iter().chain(volume_top.iter()) {
    if !targets.contains(symbol) {
      targets.push(symbol.clone());
    }
  }

  let total_targets = targets.len();
  let mut completed_targets = 0usize;
  let mut failed_targets = 0usize;
  let mut failures: Vec<SyncFailure> = Vec::new();
  let mut quotes = Vec::with_capacity(total_targets);

  // Step 3 + 4: batches of `sync_batch_size`, `inter_batch_delay`
  // between batches. Retries (the caller's whole-job retry loop)
  // re-invoke `ensureSynced` on every target — it is idempotent by
  // Case C, so already-completed symbols are no-ops on a retried
  // attempt, which is a deliberate no-op for already-completed symbols.
  let chunks: Vec<Vec<String>> =
    targets.chunks(deps.sync_batch_size.max(1)).map(|c| c.to_vec()).collect();
  let chunk_count = chunks.len();
  for (idx, chunk) in chunks.into_iter().enumerate() {
    for symbol in chunk {
      match deps.sync_engine.ensure_synced(&symbol, true).await {
        Ok(result) if result.sync_error.is_none() => completed_targets += 1,
        Ok(result) => {
          warn!(%symbol, error = ?result.sync_error, "per-symbol sync failed during batch job");
          failed_targets += 1;
          failures.push(SyncFailure {
            symbol: symbol.clone(),
            sync_case: result.case.to_string(),
            synced_count: result.synced_count,
            message: result.sync_error.clone().unwrap_or_default(),
          });
        }
        Err(err) => {
          warn!(%symbol, %err, "per-symbol sync errored during batch job");
          failed_targets += 1;
          failures.push(SyncFailure {
            symbol: symbol.clone(),
            sync_case: "error".to_string(),
            synced_count: 0,
            message: err.to_string(),
          });
        }
      }

      if let Some(quote) = refresh_realtime_quote(deps, &symbol).await {
        quotes.push(quote);
      }
    }

    // Step 4 (progress update after each batch).
    deps
      .batch_state_cache
      .set_state(&BatchState {
        state: BatchRunState::Running,
        started_at: Some(started_at),
        target_date: Some(today),
        total_targets,
        completed_targets,
        failed_targets,
        error: None,
      })
      .await?;

    if idx + 1 < chunk_count {
      tokio::time::sleep(deps.inter_batch_delay).await;
    }
  }

  // Step 5: refresh popular-stock caches.
  refresh_popular_caches(deps, &marcap_top, &volume_top, &quotes, Utc::now()).await?;

  // Step 6.
  let finished_at = Utc::now();
  let success = failed_targets == 0;
  let final_state = BatchState {
    state: if success { BatchRunState::Completed } else { BatchRunState::Failed },
    started_at: Some(started_at),
    target_date: Some(today),
    total_targets,
    completed_targets,
    failed_targets,
    error: None,
  };
  deps.batch_state_cache.set_state(&final_state).await?;

  let record = BatchRunRecord {
    started_at,
    finished_at,
    target_date: today,
    total_targets,
    completed_targets,
    failed_targets,
    success,
    error: None,
    failures,
  };
  deps.batch_state_cache.push_history(&record).await?;
  info!(total_targets, completed_targets, failed_targets, "batch job completed");
  Ok(record)
}

async fn refresh_realtime_quote(deps: &BatchJobDeps, symbol: &str) -> Option<TargetQuote> {
  match deps.source.fetch_realtime(symbol).await {
    Ok(quote) => {
      let cached = krxusd_models::CachedRealtimePrice {
        symbol: quote.symbol.clone(),
        open: quote.open,
        high: quote.high,
        low: quote.low,
        close: quote.close,
        volume: quote.volume,
        change: quote.change,
        change_pct: quote.change_pct,
        price_date: quote.price_date,
        fx: None,
        close_usd: None,
        source: quote.source.clone(),
        updated_at: Utc::now(),
      };
      if let Err(err) = deps.realtime_cache.set(symbol, &cached).await {
        warn!(%symbol, %err, "failed to refresh realtime cache during batch job");
      }
      Some(TargetQuote {
        symbol: quote.symbol,
        close: quote.close,
        volume: quote.volume,
        change_pct: quote.change_pct,
      })
    }
    Err(err) => {
      warn!(%symbol, %err, "realtime refresh failed during batch job");
      None
    }
  }
}

/// Builds and persists the five `krxusd:popular:*` rankings. `volume`
/// and `market_cap` follow the provider's own ranking order (it is the
/// authority on both); `value`/`gain`/`loss` are derived locally from
/// the realtime quotes gathered during the sync loop, since
/// `PriceSource` exposes no dedicated endpoints for those three.
async fn refresh_popular_caches(
  deps: &BatchJobDeps,
  marcap_top: &[String],
  volume_top: &[String],
  quotes: &[TargetQuote],
  computed_at: chrono::DateTime<Utc>,
) -> Result<()> {
  let top_n = deps.popular_cache_top_n;

  let market_cap_entries: Vec<RankingEntry> = marcap_top
    .iter()
    .take(top_n)
    .enumerate()
    .filter_map(|(i, symbol)| {
      quotes.iter().find(|q| &q.symbol == symbol).map(|q| RankingEntry {
        rank: (i + 1) as i32,
        symbol: symbol.clone(),
        value: q.close,
      })
    })
    .collect();

  let volume_entries: Vec<RankingEntry> = volume_top
    .iter()
    .take(top_n)
    .enumerate()
    .filter_map(|(i, symbol)| {
      quotes.iter().find(|q| &q.symbol == symbol).map(|q| RankingEntry {
        rank: (i + 1) as i32,
        symbol: symbol.clone(),
        value: Decimal::from(q.volume),
      })
    })
    .collect();

  let mut by_value: Vec<&TargetQuote> = quotes.iter().collect();
  by_value.sort_by_key(|q| Reverse(q.close * Decimal::from(q.volume)));
  let value_entries = to_ranking_entries(&by_value, top_n, |q| q.close * Decimal::from(q.volume));

  let mut by_gain: Vec<&TargetQuote> = quotes.iter().collect();
  by_gain.sort_by_key(|q| Reverse(q.change_pct));
  let gain_entries = to_ranking_entries(&by_gain, top_n, |q| q.change_pct);

  let mut by_loss: Vec<&TargetQuote> = quotes.iter().collect();
  by_loss.sort_by_key(|q| q.change_pct);
  let loss_entries = to_ranking_entries(&by_loss, top_n, |q| q.change_pct);

  let mut snapshots = Vec::with_capacity(5);
  for (ranking_type, entries) in [
    (RankingType::MarketCap, market_cap_entries),
    (RankingType::Volume, volume_entries),
    (RankingType::Value, value_entries),
    (RankingType::Gain, gain_entries),
    (RankingType::Loss, loss_entries),
  ] {
    // `replace_ranking_snapshot` is itself a no-op for `MarketCap`, so
    // this call is unconditional.
    deps.store.replace_ranking_snapshot(ranking_type, &entries, computed_at).await?;
    snapshots.push(RankingSnapshot { ranking_type, entries, computed_at });
  }

  // All five rankings change together at the end of every batch run;
  // pipeline the cache writes in one round trip rather than five.
  deps.popular_cache.set_many(&snapshots).await?;

  Ok(())
}

fn to_ranking_entries(
  sorted: &[&TargetQuote],
  top_n: usize,
  value_of: impl Fn(&TargetQuote) -> Decimal,
) -> Vec<RankingEntry> {
  sorted
    .iter()
    .take(top_n)
    .enumerate()
    .map(|(i, q)| RankingEntry { rank: (i + 1) as i32, symbol: q.symbol.clone(), value: value_of(q) })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn to_ranking_entries_caps_at_top_n_and_ranks_from_one() {
    let quotes: Vec<TargetQuote> = (0..5)
      .map(|i| TargetQuote {
        symbol: format!("S{i}"),
        close: Decimal::from(i),
        volume: i,
        change_pct: Decimal::from(i),
      })
      .collect();
    let refs: Vec<&TargetQuote> = quotes.iter().collect();
    let entries = to_ranking_entries(&refs, 3, |q| q.close);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].rank, 1);
    assert_eq!(entries[2].rank, 3);
  }
}
