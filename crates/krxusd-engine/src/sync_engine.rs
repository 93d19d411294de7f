//! C6 SyncEngine: the Gap-Filling protocol (§4.6). Decides the minimal
//! provider fetch needed to bring a symbol's stored daily series
//! current, then performs it with per-symbol serialization and a
//! `pending → syncing → completed|failed` status lifecycle.

use crate::fx_service::FxService;
use chrono::{Datelike, NaiveDate, Utc};
use krxusd_calendar::MarketCalendar;
use krxusd_core::{Error, Result, SYNC_ERROR_MAX_LEN, SYNC_MUTEX_STRIPES};
use krxusd_database::StockStore;
use krxusd_models::{DataType, EnsureSyncedResult, GapAnalysis, GapCase, Stock, SyncState, SyncStatus};
use krxusd_source::CompositePriceSource;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// `analyze(stock)`'s decision function, lifted to a pure function of
/// its inputs so the Case A/B/C boundaries are testable
/// without any I/O.
///
/// - Case A — NoData: `last = None`. `start := max(listing_date ??
///   (today − default_history_days), today − max_history_years·365)`;
///   `end := yesterday`.
/// - Case C — UpToDate: `last ≥ yesterday`.
/// - Case B — Gap: else, `start := last + 1`, `end := yesterday`.
///
/// `end < start` (provider/clock skew, or a `listing_date` after
/// today) collapses to Case C with no range.
pub fn analyze_gap(
  last: Option<NaiveDate>,
  listing_date: Option<NaiveDate>,
  today: NaiveDate,
  yesterday: NaiveDate,
  default_history_days: i64,
  max_history_years: i64,
) -> GapAnalysis {
  match last {
    Some(last) if last >= yesterday => GapAnalysis { case: GapCase::UpToDate, start: None, end: None },
    Some(last) => {
      let start = last + chrono::Duration::days(1);
      if start > yesterday {
        GapAnalysis { case: GapCase::UpToDate, start: None, end: None }
      } else {
        GapAnalysis { case: GapCase::Gap, start: Some(start), end: Some(yesterday) }
      }
    }
    None => {
      let by_history_days = today - chrono::Duration::days(default_history_days);
      // Calendar-year subtraction, not `365 * years`: `2025-03-17` minus
      // 10 years must land on `2015-03-17`, where a fixed 365-day
      // multiplier would drift by the leap days crossed.
      let floor = today
        .with_year(today.year() - max_history_years as i32)
        .unwrap_or(today - chrono::Duration::days(max_history_years * 365));
      let start = listing_date.unwrap_or(by_history_days).max(floor);
      if start > yesterday {
        GapAnalysis { case: GapCase::UpToDate, start: None, end: None }
      } else {
        GapAnalysis { case: GapCase::NoData, start: Some(start), end: Some(yesterday) }
      }
    }
  }
}

fn stripe_index(symbol: &str) -> usize {
  let mut hasher = DefaultHasher::new();
  symbol.hash(&mut hasher);
  (hasher.finish() as usize) % SYNC_MUTEX_STRIPES
}

/// The Gap-Filling synchronization engine. One instance is shared
/// process-wide; its mutex stripe table serializes same-symbol
/// `sync` calls while letting distinct symbols run concurrently.
#[derive(Clone)]
pub struct SyncEngine {
  store: StockStore,
  source: Arc<CompositePriceSource>,
  fx: FxService,
  calendar: Arc<MarketCalendar>,
  default_history_days: i64,
  max_history_years: i64,
  stale_syncing_secs: i64,
  stripes: Arc<Vec<Mutex<()>>>,
}

impl SyncEngine {
  pub fn new(
    store: StockStore,
    source: Arc<CompositePriceSource>,
    fx: FxService,
    calendar: Arc<MarketCalendar>,
    default_history_days: i64,
    max_history_years: i64,
    stale_syncing_secs: i64,
  ) -> Self {
    let stripes = (0..SYNC_MUTEX_STRIPES).map(|_| Mutex::new(())).collect();
    SyncEngine {
      store,
      source,
      fx,
      calendar,
      default_history_days,
      max_history_years,
      stale_syncing_secs,
      stripes: Arc::new(stripes),
    }
  }

  /// `analyze(stock)`: resolves the stock's last stored price date and
  /// listing date, then runs the pure decision function.
  #[instrument(skip(self))]
  pub async fn analyze(&self, symbol: &str) -> Result<GapAnalysis> {
    let stock = self.store.get_or_create_stock(symbol, None, None).await?;
    let last = self.store.last_price_date(symbol).await?;
    let now = Utc::now();
    let today = self.calendar.today_kst(now);
    let yesterday = self.calendar.yesterday_kst(now);
    Ok(analyze_gap(
      last,
      stock.listing_date,
      today,
      yesterday,
      self.default_history_days,
      self.max_history_years,
    ))
  }

  /// The Gap-Filling sync procedure: analyze, claim, fetch, materialize
  /// USD, persist, and record the sync-status outcome.
  ///
  /// Serializes on a mutex stripe keyed by `hash(symbol) %
  /// SYNC_MUTEX_STRIPES`: a second concurrent caller for the same
  /// symbol waits for the first to finish rather than issuing a
  /// duplicate external fetch, which is the required observable effect
  /// for same-symbol concurrency.
  #[instrument(skip(self))]
  pub async fn sync(&self, symbol: &str, force: bool) -> Result<(GapAnalysis, usize)> {
    let symbol = Stock::normalize_symbol(symbol);
    let _guard = self.stripes[stripe_index(&symbol)].lock().await;

    let analysis = if force {
      let stock = self.store.get_or_create_stock(&symbol, None, None).await?;
      let now = Utc::now();
      analyze_gap(
        None,
        stock.listing_date,
        self.calendar.today_kst(now),
        self.calendar.yesterday_kst(now),
        self.default_history_days,
        self.max_history_years,
      )
    } else {
      self.analyze(&symbol).await?
    };

    if analysis.case == GapCase::UpToDate {
      return Ok((analysis, 0));
    }

    let (start, end) = (analysis.start.unwrap(), analysis.end.unwrap());

    let claimed = self
      .store
      .try_claim_sync(&symbol, DataType::DailyPrice, self.stale_syncing_secs)
      .await?;
    if !claimed {
      return Err(Error::AlreadySyncing(symbol));
    }

    match self.run_sync(&symbol, start, end).await {
      Ok(count) => {
        self
          .store
          .upsert_sync_status(&SyncStatus {
            symbol: symbol.clone(),
            data_type: DataType::DailyPrice,
            status: SyncState::Completed,
            last_sync_date: Some(end),
            last_sync_at: Some(Utc::now()),
            error_message: None,
          })
          .await?;
        info!(%symbol, case = %analysis.case, synced = count, "sync completed");
        Ok((analysis, count))
      }
      Err(err) => {
        let message = err.truncated_message(SYNC_ERROR_MAX_LEN);
        warn!(%symbol, error = %message, "sync failed");
        self
          .store
          .upsert_sync_status(&SyncStatus {
            symbol: symbol.clone(),
            data_type: DataType::DailyPrice,
            status: SyncState::Failed,
            last_sync_date: None,
            last_sync_at: Some(Utc::now()),
            error_message: Some(message),
          })
          .await?;
        Err(err)
      }
    }
  }

  async fn run_sync(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<usize> {
    let bars = self.source.fetch_daily(symbol, start, end).await?;
    if bars.is_empty() {
      return Ok(0);
    }

    let min_date = bars.iter().map(|b| b.price_date).min().unwrap();
    let max_date = bars.iter().map(|b| b.price_date).max().unwrap();
    let fx_map = self.fx.historical_rates(min_date, max_date).await?;

    let valid_bars: Vec<_> = bars
      .into_iter()
      .filter(|bar| {
        let ok = bar.is_valid();
        if !ok {
          warn!(%symbol, date = %bar.price_date, "rejecting bar with invalid OHLCV invariant");
        }
        ok
      })
      .collect();

    let written = self.store.upsert_daily(symbol, valid_bars, fx_map).await?;
    Ok(written)
  }

  /// `ensureSynced(symbol, autoSync)`: runs `analyze`; if the case is
  /// not `UpToDate` and `autoSync`, invokes `sync`. With `autoSync =
  /// false` this never mutates `stock_prices` or `sync_status`.
  #[instrument(skip(self))]
  pub async fn ensure_synced(&self, symbol: &str, auto_sync: bool) -> Result<EnsureSyncedResult> {
    let symbol = Stock::normalize_symbol(symbol);
    let analysis = self.analyze(&symbol).await?;
    let needs_sync = analysis.case != GapCase::UpToDate;

    if !needs_sync || !auto_sync {
      return Ok(EnsureSyncedResult {
        symbol,
        case: analysis.case,
        needs_sync,
        synced: false,
        synced_count: 0,
        sync_range: analysis.start.zip(analysis.end),
        sync_error: None,
      });
    }

    match self.sync(&symbol, false).await {
      Ok((analysis, count)) => Ok(EnsureSyncedResult {
        symbol,
        case: analysis.case,
        needs_sync,
        synced: true,
        synced_count: count,
        sync_range: analysis.start.zip(analysis.end),
        sync_error: None,
      }),
      Err(err) => Ok(EnsureSyncedResult {
        symbol,
        case: analysis.case,
        needs_sync,
        synced: false,
        synced_count: 0,
        sync_range: analysis.start.zip(analysis.end),
        sync_error: Some(err.to_string()),
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  #[test]
  fn case_c_at_exactly_yesterday() {
    let today = d(2025, 3, 17);
    let yesterday = d(2025, 3, 16);
    let analysis = analyze_gap(Some(yesterday), None, today, yesterday, 365, 10);
    assert_eq!(analysis.case, GapCase::UpToDate);
  }

  #[test]
  fn case_b_one_day_gap() {
    let today = d(2025, 3, 17);
    let yesterday = d(2025, 3, 16);
    let last = d(2025, 3, 15);
    let analysis = analyze_gap(Some(last), None, today, yesterday, 365, 10);
    assert_eq!(analysis.case, GapCase::Gap);
    assert_eq!(analysis.start, Some(d(2025, 3, 16)));
    assert_eq!(analysis.end, Some(yesterday));
  }

  #[test]
  fn case_a_cold_start_uses_listing_date_bounded_by_max_history_years() {
    // S1: listing_date way in the past, max_history_years=10 bounds the start.
    let today = d(2025, 3, 17);
    let yesterday = d(2025, 3, 16);
    let listing = d(1975, 6, 11);
    let analysis = analyze_gap(None, Some(listing), today, yesterday, 365, 10);
    assert_eq!(analysis.case, GapCase::NoData);
    assert_eq!(analysis.start, Some(d(2015, 3, 17)));
    assert_eq!(analysis.end, Some(yesterday));
  }

  #[test]
  fn case_a_without_listing_date_uses_default_history_days() {
    let today = d(2025, 3, 17);
    let yesterday = d(2025, 3, 16);
    let analysis = analyze_gap(None, None, today, yesterday, 365, 10);
    assert_eq!(analysis.case, GapCase::NoData);
    assert_eq!(analysis.start, Some(today - chrono::Duration::days(365)));
  }

  #[test]
  fn listing_date_after_today_short_circuits_to_up_to_date() {
    let today = d(2025, 3, 17);
    let yesterday = d(2025, 3, 16);
    let listing = d(2025, 6, 1);
    let analysis = analyze_gap(None, Some(listing), today, yesterday, 365, 10);
    assert_eq!(analysis.case, GapCase::UpToDate);
    assert_eq!(analysis.start, None);
  }

  #[test]
  fn end_before_start_from_clock_skew_collapses_to_up_to_date() {
    let today = d(2025, 3, 17);
    let yesterday = d(2025, 3, 16);
    let last = yesterday; // already current
    let analysis = analyze_gap(Some(last), None, today, yesterday, 365, 10);
    assert_eq!(analysis.case, GapCase::UpToDate);
  }

  #[test]
  fn stripe_index_is_stable_for_the_same_symbol() {
    assert_eq!(stripe_index("005930"), stripe_index("005930"));
  }

  #[test]
  fn stripe_index_is_within_bounds() {
    for sym in ["005930", "000660", "035420", "AAPL", ""] {
      assert!(stripe_index(sym) < SYNC_MUTEX_STRIPES);
    }
  }
}
