use crate::error::CacheResult;
use crate::store::KVCache;
use chrono::{DateTime, Utc};
use krxusd_models::{
  BatchRunRecord, BatchState, CachedRealtimePrice, FxMinuteSample, FxRealtime, MarketStatus,
  RankingSnapshot, RankingType, SchedulerRunRecord, SchedulerState,
};
use std::time::Duration;

const REALTIME_PRICE_TTL: Duration = Duration::from_secs(120);
const FX_REALTIME_TTL: Duration = Duration::from_secs(60);
const FX_MINUTE_TTL: Duration = Duration::from_secs(86_400);
const STOCK_MINUTE_TTL: Duration = Duration::from_secs(86_400);
const POPULAR_TTL: Duration = Duration::from_secs(300);
const MARKET_STATUS_TTL: Duration = Duration::from_secs(60);
const SCHEDULER_HISTORY_CAP: isize = 100;
const BATCH_HISTORY_CAP: isize = 30;
const BATCH_HISTORY_TTL: Duration = Duration::from_secs(604_800);

fn realtime_price_key(symbol: &str) -> String {
  format!("krxusd:stock:realtime:{symbol}")
}

fn stock_minute_key(symbol: &str, date: chrono::NaiveDate) -> String {
  format!("krxusd:stock:minute:{symbol}:{date}")
}

fn exchange_minute_key(date: chrono::NaiveDate) -> String {
  format!("krxusd:exchange:minute:{date}")
}

fn popular_key(kind: RankingType) -> String {
  format!("krxusd:popular:{kind}")
}

const EXCHANGE_REALTIME_KEY: &str = "krxusd:exchange:realtime";
const MARKET_STATUS_KEY: &str = "krxusd:market:status";
const SCHEDULER_STATE_KEY: &str = "krxusd:scheduler:state";
const SCHEDULER_HISTORY_KEY: &str = "krxusd:scheduler:history";
const BATCH_STATE_KEY: &str = "krxusd:batch:state";
const BATCH_HISTORY_KEY: &str = "krxusd:batch:history";

/// `krxusd:stock:realtime:{SYMBOL}`, TTL 120s.
#[derive(Clone)]
pub struct RealtimePriceCache {
  kv: KVCache,
}

impl RealtimePriceCache {
  pub fn new(kv: KVCache) -> Self {
    RealtimePriceCache { kv }
  }

  pub async fn get(&self, symbol: &str) -> CacheResult<Option<CachedRealtimePrice>> {
    self.kv.get(&realtime_price_key(symbol)).await
  }

  pub async fn set(&self, symbol: &str, record: &CachedRealtimePrice) -> CacheResult<()> {
    self.kv.set(&realtime_price_key(symbol), record, REALTIME_PRICE_TTL).await
  }
}

/// `krxusd:exchange:realtime` and `krxusd:exchange:minute:{date}`.
#[derive(Clone)]
pub struct FxCache {
  kv: KVCache,
}

impl FxCache {
  pub fn new(kv: KVCache) -> Self {
    FxCache { kv }
  }

  pub async fn get_realtime(&self) -> CacheResult<Option<FxRealtime>> {
    self.kv.get(EXCHANGE_REALTIME_KEY).await
  }

  pub async fn set_realtime(&self, rate: &FxRealtime) -> CacheResult<()> {
    self.kv.set(EXCHANGE_REALTIME_KEY, rate, FX_REALTIME_TTL).await
  }

  /// Appends a per-minute FX sample to the day's sorted set, scored by
  /// unix seconds, as `FxService::current_rate` does on every cache
  /// refresh.
  pub async fn append_minute_sample(&self, sample: &FxMinuteSample) -> CacheResult<()> {
    let date = sample.sampled_at.with_timezone(&chrono_tz::Asia::Seoul).date_naive();
    let key = exchange_minute_key(date);
    let member = serde_json::to_string(sample).map_err(crate::error::CacheError::from)?;
    self.kv.zadd(&key, &member, sample.sampled_at.timestamp() as f64).await?;
    self.kv.zset_expire(&key, FX_MINUTE_TTL).await
  }
}

/// `krxusd:stock:minute:{SYMBOL}:{date}`.
#[derive(Clone)]
pub struct StockMinuteCache {
  kv: KVCache,
}

impl StockMinuteCache {
  pub fn new(kv: KVCache) -> Self {
    StockMinuteCache { kv }
  }

  pub async fn append_sample<T: serde::Serialize>(
    &self,
    symbol: &str,
    date: chrono::NaiveDate,
    at: DateTime<Utc>,
    sample: &T,
  ) -> CacheResult<()> {
    let key = stock_minute_key(symbol, date);
    let member = serde_json::to_string(sample).map_err(crate::error::CacheError::from)?;
    self.kv.zadd(&key, &member, at.timestamp() as f64).await?;
    self.kv.zset_expire(&key, STOCK_MINUTE_TTL).await
  }
}

/// `krxusd:popular:{volume|value|gain|loss|market_cap}`, TTL 300s.
#[derive(Clone)]
pub struct PopularCache {
  kv: KVCache,
}

impl PopularCache {
  pub fn new(kv: KVCache) -> Self {
    PopularCache { kv }
  }

  pub async fn get(&self, kind: RankingType) -> CacheResult<Option<RankingSnapshot>> {
    self.kv.get(&popular_key(kind)).await
  }

  pub async fn set(&self, snapshot: &RankingSnapshot) -> CacheResult<()> {
    self.kv.set(&popular_key(snapshot.ranking_type), snapshot, POPULAR_TTL).await
  }

  /// Pipelines the write of every ranking kind in one round trip —
  /// used by the daily batch job's "refresh popular-stock caches" step,
  /// which always rewrites all five rankings together.
  pub async fn set_many(&self, snapshots: &[RankingSnapshot]) -> CacheResult<()> {
    let items: Vec<(&str, &RankingSnapshot, std::time::Duration)> =
      snapshots.iter().map(|s| (popular_key_str(s.ranking_type), s, POPULAR_TTL)).collect();
    self.kv.set_many(&items).await
  }
}

fn popular_key_str(kind: RankingType) -> &'static str {
  match kind {
    RankingType::Volume => "krxusd:popular:volume",
    RankingType::Value => "krxusd:popular:value",
    RankingType::Gain => "krxusd:popular:gain",
    RankingType::Loss => "krxusd:popular:loss",
    RankingType::MarketCap => "krxusd:popular:market_cap",
  }
}

/// `krxusd:market:status`, TTL 60s.
#[derive(Clone)]
pub struct MarketStatusCache {
  kv: KVCache,
}

impl MarketStatusCache {
  pub fn new(kv: KVCache) -> Self {
    MarketStatusCache { kv }
  }

  pub async fn get(&self) -> CacheResult<Option<MarketStatus>> {
    self.kv.get(MARKET_STATUS_KEY).await
  }

  pub async fn set(&self, status: &MarketStatus) -> CacheResult<()> {
    self.kv.set(MARKET_STATUS_KEY, status, MARKET_STATUS_TTL).await
  }
}

/// `krxusd:scheduler:state` (singleton) and `krxusd:scheduler:history`
/// (capped list, 100 entries, no explicit TTL).
#[derive(Clone)]
pub struct SchedulerStateCache {
  kv: KVCache,
}

impl SchedulerStateCache {
  pub fn new(kv: KVCache) -> Self {
    SchedulerStateCache { kv }
  }

  pub async fn get_state(&self) -> CacheResult<Option<SchedulerState>> {
    self.kv.get(SCHEDULER_STATE_KEY).await
  }

  pub async fn set_state(&self, state: &SchedulerState) -> CacheResult<()> {
    // No semantic TTL is specified for the live scheduler state; a
    // generous one guards against an unbounded stale-forever key if
    // the process is torn down uncleanly.
    self.kv.set(SCHEDULER_STATE_KEY, state, Duration::from_secs(3600)).await
  }

  pub async fn push_history(&self, record: &SchedulerRunRecord) -> CacheResult<()> {
    self
      .kv
      .push_capped(SCHEDULER_HISTORY_KEY, record, SCHEDULER_HISTORY_CAP, BATCH_HISTORY_TTL)
      .await
  }

  pub async fn history(&self) -> CacheResult<Vec<SchedulerRunRecord>> {
    self.kv.list_range(SCHEDULER_HISTORY_KEY).await
  }
}

/// `krxusd:batch:state` (singleton) and `krxusd:batch:history` (capped
/// list, 30 entries, TTL 604800s).
#[derive(Clone)]
pub struct BatchStateCache {
  kv: KVCache,
}

impl BatchStateCache {
  pub fn new(kv: KVCache) -> Self {
    BatchStateCache { kv }
  }

  pub async fn get_state(&self) -> CacheResult<Option<BatchState>> {
    self.kv.get(BATCH_STATE_KEY).await
  }

  pub async fn set_state(&self, state: &BatchState) -> CacheResult<()> {
    self.kv.set(BATCH_STATE_KEY, state, BATCH_HISTORY_TTL).await
  }

  pub async fn push_history(&self, record: &BatchRunRecord) -> CacheResult<()> {
    self.kv.push_capped(BATCH_HISTORY_KEY, record, BATCH_HISTORY_CAP, BATCH_HISTORY_TTL).await
  }

  pub async fn history(&self) -> CacheResult<Vec<BatchRunRecord>> {
    self.kv.list_range(BATCH_HISTORY_KEY).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn key_helpers_use_the_documented_namespace_scheme() {
    assert_eq!(realtime_price_key("005930"), "krxusd:stock:realtime:005930");
    assert_eq!(popular_key(RankingType::Volume), "krxusd:popular:volume");
    assert_eq!(MARKET_STATUS_KEY, "krxusd:market:status");
  }
}
