//! Process-startup wiring: constructs every component in the
//! deterministic order — KVCache → DB pool →
//! MarketCalendar → PriceSource → FxService → StockStore → SyncEngine
//! → ActiveSymbolTracker → Scheduler — and tears them down in reverse
//! by simply dropping this struct.

use anyhow::{Context, Result};
use krxusd_cache::{
  ActiveSymbolTracker, BatchStateCache, FxCache, KVCache, MarketStatusCache, PopularCache,
  RealtimePriceCache, SchedulerStateCache,
};
use krxusd_calendar::MarketCalendar;
use krxusd_core::Config;
use krxusd_database::{build_async_pool, build_sync_pool, StockStore};
use krxusd_engine::{FxService, SyncEngine, UsdView};
use krxusd_scheduler::{BatchJobDeps, RealtimeJobDeps, Scheduler, SchedulerConfig};
use krxusd_source::{CompositePriceSource, KrxApiAdapter, NaverFinanceAdapter, YahooFinanceAdapter};
use std::sync::Arc;
use std::time::Duration;

/// Every long-lived component instance, assembled once at startup and
/// shared by every CLI subcommand (and, for `serve`, the scheduler).
pub struct App {
  pub config: Config,
  pub calendar: Arc<MarketCalendar>,
  pub source: Arc<CompositePriceSource>,
  pub store: StockStore,
  pub fx: FxService,
  pub sync_engine: SyncEngine,
  pub tracker: ActiveSymbolTracker,
  pub usd_view: UsdView,
  pub realtime_cache: RealtimePriceCache,
  pub fx_cache: FxCache,
  pub market_status_cache: MarketStatusCache,
  pub popular_cache: PopularCache,
  pub scheduler_state_cache: SchedulerStateCache,
  pub batch_state_cache: BatchStateCache,
}

impl App {
  pub async fn bootstrap(config: Config) -> Result<Self> {
    let kv = KVCache::connect(&config.redis_url).await.context("connecting to redis")?;
    kv.health_check().await.context("redis health check failed")?;

    let sync_pool = build_sync_pool(&config.database_url).context("building sync db pool")?;
    let async_pool =
      build_async_pool(&config.database_url).await.context("building async db pool")?;

    let calendar = Arc::new(MarketCalendar::new());

    let timeout = Duration::from_secs(config.http_timeout_secs);
    let adapters: Vec<Arc<dyn krxusd_source::PriceSource>> = vec![
      Arc::new(KrxApiAdapter::new(
        config.krx_api_base_url.clone(),
        timeout,
        config.krx_api_requests_per_minute,
      )),
      Arc::new(NaverFinanceAdapter::new(timeout)),
      Arc::new(YahooFinanceAdapter::new().context("constructing yahoo finance adapter")?),
    ];
    let source = Arc::new(CompositePriceSource::new(adapters));

    let fx_cache = FxCache::new(kv.clone());
    let store = StockStore::new(sync_pool, async_pool);
    let fx = FxService::new(fx_cache.clone(), source.clone(), store.clone(), calendar.clone());

    let sync_engine = SyncEngine::new(
      store.clone(),
      source.clone(),
      fx.clone(),
      calendar.clone(),
      config.sync_default_history_days,
      config.sync_max_history_years,
      config.sync_stale_syncing_secs,
    );

    let tracker = ActiveSymbolTracker::new(kv.clone(), config.scheduler_active_symbol_ttl_sec);
    let usd_view = UsdView::new(store.clone(), fx.clone(), tracker.clone());

    Ok(App {
      config,
      calendar,
      source,
      store,
      fx,
      sync_engine,
      tracker,
      usd_view,
      realtime_cache: RealtimePriceCache::new(kv.clone()),
      fx_cache,
      market_status_cache: MarketStatusCache::new(kv.clone()),
      popular_cache: PopularCache::new(kv.clone()),
      scheduler_state_cache: SchedulerStateCache::new(kv.clone()),
      batch_state_cache: BatchStateCache::new(kv),
    })
  }

  /// Job R's dependency bundle, rebuilt fresh for each caller since it
  /// borrows nothing and every field is cheap to clone (`Arc`s and
  /// pooled handles).
  pub fn realtime_job_deps(&self) -> RealtimeJobDeps {
    RealtimeJobDeps {
      calendar: self.calendar.clone(),
      tracker: self.tracker.clone(),
      source: self.source.clone(),
      fx: self.fx.clone(),
      realtime_cache: self.realtime_cache.clone(),
      market_status_cache: self.market_status_cache.clone(),
      max_batch: self.config.scheduler_max_batch_size,
      fanout_concurrency: self.config.scheduler_max_batch_size,
    }
  }

  /// Job B's dependency bundle. The batch sizing/ranking constants
  /// (marcap top 100, volume top 50, popular-cache top 20, batches of
  /// 10) are literal defaults, not yet promoted to `Config` fields
  /// since no operator override has been needed.
  pub fn batch_job_deps(&self) -> BatchJobDeps {
    BatchJobDeps {
      calendar: self.calendar.clone(),
      source: self.source.clone(),
      sync_engine: self.sync_engine.clone(),
      store: self.store.clone(),
      realtime_cache: self.realtime_cache.clone(),
      popular_cache: self.popular_cache.clone(),
      batch_state_cache: self.batch_state_cache.clone(),
      marcap_top_n: 100,
      volume_top_n: 50,
      popular_cache_top_n: 20,
      sync_batch_size: 10,
      inter_batch_delay: Duration::from_secs(1),
      retry_attempts: self.config.scheduler_job_b_retry_attempts,
      retry_delay: Duration::from_secs(self.config.scheduler_job_b_retry_delay_sec),
    }
  }

  /// Builds the `Scheduler` over this app's already-wired
  /// dependencies. Kept separate from `bootstrap` because not every
  /// subcommand needs a scheduler (e.g. `query`/`sync` one-shots).
  pub fn scheduler(&self) -> Scheduler {
    let scheduler_config = SchedulerConfig {
      realtime_interval: Duration::from_secs(self.config.scheduler_realtime_interval_sec),
      daily_batch_hour_kst: self.config.scheduler_daily_batch_hour,
      daily_batch_minute_kst: self.config.scheduler_daily_batch_minute,
      misfire_grace: Duration::from_secs(self.config.scheduler_misfire_grace_sec),
      shutdown_deadline: Duration::from_secs(self.config.scheduler_shutdown_deadline_sec),
    };

    Scheduler::new(
      self.realtime_job_deps(),
      self.batch_job_deps(),
      self.scheduler_state_cache.clone(),
      self.batch_state_cache.clone(),
      scheduler_config,
    )
  }
}
