//! Shared domain types used across the krxusd workspace: the data
//! model entities named throughout the service's design (`Stock`,
//! `StockPriceDaily`, `ExchangeRate`, `SyncStatus`, ranking snapshots,
//! scheduler/batch state, and USD view rows).

pub mod cache_records;
pub mod calendar;
pub mod fx;
pub mod ranking;
pub mod scheduler;
pub mod stock;
pub mod sync;
pub mod usd;

pub use cache_records::CachedRealtimePrice;
pub use calendar::{MarketPhase, MarketStatus};
pub use fx::{ExchangeRate, FxMinuteSample, FxRealtime, USD_KRW_PAIR};
pub use ranking::{RankingEntry, RankingSnapshot, RankingType};
pub use scheduler::{BatchRunRecord, BatchRunState, BatchState, SchedulerRunRecord, SchedulerState};
pub use stock::{DailyBar, Market, RealtimeQuote, Stock, StockPriceDaily};
pub use sync::{DataType, EnsureSyncedResult, GapAnalysis, GapCase, SyncFailure, SyncState, SyncStatus};
pub use usd::{CurrentUsdQuote, UsdPricePoint};
