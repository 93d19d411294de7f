//! Typed wrappers over a keyed KV store (Redis) with TTLs: the five
//! logical read/write namespaces, the three bookkeeping sets
//! (active-symbols, scheduler-state, batch-state), and the generic
//! `KVCache` capability they are all built on.

mod active_symbols;
mod error;
mod namespaces;
mod store;

pub use active_symbols::ActiveSymbolTracker;
pub use error::{CacheError, CacheResult};
pub use namespaces::{
  BatchStateCache, FxCache, MarketStatusCache, PopularCache, RealtimePriceCache,
  SchedulerStateCache, StockMinuteCache,
};
pub use store::KVCache;
