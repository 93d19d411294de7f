//! The core engine: C4 FxService, C6 SyncEngine (Gap-Filling), and C9
//! UsdView. `krxusd-scheduler` drives these from its two jobs;
//! `krxusd-cli` wires them up at process startup.

mod fx_service;
mod sync_engine;
mod usd_view;

pub use fx_service::{FxService, FX_CARRY_FORWARD_DAYS};
pub use sync_engine::{analyze_gap, SyncEngine};
pub use usd_view::UsdView;
