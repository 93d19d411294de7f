//! Shared configuration, error types and constants used across every
//! krxusd crate.

mod config;
mod error;

pub use config::Config;
pub use error::{Error, Result};

/// Carry-forward window for dated FX-rate lookups, in days.
pub const FX_CARRY_FORWARD_DAYS: i64 = 4;

/// Number of mutex stripes guarding per-symbol sync serialization.
pub const SYNC_MUTEX_STRIPES: usize = 256;

/// Maximum length an error message is truncated to before being
/// persisted to `sync_status.error_message`.
pub const SYNC_ERROR_MAX_LEN: usize = 500;
