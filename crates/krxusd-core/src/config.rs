use crate::error::{Error, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;

/// Process-wide configuration, assembled once at startup from the
/// environment and threaded into every component's constructor.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
  pub database_url: String,
  pub redis_url: String,

  pub log_level: String,
  pub http_timeout_secs: u64,

  pub krx_api_base_url: String,
  pub krx_api_requests_per_minute: u32,

  pub scheduler_enabled: bool,
  pub scheduler_realtime_interval_sec: u64,
  pub scheduler_popular_interval_sec: u64,
  pub scheduler_max_batch_size: usize,
  pub scheduler_active_symbol_ttl_sec: i64,
  pub scheduler_daily_batch_hour: u32,
  pub scheduler_daily_batch_minute: u32,
  pub scheduler_misfire_grace_sec: u64,
  pub scheduler_shutdown_deadline_sec: u64,
  pub scheduler_job_b_retry_attempts: u32,
  pub scheduler_job_b_retry_delay_sec: u64,

  pub sync_default_history_days: i64,
  pub sync_max_history_years: i64,
  pub sync_stale_syncing_secs: i64,

  pub cors_origins: Vec<String>,
}

impl Config {
  /// Load configuration from the environment, applying sensible
  /// defaults for anything optional. Missing connection strings fail
  /// fast rather than falling back to a default.
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let database_url = env::var("DATABASE_URL")
      .map_err(|_| Error::Config("DATABASE_URL not set".to_string()))?;
    let redis_url =
      env::var("REDIS_URL").map_err(|_| Error::Config("REDIS_URL not set".to_string()))?;

    let log_level = env::var("KRXUSD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let http_timeout_secs = parse_env("KRXUSD_HTTP_TIMEOUT_SECS", 30)?;

    let krx_api_base_url = env::var("KRXUSD_KRX_API_BASE_URL")
      .unwrap_or_else(|_| "https://data.krx.co.kr/svc/apis".to_string());
    let krx_api_requests_per_minute = parse_env("KRXUSD_KRX_API_REQUESTS_PER_MINUTE", 60)?;

    let scheduler_enabled = env::var("KRXUSD_SCHEDULER_ENABLED")
      .map(|v| v != "false" && v != "0")
      .unwrap_or(true);
    let scheduler_realtime_interval_sec = parse_env("KRXUSD_SCHEDULER_REALTIME_INTERVAL_SEC", 60)?;
    let scheduler_popular_interval_sec = parse_env("KRXUSD_SCHEDULER_POPULAR_INTERVAL_SEC", 300)?;
    let scheduler_max_batch_size = parse_env("KRXUSD_SCHEDULER_MAX_BATCH_SIZE", 20)?;
    let scheduler_active_symbol_ttl_sec = parse_env("KRXUSD_SCHEDULER_ACTIVE_SYMBOL_TTL_SEC", 180)?;
    let scheduler_daily_batch_hour = parse_env("KRXUSD_SCHEDULER_DAILY_BATCH_HOUR", 16)?;
    let scheduler_daily_batch_minute = parse_env("KRXUSD_SCHEDULER_DAILY_BATCH_MINUTE", 0)?;
    let scheduler_misfire_grace_sec = parse_env("KRXUSD_MISFIRE_GRACE_SECS", 30)?;
    let scheduler_shutdown_deadline_sec = parse_env("KRXUSD_SHUTDOWN_DEADLINE_SECS", 30)?;
    let scheduler_job_b_retry_attempts = parse_env("KRXUSD_JOB_B_RETRY_ATTEMPTS", 3)?;
    let scheduler_job_b_retry_delay_sec = parse_env("KRXUSD_JOB_B_RETRY_DELAY_SECS", 60)?;

    let sync_default_history_days = parse_env("KRXUSD_SYNC_DEFAULT_HISTORY_DAYS", 365)?;
    let sync_max_history_years = parse_env("KRXUSD_SYNC_MAX_HISTORY_YEARS", 10)?;
    let sync_stale_syncing_secs = parse_env("KRXUSD_SYNC_STALE_SYNCING_SECS", 300)?;

    let cors_origins = env::var("KRXUSD_CORS_ORIGINS")
      .unwrap_or_default()
      .split(',')
      .map(|s| s.trim().to_string())
      .filter(|s| !s.is_empty())
      .collect();

    Ok(Config {
      database_url,
      redis_url,
      log_level,
      http_timeout_secs,
      krx_api_base_url,
      krx_api_requests_per_minute,
      scheduler_enabled,
      scheduler_realtime_interval_sec,
      scheduler_popular_interval_sec,
      scheduler_max_batch_size,
      scheduler_active_symbol_ttl_sec,
      scheduler_daily_batch_hour,
      scheduler_daily_batch_minute,
      scheduler_misfire_grace_sec,
      scheduler_shutdown_deadline_sec,
      scheduler_job_b_retry_attempts,
      scheduler_job_b_retry_delay_sec,
      sync_default_history_days,
      sync_max_history_years,
      sync_stale_syncing_secs,
      cors_origins,
    })
  }

  /// Build a config with sane defaults against local services, for tests.
  pub fn default_for_tests() -> Self {
    Config {
      database_url: "postgres://localhost/krxusd_test".to_string(),
      redis_url: "redis://127.0.0.1/".to_string(),
      log_level: "debug".to_string(),
      http_timeout_secs: 30,
      krx_api_base_url: "https://data.krx.co.kr/svc/apis".to_string(),
      krx_api_requests_per_minute: 60,
      scheduler_enabled: true,
      scheduler_realtime_interval_sec: 60,
      scheduler_popular_interval_sec: 300,
      scheduler_max_batch_size: 20,
      scheduler_active_symbol_ttl_sec: 180,
      scheduler_daily_batch_hour: 16,
      scheduler_daily_batch_minute: 0,
      scheduler_misfire_grace_sec: 30,
      scheduler_shutdown_deadline_sec: 30,
      scheduler_job_b_retry_attempts: 3,
      scheduler_job_b_retry_delay_sec: 60,
      sync_default_history_days: 365,
      sync_max_history_years: 10,
      sync_stale_syncing_secs: 300,
      cors_origins: Vec::new(),
    }
  }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
  match env::var(key) {
    Err(_) => Ok(default),
    Ok(raw) => raw.parse().map_err(|_| Error::Config(format!("invalid {key}"))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_for_tests_are_internally_consistent() {
    let cfg = Config::default_for_tests();
    assert_eq!(cfg.scheduler_realtime_interval_sec, 60);
    assert_eq!(cfg.scheduler_active_symbol_ttl_sec, 180);
    assert_eq!(cfg.sync_max_history_years, 10);
  }

  #[test]
  fn parse_env_falls_back_to_default_when_unset() {
    env::remove_var("KRXUSD_DOES_NOT_EXIST");
    let value: u64 = parse_env("KRXUSD_DOES_NOT_EXIST", 42).unwrap();
    assert_eq!(value, 42);
  }
}
