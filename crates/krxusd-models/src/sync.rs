use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three categories of data a `SyncStatus` row tracks. Only
/// `daily_price` is driven by the synchronization engine today; the
/// other two are reserved identity values for the `sync_status`
/// table's check constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
  DailyPrice,
  MinutePrice,
  Fundamental,
}

impl fmt::Display for DataType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      DataType::DailyPrice => "daily_price",
      DataType::MinutePrice => "minute_price",
      DataType::Fundamental => "fundamental",
    };
    write!(f, "{s}")
  }
}

/// Lifecycle state of a `SyncStatus` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
  Pending,
  Syncing,
  Completed,
  Failed,
}

impl fmt::Display for SyncState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      SyncState::Pending => "pending",
      SyncState::Syncing => "syncing",
      SyncState::Completed => "completed",
      SyncState::Failed => "failed",
    };
    write!(f, "{s}")
  }
}

/// One `(stock, data_type)` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
  pub symbol: String,
  pub data_type: DataType,
  pub status: SyncState,
  pub last_sync_date: Option<NaiveDate>,
  pub last_sync_at: Option<DateTime<Utc>>,
  pub error_message: Option<String>,
}

/// The outcome of `analyze(stock)`, the Gap-Filling decision function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapCase {
  NoData,
  Gap,
  UpToDate,
}

impl fmt::Display for GapCase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      GapCase::NoData => "no_data",
      GapCase::Gap => "gap_detected",
      GapCase::UpToDate => "up_to_date",
    };
    write!(f, "{s}")
  }
}

/// `analyze(stock)`'s full result: the case plus, for `Gap`/`NoData`,
/// the inclusive date range that should be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapAnalysis {
  pub case: GapCase,
  pub start: Option<NaiveDate>,
  pub end: Option<NaiveDate>,
}

/// The structured result of `ensureSynced`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsureSyncedResult {
  pub symbol: String,
  pub case: GapCase,
  pub needs_sync: bool,
  pub synced: bool,
  pub synced_count: usize,
  pub sync_range: Option<(NaiveDate, NaiveDate)>,
  pub sync_error: Option<String>,
}

/// A structured per-symbol failure record, surfaced instead of
/// aborting the whole batch it occurred in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncFailure {
  pub symbol: String,
  pub sync_case: String,
  pub synced_count: usize,
  pub message: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn gap_case_display_matches_protocol_names() {
    assert_eq!(GapCase::NoData.to_string(), "no_data");
    assert_eq!(GapCase::Gap.to_string(), "gap_detected");
    assert_eq!(GapCase::UpToDate.to_string(), "up_to_date");
  }
}
