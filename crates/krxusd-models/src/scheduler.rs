use crate::sync::SyncFailure;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One Job R tick's outcome, appended to the capped `scheduler:history`
/// list (cap 100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerRunRecord {
  pub run_at: DateTime<Utc>,
  pub duration_ms: i64,
  pub stocks_updated: usize,
  pub success: bool,
  pub error: Option<String>,
}

/// The live `scheduler:state` singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerState {
  pub last_run_at: Option<DateTime<Utc>>,
  pub last_success: Option<bool>,
  pub running: bool,
}

/// Lifecycle of a Job B run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchRunState {
  Running,
  Completed,
  Failed,
}

/// The live `batch:state` singleton, tracking in-flight progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchState {
  pub state: BatchRunState,
  pub started_at: Option<DateTime<Utc>>,
  pub target_date: Option<NaiveDate>,
  pub total_targets: usize,
  pub completed_targets: usize,
  pub failed_targets: usize,
  pub error: Option<String>,
}

impl BatchState {
  pub fn idle() -> Self {
    BatchState {
      state: BatchRunState::Completed,
      started_at: None,
      target_date: None,
      total_targets: 0,
      completed_targets: 0,
      failed_targets: 0,
      error: None,
    }
  }
}

/// One completed Job B run, appended to the capped `batch:history` list
/// (cap 30).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRunRecord {
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  pub target_date: NaiveDate,
  pub total_targets: usize,
  pub completed_targets: usize,
  pub failed_targets: usize,
  pub success: bool,
  pub error: Option<String>,
  /// Per-symbol failures within this run; a failure here never aborts
  /// the batch, it's only recorded against the symbol that hit it.
  pub failures: Vec<SyncFailure>,
}
