use crate::schema::sync_status;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use krxusd_models::{DataType, SyncState, SyncStatus};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = sync_status)]
#[diesel(primary_key(symbol, data_type))]
pub struct SyncStatusRow {
  pub symbol: String,
  pub data_type: String,
  pub status: String,
  pub last_sync_date: Option<NaiveDate>,
  pub last_sync_at: Option<DateTime<Utc>>,
  pub error_message: Option<String>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = sync_status)]
pub struct NewSyncStatusRow {
  pub symbol: String,
  pub data_type: String,
  pub status: String,
  pub last_sync_date: Option<NaiveDate>,
  pub last_sync_at: Option<DateTime<Utc>>,
  pub error_message: Option<String>,
}

fn data_type_str(dt: DataType) -> &'static str {
  match dt {
    DataType::DailyPrice => "daily_price",
    DataType::MinutePrice => "minute_price",
    DataType::Fundamental => "fundamental",
  }
}

fn status_str(s: SyncState) -> &'static str {
  match s {
    SyncState::Pending => "pending",
    SyncState::Syncing => "syncing",
    SyncState::Completed => "completed",
    SyncState::Failed => "failed",
  }
}

impl NewSyncStatusRow {
  pub fn new(
    symbol: &str,
    data_type: DataType,
    status: SyncState,
    last_sync_date: Option<NaiveDate>,
    last_sync_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
  ) -> Self {
    NewSyncStatusRow {
      symbol: symbol.to_string(),
      data_type: data_type_str(data_type).to_string(),
      status: status_str(status).to_string(),
      last_sync_date,
      last_sync_at,
      error_message,
    }
  }
}

impl SyncStatusRow {
  pub fn into_domain(self) -> SyncStatus {
    SyncStatus {
      symbol: self.symbol,
      data_type: match self.data_type.as_str() {
        "minute_price" => DataType::MinutePrice,
        "fundamental" => DataType::Fundamental,
        _ => DataType::DailyPrice,
      },
      status: match self.status.as_str() {
        "pending" => SyncState::Pending,
        "syncing" => SyncState::Syncing,
        "failed" => SyncState::Failed,
        _ => SyncState::Completed,
      },
      last_sync_date: self.last_sync_date,
      last_sync_at: self.last_sync_at,
      error_message: self.error_message,
    }
  }

  /// `true` when this row is `syncing` and older than the configured
  /// stale-recovery threshold, meaning some writer crashed mid-sync and
  /// another writer may safely claim the row.
  pub fn is_stale_syncing(&self, now: DateTime<Utc>, stale_after_secs: i64) -> bool {
    self.status == "syncing"
      && now.signed_duration_since(self.updated_at).num_seconds() > stale_after_secs
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  fn row(status: &str, updated_secs_ago: i64) -> SyncStatusRow {
    SyncStatusRow {
      symbol: "005930".to_string(),
      data_type: "daily_price".to_string(),
      status: status.to_string(),
      last_sync_date: None,
      last_sync_at: None,
      error_message: None,
      updated_at: Utc::now() - Duration::seconds(updated_secs_ago),
    }
  }

  #[test]
  fn stale_syncing_row_is_recoverable_past_the_threshold() {
    let row = row("syncing", 600);
    assert!(row.is_stale_syncing(Utc::now(), 300));
  }

  #[test]
  fn fresh_syncing_row_is_not_recoverable() {
    let row = row("syncing", 10);
    assert!(!row.is_stale_syncing(Utc::now(), 300));
  }

  #[test]
  fn completed_row_is_never_stale_syncing() {
    let row = row("completed", 10_000);
    assert!(!row.is_stale_syncing(Utc::now(), 300));
  }
}
