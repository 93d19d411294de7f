//! C8 Scheduler: owns Job R's interval loop and Job B's cron trigger,
//! and the cooperative-then-hard shutdown sequence.

use crate::batch_job::{run_batch_job, BatchJobDeps};
use crate::realtime_job::{run_realtime_tick, RealtimeJobDeps};
use chrono::Utc;
use krxusd_cache::{BatchStateCache, SchedulerStateCache};
use krxusd_core::{Error, Result};
use krxusd_models::{BatchRunState, BatchState, SchedulerState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, instrument, warn};

/// Everything the scheduler needs beyond the two jobs' own
/// dependencies: timing and shutdown knobs, one-to-one with
/// `Config`'s `scheduler_*` fields.
pub struct SchedulerConfig {
  pub realtime_interval: Duration,
  pub daily_batch_hour_kst: u32,
  pub daily_batch_minute_kst: u32,
  pub misfire_grace: Duration,
  pub shutdown_deadline: Duration,
}

/// Converts a KST wall-clock hour/minute into the UTC hour `cron`
/// needs. KST has no DST, so this is a fixed 9-hour offset.
fn daily_batch_cron_utc(hour_kst: u32, minute_kst: u32) -> String {
  let total_minutes = (hour_kst * 60 + minute_kst + 24 * 60 - 9 * 60) % (24 * 60);
  let hour_utc = total_minutes / 60;
  let minute_utc = total_minutes % 60;
  format!("0 {minute_utc} {hour_utc} * * Mon,Tue,Wed,Thu,Fri")
}

/// Orchestrates Job R and Job B. Construct once at startup and call
/// `run` with a shutdown receiver; it returns once both jobs have
/// stopped (cooperatively, or at the hard deadline).
pub struct Scheduler {
  realtime_deps: RealtimeJobDeps,
  batch_deps: BatchJobDeps,
  scheduler_state_cache: SchedulerStateCache,
  batch_state_cache: BatchStateCache,
  config: SchedulerConfig,
}

impl Scheduler {
  pub fn new(
    realtime_deps: RealtimeJobDeps,
    batch_deps: BatchJobDeps,
    scheduler_state_cache: SchedulerStateCache,
    batch_state_cache: BatchStateCache,
    config: SchedulerConfig,
  ) -> Self {
    Scheduler { realtime_deps, batch_deps, scheduler_state_cache, batch_state_cache, config }
  }

  /// Runs both jobs until `shutdown` is set to `true`. Job R stops
  /// between ticks; Job B is asked to stop via the cron scheduler's own
  /// shutdown and, if still mid-run, is abandoned once
  /// `shutdown_deadline` elapses, with its `BatchState` marked failed.
  #[instrument(skip(self, shutdown))]
  pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let mut cron = JobScheduler::new()
      .await
      .map_err(|e| Error::Config(format!("failed to start cron scheduler: {e}")))?;

    let batch_deps = self.batch_deps;
    let batch_state_cache = self.batch_state_cache.clone();
    let misfire_grace = self.config.misfire_grace;
    let hour_kst = self.config.daily_batch_hour_kst;
    let minute_kst = self.config.daily_batch_minute_kst;
    let job_b_inflight = Arc::new(Mutex::new(()));
    let cron_expr = daily_batch_cron_utc(hour_kst, minute_kst);
    info!(%cron_expr, "registering daily batch job");

    let job_b = Job::new_async(cron_expr.as_str(), move |_uuid, _lock| {
      let deps = batch_deps.clone();
      let state_cache = batch_state_cache.clone();
      let inflight = job_b_inflight.clone();
      Box::pin(async move {
        let Ok(_guard) = inflight.try_lock() else {
          warn!("daily batch job tick coalesced: previous run still in flight");
          return;
        };

        let expected = Utc::now()
          .with_timezone(&chrono_tz::Asia::Seoul)
          .date_naive()
          .and_hms_opt(hour_kst, minute_kst, 0)
          .and_then(|naive| naive.and_local_timezone(chrono_tz::Asia::Seoul).single());
        if let Some(expected) = expected {
          let drift = (Utc::now().with_timezone(&chrono_tz::Asia::Seoul) - expected)
            .num_seconds()
            .unsigned_abs();
          if Duration::from_secs(drift) > misfire_grace {
            warn!(drift_secs = drift, "daily batch job misfired beyond grace window, skipping");
            return;
          }
        }

        match run_batch_job(&deps).await {
          Ok(Some(record)) => info!(
            total = record.total_targets,
            completed = record.completed_targets,
            failed = record.failed_targets,
            "daily batch job finished"
          ),
          Ok(None) => info!("daily batch job skipped: not a trading day"),
          Err(err) => warn!(%err, "daily batch job failed after exhausting retries"),
        }
      })
    })
    .map_err(|e| Error::Config(format!("failed to build daily batch job: {e}")))?;

    cron
      .add(job_b)
      .await
      .map_err(|e| Error::Config(format!("failed to register daily batch job: {e}")))?;
    cron.start().await.map_err(|e| Error::Config(format!("failed to start cron loop: {e}")))?;

    let realtime_deps = self.realtime_deps;
    let scheduler_state_cache = self.scheduler_state_cache;
    let interval_dur = self.config.realtime_interval;
    let mut job_r_shutdown = shutdown.clone();
    let job_r_handle = tokio::spawn(async move {
      // `Skip` drops ticks missed while the previous one was still
      // running rather than bursting to catch up, which is the
      // coalescing behavior Job R needs.
      let mut ticker = tokio::time::interval(interval_dur);
      ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
      loop {
        tokio::select! {
          _ = ticker.tick() => {
            let record = run_realtime_tick(&realtime_deps).await;
            if let Err(err) = scheduler_state_cache.push_history(&record).await {
              warn!(%err, "failed to append realtime tick history");
            }
            let state = SchedulerState {
              last_run_at: Some(record.run_at),
              last_success: Some(record.success),
              running: false,
            };
            if let Err(err) = scheduler_state_cache.set_state(&state).await {
              warn!(%err, "failed to persist scheduler state");
            }
          }
          _ = job_r_shutdown.changed() => {
            if *job_r_shutdown.borrow() {
              break;
            }
          }
        }
      }
    });

    shutdown.changed().await.ok();
    info!("shutdown requested, stopping scheduler");

    let shutdown_deadline = self.config.shutdown_deadline;
    if tokio::time::timeout(shutdown_deadline, job_r_handle).await.is_err() {
      warn!("job r did not stop within the shutdown deadline");
    }

    if let Err(err) = cron.shutdown().await {
      warn!(%err, "cron scheduler shutdown reported an error");
    }

    // If Job B was still running when the deadline passed, its
    // `BatchState` is left `running` forever otherwise; mark it failed
    // so operators don't mistake an abandoned run for one in progress.
    if let Ok(Some(state)) = self.batch_state_cache.get_state().await {
      if state.state == BatchRunState::Running {
        let abandoned = BatchState { state: BatchRunState::Failed, error: Some("shutdown".to_string()), ..state };
        if let Err(err) = self.batch_state_cache.set_state(&abandoned).await {
          warn!(%err, "failed to mark in-flight batch job as abandoned on shutdown");
        }
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn daily_batch_cron_utc_converts_kst_1600_to_utc_0700() {
    assert_eq!(daily_batch_cron_utc(16, 0), "0 0 7 * * Mon,Tue,Wed,Thu,Fri");
  }

  #[test]
  fn daily_batch_cron_utc_wraps_past_midnight() {
    // 3:30 AM KST is 6:30 PM UTC the previous day.
    assert_eq!(daily_batch_cron_utc(3, 30), "0 30 18 * * Mon,Tue,Wed,Thu,Fri");
  }
}
