use crate::wiring::App;
use anyhow::Result;
use clap::{Args, Subcommand};
use krxusd_scheduler::{run_batch_job, run_realtime_tick};
use tokio::sync::watch;
use tracing::info;

#[derive(Args, Debug)]
pub struct SchedulerCommand {
  #[command(subcommand)]
  command: SchedulerSubcommands,
}

#[derive(Subcommand, Debug)]
enum SchedulerSubcommands {
  /// The live scheduler/batch state plus their bounded run histories.
  Status,

  /// Run a single Job R tick (realtime refresh) and exit.
  RunRealtimeOnce,

  /// Run a single Job B attempt (daily batch) and exit, bypassing the
  /// trading-day guard so it is runnable for manual backfills.
  RunBatchOnce,

  /// Start the scheduler loop (Job R interval + Job B cron) and block
  /// until interrupted with Ctrl-C.
  Serve,
}

pub async fn execute(cmd: SchedulerCommand, app: &App) -> Result<()> {
  match cmd.command {
    SchedulerSubcommands::Status => {
      let scheduler_state = app.scheduler_state_cache.get_state().await?;
      let scheduler_history = app.scheduler_state_cache.history().await?;
      let batch_state = app.batch_state_cache.get_state().await?;
      let batch_history = app.batch_state_cache.history().await?;
      println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
          "scheduler": { "state": scheduler_state, "history": scheduler_history },
          "batch": { "state": batch_state, "history": batch_history },
        }))?
      );
    }
    SchedulerSubcommands::RunRealtimeOnce => {
      let deps = app.realtime_job_deps();
      let record = run_realtime_tick(&deps).await;
      app.scheduler_state_cache.push_history(&record).await?;
      println!("{}", serde_json::to_string_pretty(&record)?);
    }
    SchedulerSubcommands::RunBatchOnce => {
      let deps = app.batch_job_deps();
      match run_batch_job(&deps).await? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => println!("{{\"skipped\": true, \"reason\": \"not a trading day\"}}"),
      }
    }
    SchedulerSubcommands::Serve => {
      let (shutdown_tx, shutdown_rx) = watch::channel(false);
      let scheduler = app.scheduler();
      let run_handle = tokio::spawn(scheduler.run(shutdown_rx));

      tokio::signal::ctrl_c().await.ok();
      info!("ctrl-c received, shutting down scheduler");
      shutdown_tx.send(true).ok();
      run_handle.await??;
    }
  }
  Ok(())
}
