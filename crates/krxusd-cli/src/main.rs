use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use krxusd_core::Config;

mod commands;
mod wiring;

use commands::{
  calendar::CalendarCommand, query::QueryCommand, scheduler::SchedulerCommand, sync::SyncCommand,
};
use wiring::App;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "krxusd")]
#[command(propagate_version = true)]
struct Cli {
  #[command(subcommand)]
  command: Commands,

  /// Verbose (debug-level) logging.
  #[arg(short, long, global = true)]
  verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Gap-Filling sync operations for one symbol.
  Sync(SyncCommand),

  /// Read paths: cached realtime price, stored history, USD views.
  Query(QueryCommand),

  /// Job R / Job B control and status.
  Scheduler(SchedulerCommand),

  /// Pure calendar/market-phase queries.
  Calendar(CalendarCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
  dotenv().ok();

  let cli = Cli::parse();

  let log_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt().with_env_filter(log_level).init();

  let config = Config::from_env()?;
  let app = App::bootstrap(config).await?;

  match cli.command {
    Commands::Sync(cmd) => commands::sync::execute(cmd, &app).await?,
    Commands::Query(cmd) => commands::query::execute(cmd, &app).await?,
    Commands::Scheduler(cmd) => commands::scheduler::execute(cmd, &app).await?,
    Commands::Calendar(cmd) => commands::calendar::execute(cmd, &app).await?,
  }

  Ok(())
}
