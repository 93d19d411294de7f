use crate::wiring::App;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct CalendarCommand {
  #[command(subcommand)]
  command: CalendarSubcommands,
}

#[derive(Subcommand, Debug)]
enum CalendarSubcommands {
  /// The current KST market phase and minutes remaining until close.
  Phase,

  /// Whether `date` is a KRX trading day (weekday and not a holiday).
  IsTradingDay { date: NaiveDate },
}

pub async fn execute(cmd: CalendarCommand, app: &App) -> Result<()> {
  match cmd.command {
    CalendarSubcommands::Phase => {
      let now = Utc::now();
      let phase = app.calendar.phase_at(now);
      println!(
        "{}",
        serde_json::json!({
          "phase": phase,
          "isTradingTime": phase.is_trading_time(),
          "minutesRemaining": app.calendar.minutes_remaining(now),
        })
      );
    }
    CalendarSubcommands::IsTradingDay { date } => {
      println!(
        "{}",
        serde_json::json!({ "date": date, "isTradingDay": app.calendar.is_trading_day(date) })
      );
    }
  }
  Ok(())
}
