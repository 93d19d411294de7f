use crate::wiring::App;
use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct QueryCommand {
  #[command(subcommand)]
  command: QuerySubcommands,
}

#[derive(Subcommand, Debug)]
enum QuerySubcommands {
  /// The realtime-cache quote for a symbol, if present.
  Price { symbol: String },

  /// The stored KRW daily series for a symbol over `[start, end]`.
  History {
    symbol: String,
    #[arg(long)]
    start: NaiveDate,
    #[arg(long)]
    end: NaiveDate,
  },

  /// `UsdView::history_usd`: the USD-converted series for `[start, end]`.
  Usd {
    symbol: String,
    #[arg(long)]
    start: NaiveDate,
    #[arg(long)]
    end: NaiveDate,
  },

  /// `UsdView::current_usd`: the latest stored close, joined with the
  /// current FX rate.
  UsdCurrent { symbol: String },
}

pub async fn execute(cmd: QueryCommand, app: &App) -> Result<()> {
  match cmd.command {
    QuerySubcommands::Price { symbol } => {
      app.tracker.touch(&symbol).await.ok();
      match app.realtime_cache.get(&symbol).await? {
        Some(quote) => println!("{}", serde_json::to_string_pretty(&quote)?),
        None => println!("{{\"symbol\": \"{symbol}\", \"cached\": false}}"),
      }
    }
    QuerySubcommands::History { symbol, start, end } => {
      app.tracker.touch(&symbol).await.ok();
      let bars = app.store.price_range(&symbol, start, end).await?;
      println!("{}", serde_json::to_string_pretty(&bars)?);
    }
    QuerySubcommands::Usd { symbol, start, end } => {
      let rows = app.usd_view.history_usd(&symbol, start, end).await?;
      println!("{}", serde_json::to_string_pretty(&rows)?);
    }
    QuerySubcommands::UsdCurrent { symbol } => match app.usd_view.current_usd(&symbol).await? {
      Some(quote) => println!("{}", serde_json::to_string_pretty(&quote)?),
      None => println!("{{\"symbol\": \"{symbol}\", \"available\": false}}"),
    },
  }
  Ok(())
}
