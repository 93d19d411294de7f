use crate::wiring::App;
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct SyncCommand {
  #[command(subcommand)]
  command: SyncSubcommands,
}

#[derive(Subcommand, Debug)]
enum SyncSubcommands {
  /// Run `analyze(stock)`, the Gap-Filling decision function, without
  /// performing any fetch or mutation.
  Analyze {
    /// KRX symbol, e.g. 005930
    symbol: String,
  },

  /// Run the full Gap-Filling sync procedure for one symbol.
  Run {
    symbol: String,

    /// Force a full Case A re-sync regardless of the stored cursor.
    #[arg(long)]
    force: bool,
  },

  /// `ensureSynced(symbol, autoSync)`: analyze, and sync only if
  /// `--auto-sync` is passed.
  Ensure {
    symbol: String,

    #[arg(long)]
    auto_sync: bool,
  },
}

pub async fn execute(cmd: SyncCommand, app: &App) -> Result<()> {
  match cmd.command {
    SyncSubcommands::Analyze { symbol } => {
      let analysis = app.sync_engine.analyze(&symbol).await?;
      println!("{}", serde_json::to_string_pretty(&analysis)?);
    }
    SyncSubcommands::Run { symbol, force } => {
      let (analysis, synced_count) = app.sync_engine.sync(&symbol, force).await?;
      println!(
        "{}",
        serde_json::json!({
          "symbol": symbol,
          "case": analysis.case.to_string(),
          "syncRange": analysis.start.zip(analysis.end),
          "syncedCount": synced_count,
        })
      );
    }
    SyncSubcommands::Ensure { symbol, auto_sync } => {
      let result = app.sync_engine.ensure_synced(&symbol, auto_sync).await?;
      println!("{}", serde_json::to_string_pretty(&result)?);
    }
  }
  Ok(())
}
