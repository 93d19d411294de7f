use crate::error::AdapterError;
use async_trait::async_trait;
use chrono::NaiveDate;
use krxusd_models::{DailyBar, Market, RealtimeQuote, Stock};

pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// Adapter interface to one external market-data provider. The core
/// never names a concrete adapter; it only ever talks to
/// `dyn PriceSource`, usually via `CompositePriceSource`.
#[async_trait]
pub trait PriceSource: Send + Sync {
  /// A short, stable identifier used in log lines and in
  /// `SourceExhausted`'s per-provider reasons. Not shown to end users.
  fn name(&self) -> &'static str;

  async fn fetch_realtime(&self, symbol: &str) -> AdapterResult<RealtimeQuote>;

  async fn fetch_daily(
    &self,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> AdapterResult<Vec<DailyBar>>;

  async fn list_master(&self, market: Market) -> AdapterResult<Vec<Stock>>;

  async fn top_by_marcap(&self, n: usize) -> AdapterResult<Vec<String>>;

  async fn top_by_volume(&self, n: usize) -> AdapterResult<Vec<String>>;

  /// The realtime USD/KRW rate, as seen by this provider. Only the
  /// provider designated as the FX source in the composite's adapter
  /// order needs a real implementation; others may return `NotFound`.
  async fn fx_rate(&self) -> AdapterResult<rust_decimal::Decimal>;
}
