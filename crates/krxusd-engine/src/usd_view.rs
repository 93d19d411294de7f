//! C9 UsdView: stateless read path joining a symbol's KRW series with
//! the dated FX series to produce the USD-converted view.

use crate::fx_service::FxService;
use chrono::NaiveDate;
use krxusd_cache::ActiveSymbolTracker;
use krxusd_core::Result;
use krxusd_database::StockStore;
use krxusd_models::{CurrentUsdQuote, UsdPricePoint};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, instrument};

/// Decimal places `usdClose` and `usd_price` are rounded to, using
/// banker's rounding, matching the materialized `close_price_usd` column.
const USD_ROUNDING_SCALE: u32 = 4;

fn round_usd(value: Decimal) -> Decimal {
  value.round_dp_with_strategy(USD_ROUNDING_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Joins `StockStore`'s daily KRW series with `FxService`'s dated FX
/// series. Holds no state of its own beyond its collaborators.
#[derive(Clone)]
pub struct UsdView {
  store: StockStore,
  fx: FxService,
  tracker: ActiveSymbolTracker,
}

impl UsdView {
  pub fn new(store: StockStore, fx: FxService, tracker: ActiveSymbolTracker) -> Self {
    UsdView { store, fx, tracker }
  }

  /// `historyUsd(symbol, start, end)`: emits one row per bar whose
  /// date resolves an FX rate (directly or via carry-forward); dates
  /// with no resolvable rate are skipped with a debug log, never
  /// erroring the whole range.
  #[instrument(skip(self))]
  pub async fn history_usd(
    &self,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<UsdPricePoint>> {
    let _ = self.tracker.touch(symbol).await;

    let bars = self.store.price_range(symbol, start, end).await?;
    let fx_map = self.fx.historical_rates(start, end).await?;

    let mut rows = Vec::with_capacity(bars.len());
    for bar in bars {
      match fx_map.get(&bar.price_date) {
        Some(fx) if !fx.is_zero() => {
          rows.push(UsdPricePoint {
            date: bar.price_date,
            krw_close: bar.close,
            fx: *fx,
            usd_close: round_usd(bar.close / fx),
          });
        }
        _ => {
          debug!(symbol, date = %bar.price_date, "skipping date with no resolvable fx rate");
        }
      }
    }
    Ok(rows)
  }

  /// `currentUsd(symbol)`: joins the symbol's most recently persisted
  /// close with the current FX rate. Callers that need a realtime
  /// quote joined with FX should instead read `RealtimePriceCache`,
  /// which already carries a denormalized `close_usd` materialized by
  /// the scheduler's realtime refresh tick.
  #[instrument(skip(self))]
  pub async fn current_usd(&self, symbol: &str) -> Result<Option<CurrentUsdQuote>> {
    let _ = self.tracker.touch(symbol).await;

    let Some(last_date) = self.store.last_price_date(symbol).await? else {
      return Ok(None);
    };
    let bars = self.store.price_range(symbol, last_date, last_date).await?;
    let Some(bar) = bars.into_iter().next() else {
      return Ok(None);
    };

    let fx = self.fx.current_rate(false).await?;
    if fx.rate.is_zero() {
      return Ok(None);
    }

    Ok(Some(CurrentUsdQuote {
      symbol: symbol.to_string(),
      krw_price: bar.close,
      exchange_rate: fx.rate,
      usd_price: round_usd(bar.close / fx.rate),
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  #[test]
  fn rounds_half_to_even_at_four_decimal_places() {
    // 1.00005 rounds to 1.0000 (even) not 1.0001, under banker's rounding.
    assert_eq!(round_usd(dec!(1.00005)), dec!(1.0000));
    assert_eq!(round_usd(dec!(1.00015)), dec!(1.0002));
  }

  #[test]
  fn krw_close_divided_by_fx_matches_the_spec_formula() {
    let krw = dec!(71000);
    let fx = dec!(1450.1234);
    let usd = round_usd(krw / fx);
    assert_eq!(usd, (krw / fx).round_dp_with_strategy(4, RoundingStrategy::MidpointNearestEven));
  }
}
