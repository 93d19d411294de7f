use crate::decimal::{from_bigdecimal, from_bigdecimal_opt, to_bigdecimal, to_bigdecimal_opt};
use crate::error::DbResult;
use crate::schema::stock_prices;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use krxusd_models::{DailyBar, StockPriceDaily};
use rust_decimal::Decimal;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = stock_prices)]
#[diesel(primary_key(symbol, price_date))]
pub struct StockPriceRow {
  pub symbol: String,
  pub price_date: NaiveDate,
  pub open: BigDecimal,
  pub high: BigDecimal,
  pub low: BigDecimal,
  pub close: BigDecimal,
  pub volume: i64,
  pub trading_value: Option<BigDecimal>,
  pub market_cap: Option<BigDecimal>,
  pub exchange_rate: Option<BigDecimal>,
  pub close_price_usd: Option<BigDecimal>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = stock_prices)]
pub struct NewStockPriceRow {
  pub symbol: String,
  pub price_date: NaiveDate,
  pub open: BigDecimal,
  pub high: BigDecimal,
  pub low: BigDecimal,
  pub close: BigDecimal,
  pub volume: i64,
  pub trading_value: Option<BigDecimal>,
  pub market_cap: Option<BigDecimal>,
  pub exchange_rate: Option<BigDecimal>,
  pub close_price_usd: Option<BigDecimal>,
}

impl StockPriceRow {
  pub fn into_domain(self) -> DbResult<StockPriceDaily> {
    Ok(StockPriceDaily {
      symbol: self.symbol,
      price_date: self.price_date,
      open: from_bigdecimal(&self.open)?,
      high: from_bigdecimal(&self.high)?,
      low: from_bigdecimal(&self.low)?,
      close: from_bigdecimal(&self.close)?,
      volume: self.volume,
      trading_value: from_bigdecimal_opt(&self.trading_value)?,
      market_cap: from_bigdecimal_opt(&self.market_cap)?,
      exchange_rate: from_bigdecimal_opt(&self.exchange_rate)?,
      close_price_usd: from_bigdecimal_opt(&self.close_price_usd)?,
    })
  }
}

impl NewStockPriceRow {
  /// Builds an insertable row from a provider bar plus the dated FX
  /// rate, materializing `close_price_usd = close / fx` only when a
  /// rate is available — absent FX leaves the USD columns null rather
  /// than fabricating a value, per the Gap-Filling sync procedure.
  pub fn from_bar(symbol: &str, bar: &DailyBar, fx_rate: Option<Decimal>) -> Self {
    let close_price_usd = fx_rate
      .filter(|r| !r.is_zero())
      .map(|r| (bar.close / r).round_dp_with_strategy(4, rust_decimal::RoundingStrategy::MidpointNearestEven));

    NewStockPriceRow {
      symbol: symbol.to_string(),
      price_date: bar.price_date,
      open: to_bigdecimal(bar.open),
      high: to_bigdecimal(bar.high),
      low: to_bigdecimal(bar.low),
      close: to_bigdecimal(bar.close),
      volume: bar.volume,
      trading_value: to_bigdecimal_opt(bar.trading_value),
      market_cap: to_bigdecimal_opt(bar.market_cap),
      exchange_rate: fx_rate.map(to_bigdecimal),
      close_price_usd: close_price_usd.map(to_bigdecimal),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  fn bar() -> DailyBar {
    DailyBar {
      price_date: NaiveDate::from_ymd_opt(2025, 3, 17).unwrap(),
      open: dec!(100),
      high: dec!(105),
      low: dec!(98),
      close: dec!(1450),
      volume: 1000,
      trading_value: None,
      market_cap: None,
    }
  }

  #[test]
  fn materializes_usd_close_with_banker_rounding_when_fx_present() {
    let row = NewStockPriceRow::from_bar("005930", &bar(), Some(dec!(1450.0)));
    assert_eq!(from_bigdecimal(&row.close_price_usd.unwrap()).unwrap(), dec!(1.0000));
  }

  #[test]
  fn leaves_usd_columns_null_when_fx_absent() {
    let row = NewStockPriceRow::from_bar("005930", &bar(), None);
    assert!(row.close_price_usd.is_none());
    assert!(row.exchange_rate.is_none());
  }
}
