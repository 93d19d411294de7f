use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of `UsdView::history_usd`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsdPricePoint {
  pub date: NaiveDate,
  pub krw_close: Decimal,
  pub fx: Decimal,
  pub usd_close: Decimal,
}

/// The result of `UsdView::current_usd`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUsdQuote {
  pub symbol: String,
  pub krw_price: Decimal,
  pub exchange_rate: Decimal,
  pub usd_price: Decimal,
}
