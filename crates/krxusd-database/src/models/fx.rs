use crate::decimal::{from_bigdecimal, to_bigdecimal};
use crate::error::DbResult;
use crate::schema::exchange_rates;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use krxusd_models::ExchangeRate;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = exchange_rates)]
#[diesel(primary_key(pair, rate_date))]
pub struct ExchangeRateRow {
  pub pair: String,
  pub rate_date: NaiveDate,
  pub rate: BigDecimal,
  pub source: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = exchange_rates)]
pub struct NewExchangeRateRow {
  pub pair: String,
  pub rate_date: NaiveDate,
  pub rate: BigDecimal,
  pub source: String,
}

impl ExchangeRateRow {
  pub fn into_domain(self) -> DbResult<ExchangeRate> {
    Ok(ExchangeRate {
      pair: self.pair,
      rate_date: self.rate_date,
      rate: from_bigdecimal(&self.rate)?,
      source: self.source,
    })
  }
}

impl From<&ExchangeRate> for NewExchangeRateRow {
  fn from(rate: &ExchangeRate) -> Self {
    NewExchangeRateRow {
      pair: rate.pair.clone(),
      rate_date: rate.rate_date,
      rate: to_bigdecimal(rate.rate),
      source: rate.source.clone(),
    }
  }
}
