use crate::schema::stocks;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use krxusd_models::{Market, Stock};
use std::str::FromStr;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = stocks)]
#[diesel(primary_key(symbol))]
pub struct StockRow {
  pub symbol: String,
  pub name: String,
  pub name_en: Option<String>,
  pub market: String,
  pub sector: Option<String>,
  pub industry: Option<String>,
  pub listed_shares: Option<i64>,
  pub listing_date: Option<NaiveDate>,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = stocks)]
pub struct NewStockRow {
  pub symbol: String,
  pub name: String,
  pub name_en: Option<String>,
  pub market: String,
  pub sector: Option<String>,
  pub industry: Option<String>,
  pub listed_shares: Option<i64>,
  pub listing_date: Option<NaiveDate>,
  pub is_active: bool,
}

impl StockRow {
  /// Converts a persisted row into the domain type. Panics only if the
  /// stored `market` value has drifted from the check constraint,
  /// which would itself indicate a data-integrity bug upstream.
  pub fn into_domain(self) -> Stock {
    Stock {
      symbol: self.symbol,
      name: self.name,
      name_en: self.name_en,
      market: Market::from_str(&self.market).expect("market column is check-constrained"),
      sector: self.sector,
      industry: self.industry,
      listed_shares: self.listed_shares,
      listing_date: self.listing_date,
      is_active: self.is_active,
    }
  }
}

impl NewStockRow {
  pub fn auto_created(symbol: &str, name: Option<&str>, market: Option<Market>) -> Self {
    NewStockRow {
      symbol: symbol.to_string(),
      name: name.unwrap_or(symbol).to_string(),
      name_en: None,
      market: market.unwrap_or(Market::Kospi).to_string(),
      sector: None,
      industry: None,
      listed_shares: None,
      listing_date: None,
      is_active: true,
    }
  }
}
