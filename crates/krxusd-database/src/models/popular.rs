use crate::decimal::{from_bigdecimal, to_bigdecimal};
use crate::error::DbResult;
use crate::schema::popular_stocks;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use krxusd_models::{RankingEntry, RankingType};
use std::fmt;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = popular_stocks)]
#[diesel(primary_key(ranking_type, rank, computed_date))]
pub struct PopularStockRow {
  pub ranking_type: String,
  pub rank: i32,
  pub symbol: String,
  pub value: BigDecimal,
  pub computed_at: DateTime<Utc>,
  pub computed_date: NaiveDate,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = popular_stocks)]
pub struct NewPopularStockRow {
  pub ranking_type: String,
  pub rank: i32,
  pub symbol: String,
  pub value: BigDecimal,
  pub computed_at: DateTime<Utc>,
  pub computed_date: NaiveDate,
}

impl PopularStockRow {
  pub fn into_entry(self) -> DbResult<RankingEntry> {
    Ok(RankingEntry { rank: self.rank, symbol: self.symbol, value: from_bigdecimal(&self.value)? })
  }
}

impl NewPopularStockRow {
  /// Builds the rows for one ranking snapshot at `computed_at`. Only
  /// invoked for `ranking_type.is_persisted()` kinds — `market_cap`
  /// rankings are cache-only per the `popular_stocks` check
  /// constraint and never reach this constructor.
  pub fn from_snapshot(
    ranking_type: RankingType,
    entries: &[RankingEntry],
    computed_at: DateTime<Utc>,
  ) -> Vec<Self> {
    debug_assert!(ranking_type.is_persisted(), "market_cap rankings are cache-only");
    entries
      .iter()
      .map(|e| NewPopularStockRow {
        ranking_type: ranking_type.to_string(),
        rank: e.rank,
        symbol: e.symbol.clone(),
        value: to_bigdecimal(e.value),
        computed_at,
        computed_date: computed_at.with_timezone(&chrono_tz::Asia::Seoul).date_naive(),
      })
      .collect()
  }
}

impl fmt::Display for PopularStockRow {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}#{} {}", self.ranking_type, self.rank, self.symbol)
  }
}
