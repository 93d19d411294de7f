use crate::error::AdapterError;
use crate::trait_def::{AdapterResult, PriceSource};
use async_trait::async_trait;
use chrono::NaiveDate;
use krxusd_models::{DailyBar, Market, RealtimeQuote, Stock};
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use std::str::FromStr;
use std::time::Duration;

/// Fallback adapter scraping Naver Finance's public pages. Used when
/// the primary JSON API is unavailable; does not support master-list
/// or ranking lookups, only realtime/daily price data for a known
/// symbol.
pub struct NaverFinanceAdapter {
  client: reqwest::Client,
}

impl NaverFinanceAdapter {
  pub fn new(timeout: Duration) -> Self {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent("krxusd-market-data/0.1")
      .build()
      .expect("reqwest client configuration is valid");
    NaverFinanceAdapter { client }
  }

  fn parse_decimal(raw: &str) -> AdapterResult<Decimal> {
    let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-').collect();
    Decimal::from_str(&cleaned).map_err(|e| AdapterError::Parse(e.to_string()))
  }
}

#[async_trait]
impl PriceSource for NaverFinanceAdapter {
  fn name(&self) -> &'static str {
    "naver_finance"
  }

  async fn fetch_realtime(&self, symbol: &str) -> AdapterResult<RealtimeQuote> {
    let url = format!("https://finance.naver.com/item/main.naver?code={symbol}");
    let body = self.client.get(&url).send().await?.text().await?;
    let doc = Html::parse_document(&body);

    let price_selector = Selector::parse(".no_today .blind").expect("static selector is valid");
    let change_selector = Selector::parse(".no_exday .blind").expect("static selector is valid");

    let close = doc
      .select(&price_selector)
      .next()
      .map(|el| el.text().collect::<String>())
      .ok_or_else(|| AdapterError::Parse("price element not found".to_string()))?;
    let close = Self::parse_decimal(&close)?;

    let mut change_texts = doc.select(&change_selector);
    let change = change_texts
      .next()
      .map(|el| el.text().collect::<String>())
      .map(|t| Self::parse_decimal(&t))
      .transpose()?
      .unwrap_or(Decimal::ZERO);
    let change_pct = change_texts
      .next()
      .map(|el| el.text().collect::<String>())
      .map(|t| Self::parse_decimal(&t))
      .transpose()?
      .unwrap_or(Decimal::ZERO);

    Ok(RealtimeQuote {
      symbol: symbol.to_string(),
      open: close,
      high: close,
      low: close,
      close,
      volume: 0,
      change,
      change_pct,
      price_date: chrono::Utc::now().with_timezone(&chrono_tz::Asia::Seoul).date_naive(),
      source: self.name().to_string(),
    })
  }

  async fn fetch_daily(
    &self,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> AdapterResult<Vec<DailyBar>> {
    if end < start {
      return Ok(Vec::new());
    }
    let url = format!(
      "https://finance.naver.com/item/sise_day.naver?code={symbol}&page=1"
    );
    let body = self.client.get(&url).send().await?.text().await?;
    let doc = Html::parse_document(&body);
    let row_selector = Selector::parse("table.type2 tr").expect("static selector is valid");
    let cell_selector = Selector::parse("td span").expect("static selector is valid");

    let mut bars = Vec::new();
    for row in doc.select(&row_selector) {
      let cells: Vec<String> = row.select(&cell_selector).map(|c| c.text().collect()).collect();
      if cells.len() < 6 {
        continue;
      }
      let date = match NaiveDate::parse_from_str(cells[0].trim(), "%Y.%m.%d") {
        Ok(d) => d,
        Err(_) => continue,
      };
      if date < start || date > end {
        continue;
      }
      let close = Self::parse_decimal(&cells[1])?;
      let open = Self::parse_decimal(&cells[3])?;
      let high = Self::parse_decimal(&cells[4])?;
      let low = Self::parse_decimal(&cells[5])?;
      let volume: i64 = cells
        .get(6)
        .map(|v| v.chars().filter(|c| c.is_ascii_digit()).collect::<String>())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

      bars.push(DailyBar {
        price_date: date,
        open,
        high,
        low,
        close,
        volume,
        trading_value: None,
        market_cap: None,
      });
    }
    bars.sort_by_key(|b| b.price_date);
    Ok(bars)
  }

  async fn list_master(&self, _market: Market) -> AdapterResult<Vec<Stock>> {
    Err(AdapterError::NotFound("naver_finance does not support master-list lookups".to_string()))
  }

  async fn top_by_marcap(&self, _n: usize) -> AdapterResult<Vec<String>> {
    Err(AdapterError::NotFound("naver_finance does not support ranking lookups".to_string()))
  }

  async fn top_by_volume(&self, _n: usize) -> AdapterResult<Vec<String>> {
    Err(AdapterError::NotFound("naver_finance does not support ranking lookups".to_string()))
  }

  async fn fx_rate(&self) -> AdapterResult<Decimal> {
    let body = self
      .client
      .get("https://finance.naver.com/marketindex/")
      .send()
      .await?
      .text()
      .await?;
    let doc = Html::parse_document(&body);
    let selector = Selector::parse(".head_info .value").expect("static selector is valid");
    let raw = doc
      .select(&selector)
      .next()
      .map(|el| el.text().collect::<String>())
      .ok_or_else(|| AdapterError::Parse("fx rate element not found".to_string()))?;
    Self::parse_decimal(&raw)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_decimal_strips_thousands_separators() {
    assert_eq!(NaverFinanceAdapter::parse_decimal("72,000").unwrap(), Decimal::from(72000));
  }

  #[test]
  fn parse_decimal_handles_negative_change() {
    assert_eq!(NaverFinanceAdapter::parse_decimal("-1,200").unwrap(), Decimal::from(-1200));
  }
}
