use crate::error::AdapterError;
use crate::trait_def::{AdapterResult, PriceSource};
use async_trait::async_trait;
use chrono::NaiveDate;
use governor::{Quota, RateLimiter};
use krxusd_models::{DailyBar, Market, RealtimeQuote, Stock};
use rust_decimal::Decimal;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

const MAX_RETRIES: u32 = 3;

/// First-choice adapter: KRX's own JSON data API. Rate-limited and
/// retried with exponential backoff.
pub struct KrxApiAdapter {
  client: reqwest::Client,
  base_url: String,
  rate_limiter:
    Arc<RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>>,
}

impl KrxApiAdapter {
  pub fn new(base_url: impl Into<String>, timeout: Duration, requests_per_minute: u32) -> Self {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent("krxusd-market-data/0.1")
      .build()
      .expect("reqwest client configuration is valid");
    let quota = Quota::per_minute(NonZeroU32::new(requests_per_minute.max(1)).unwrap());
    KrxApiAdapter { client, base_url: base_url.into(), rate_limiter: Arc::new(RateLimiter::direct(quota)) }
  }

  async fn wait_for_rate_limit(&self) {
    self.rate_limiter.until_ready().await;
  }

  async fn get_json<T: serde::de::DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> AdapterResult<T> {
    let url = format!("{}{}", self.base_url, path);
    let mut attempt = 0;
    loop {
      self.wait_for_rate_limit().await;
      let result = self.client.get(&url).query(query).send().await;
      match result {
        Ok(resp) if resp.status().is_success() => {
          return resp.json::<T>().await.map_err(|e| AdapterError::Parse(e.to_string()));
        }
        Ok(resp) if resp.status().as_u16() == 429 => {
          attempt += 1;
          if attempt >= MAX_RETRIES {
            return Err(AdapterError::RateLimited(format!("{path} rate limited after {attempt} attempts")));
          }
        }
        Ok(resp) => {
          return Err(AdapterError::Http(format!("{path} returned status {}", resp.status())));
        }
        Err(err) => {
          attempt += 1;
          if attempt >= MAX_RETRIES {
            return Err(AdapterError::from(err));
          }
        }
      }
      let backoff_ms = 1000u64 * 2u64.pow(attempt.saturating_sub(1));
      tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
    }
  }
}

#[derive(serde::Deserialize)]
struct KrxQuoteResponse {
  symbol: String,
  open: String,
  high: String,
  low: String,
  close: String,
  volume: i64,
  change: String,
  change_pct: String,
  price_date: String,
}

#[derive(serde::Deserialize)]
struct KrxBarResponse {
  date: String,
  open: String,
  high: String,
  low: String,
  close: String,
  volume: i64,
  trading_value: Option<String>,
  market_cap: Option<String>,
}

#[derive(serde::Deserialize)]
struct KrxFxResponse {
  rate: String,
}

fn parse_decimal(raw: &str, field: &str) -> AdapterResult<Decimal> {
  Decimal::from_str(raw).map_err(|e| AdapterError::Parse(format!("{field}: {e}")))
}

fn parse_date(raw: &str, field: &str) -> AdapterResult<NaiveDate> {
  NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| AdapterError::Parse(format!("{field}: {e}")))
}

#[async_trait]
impl PriceSource for KrxApiAdapter {
  fn name(&self) -> &'static str {
    "krx_api"
  }

  #[instrument(skip(self))]
  async fn fetch_realtime(&self, symbol: &str) -> AdapterResult<RealtimeQuote> {
    let resp: KrxQuoteResponse =
      self.get_json("/quote", &[("symbol", symbol.to_string())]).await?;
    Ok(RealtimeQuote {
      symbol: resp.symbol,
      open: parse_decimal(&resp.open, "open")?,
      high: parse_decimal(&resp.high, "high")?,
      low: parse_decimal(&resp.low, "low")?,
      close: parse_decimal(&resp.close, "close")?,
      volume: resp.volume,
      change: parse_decimal(&resp.change, "change")?,
      change_pct: parse_decimal(&resp.change_pct, "change_pct")?,
      price_date: parse_date(&resp.price_date, "price_date")?,
      source: self.name().to_string(),
    })
  }

  #[instrument(skip(self))]
  async fn fetch_daily(
    &self,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> AdapterResult<Vec<DailyBar>> {
    if end < start {
      return Ok(Vec::new());
    }
    let bars: Vec<KrxBarResponse> = self
      .get_json(
        "/daily",
        &[
          ("symbol", symbol.to_string()),
          ("start", start.format("%Y-%m-%d").to_string()),
          ("end", end.format("%Y-%m-%d").to_string()),
        ],
      )
      .await?;

    bars
      .into_iter()
      .map(|b| {
        Ok(DailyBar {
          price_date: parse_date(&b.date, "date")?,
          open: parse_decimal(&b.open, "open")?,
          high: parse_decimal(&b.high, "high")?,
          low: parse_decimal(&b.low, "low")?,
          close: parse_decimal(&b.close, "close")?,
          volume: b.volume,
          trading_value: b.trading_value.as_deref().map(|v| parse_decimal(v, "trading_value")).transpose()?,
          market_cap: b.market_cap.as_deref().map(|v| parse_decimal(v, "market_cap")).transpose()?,
        })
      })
      .collect()
  }

  async fn list_master(&self, market: Market) -> AdapterResult<Vec<Stock>> {
    #[derive(serde::Deserialize)]
    struct KrxStockResponse {
      symbol: String,
      name: String,
      name_en: Option<String>,
      sector: Option<String>,
      industry: Option<String>,
      listed_shares: Option<i64>,
      listing_date: Option<String>,
    }

    let stocks: Vec<KrxStockResponse> =
      self.get_json("/master", &[("market", market.to_string())]).await?;

    stocks
      .into_iter()
      .map(|s| {
        Ok(Stock {
          symbol: s.symbol,
          name: s.name,
          name_en: s.name_en,
          market,
          sector: s.sector,
          industry: s.industry,
          listed_shares: s.listed_shares,
          listing_date: s.listing_date.as_deref().map(|d| parse_date(d, "listing_date")).transpose()?,
          is_active: true,
        })
      })
      .collect()
  }

  async fn top_by_marcap(&self, n: usize) -> AdapterResult<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct Ranked {
      symbol: String,
    }
    let ranked: Vec<Ranked> = self.get_json("/ranking/marcap", &[("limit", n.to_string())]).await?;
    Ok(ranked.into_iter().map(|r| r.symbol).collect())
  }

  async fn top_by_volume(&self, n: usize) -> AdapterResult<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct Ranked {
      symbol: String,
    }
    let ranked: Vec<Ranked> = self.get_json("/ranking/volume", &[("limit", n.to_string())]).await?;
    Ok(ranked.into_iter().map(|r| r.symbol).collect())
  }

  async fn fx_rate(&self) -> AdapterResult<Decimal> {
    let resp: KrxFxResponse = self.get_json("/fx/usdkrw", &[]).await?;
    parse_decimal(&resp.rate, "rate")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_decimal_rejects_garbage() {
    assert!(parse_decimal("not-a-number", "close").is_err());
    assert!(parse_decimal("1450.50", "close").is_ok());
  }

  #[test]
  fn parse_date_accepts_iso_format() {
    assert!(parse_date("2025-03-17", "date").is_ok());
    assert!(parse_date("03/17/2025", "date").is_err());
  }
}

#[cfg(test)]
mod http_tests {
  use super::*;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn adapter(base_url: String) -> KrxApiAdapter {
    KrxApiAdapter::new(base_url, Duration::from_secs(5), 600)
  }

  #[tokio::test]
  async fn fetch_realtime_parses_a_successful_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/quote"))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "symbol": "005930",
        "open": "71000",
        "high": "71500",
        "low": "70500",
        "close": "71200",
        "volume": 12_345_678,
        "change": "200",
        "change_pct": "0.28",
        "price_date": "2025-03-17"
      })))
      .mount(&server)
      .await;

    let quote = adapter(server.uri()).fetch_realtime("005930").await.unwrap();
    assert_eq!(quote.symbol, "005930");
    assert_eq!(quote.close, Decimal::from_str("71200").unwrap());
    assert_eq!(quote.source, "krx_api");
  }

  #[tokio::test]
  async fn fetch_realtime_surfaces_an_http_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).and(path("/quote")).respond_with(ResponseTemplate::new(500)).mount(&server).await;

    let err = adapter(server.uri()).fetch_realtime("005930").await.unwrap_err();
    assert!(matches!(err, AdapterError::Http(_)));
  }

  #[tokio::test]
  async fn fetch_daily_short_circuits_when_end_before_start_without_calling_the_server() {
    let server = MockServer::start().await;
    // No mock registered: a call to the server would fail the test via wiremock's
    // unexpected-request panic, proving the short-circuit never reaches the network.
    let start = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let bars = adapter(server.uri()).fetch_daily("005930", start, end).await.unwrap();
    assert!(bars.is_empty());
  }

  #[tokio::test]
  async fn fetch_daily_parses_a_bar_series() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/daily"))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
        {
          "date": "2025-03-17",
          "open": "71000",
          "high": "71500",
          "low": "70500",
          "close": "71200",
          "volume": 12_345_678,
          "trading_value": null,
          "market_cap": null
        }
      ])))
      .mount(&server)
      .await;

    let start = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
    let bars = adapter(server.uri()).fetch_daily("005930", start, end).await.unwrap();
    assert_eq!(bars.len(), 1);
    assert_eq!(bars[0].price_date, start);
  }
}
