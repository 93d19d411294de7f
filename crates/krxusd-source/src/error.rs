use thiserror::Error;

/// Per-adapter failure, carried in `CompositePriceSource`'s
/// `SourceExhausted` error alongside every other adapter's reason.
#[derive(Error, Debug, Clone)]
pub enum AdapterError {
  #[error("http error: {0}")]
  Http(String),

  #[error("rate limited: {0}")]
  RateLimited(String),

  #[error("parse error: {0}")]
  Parse(String),

  #[error("symbol not found: {0}")]
  NotFound(String),
}

impl From<reqwest::Error> for AdapterError {
  fn from(err: reqwest::Error) -> Self {
    AdapterError::Http(err.to_string())
  }
}
