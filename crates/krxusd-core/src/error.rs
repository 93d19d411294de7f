use thiserror::Error;

/// Error kinds shared across every krxusd subsystem.
///
/// Variants map onto the error-kind taxonomy the service is designed
/// around rather than onto any single library's error type: callers
/// outside a given crate match on these kinds, not on `diesel::result::Error`
/// or `redis::RedisError` directly.
#[derive(Error, Debug)]
pub enum Error {
  #[error("symbol not found: {0}")]
  NotFound(String),

  #[error("all price source adapters failed: {reasons:?}")]
  SourceExhausted { reasons: Vec<(String, String)> },

  #[error("no fx rate available within the carry-forward window for {0}")]
  FxUnavailable(String),

  #[error("sync already in progress for {0}")]
  AlreadySyncing(String),

  #[error("transient failure, may recover: {0}")]
  Transient(String),

  #[error("data invariant violated: {0}")]
  Invariant(String),

  #[error("configuration error: {0}")]
  Config(String),

  #[error("environment variable error: {0}")]
  EnvVar(#[from] std::env::VarError),

  #[error("database error: {0}")]
  Db(String),

  #[error("cache error: {0}")]
  Cache(String),

  #[error("http error: {0}")]
  Http(String),

  #[error("serialization error: {0}")]
  Serde(#[from] serde_json::Error),

  #[error("date parsing error: {0}")]
  ParseDate(#[from] chrono::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
  /// Truncate an error reason to a bounded length before persisting it,
  /// per the Gap-Filling sync procedure's `failed(error := truncate(reason, 500))`.
  pub fn truncated_message(&self, max_len: usize) -> String {
    let msg = self.to_string();
    if msg.len() <= max_len {
      msg
    } else {
      let mut truncated = msg;
      truncated.truncate(max_len);
      truncated
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truncates_long_messages() {
    let err = Error::Transient("x".repeat(600));
    let msg = err.truncated_message(500);
    assert_eq!(msg.len(), 500);
  }

  #[test]
  fn leaves_short_messages_untouched() {
    let err = Error::NotFound("005930".to_string());
    let msg = err.truncated_message(500);
    assert_eq!(msg, "symbol not found: 005930");
  }

  #[test]
  fn source_exhausted_display_includes_reasons() {
    let err = Error::SourceExhausted {
      reasons: vec![("krx".to_string(), "timeout".to_string())],
    };
    assert!(err.to_string().contains("krx"));
  }
}
