use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
  #[error("redis error: {0}")]
  Redis(#[from] redis::RedisError),

  #[error("serialization error: {0}")]
  Serde(#[from] serde_json::Error),
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;

impl From<CacheError> for krxusd_core::Error {
  fn from(err: CacheError) -> Self {
    krxusd_core::Error::Cache(err.to_string())
  }
}
