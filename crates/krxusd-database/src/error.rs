use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
  #[error("connection pool error: {0}")]
  Pool(String),

  #[error("query error: {0}")]
  Query(#[from] diesel::result::Error),

  #[error("blocking task join error: {0}")]
  Join(String),

  #[error("decimal conversion error: {0}")]
  Decimal(String),
}

pub type DbResult<T> = std::result::Result<T, DbError>;

impl From<DbError> for krxusd_core::Error {
  fn from(err: DbError) -> Self {
    krxusd_core::Error::Db(err.to_string())
  }
}

impl From<diesel::r2d2::PoolError> for DbError {
  fn from(err: diesel::r2d2::PoolError) -> Self {
    DbError::Pool(err.to_string())
  }
}

impl From<bb8::RunError<diesel_async::pooled_connection::PoolError>> for DbError {
  fn from(err: bb8::RunError<diesel_async::pooled_connection::PoolError>) -> Self {
    DbError::Pool(err.to_string())
  }
}
