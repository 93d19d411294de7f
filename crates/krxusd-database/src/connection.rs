use crate::error::{DbError, DbResult};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel_async::pooled_connection::bb8::Pool as AsyncPool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;

/// Blocking pool used for `StockStore::upsert_daily` and other batched
/// writes that run inside `tokio::task::spawn_blocking`, kept separate
/// from the bb8-pooled async connections used by read paths.
pub type SyncPool = Pool<ConnectionManager<PgConnection>>;
pub type SyncConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Async pool used for read paths called directly from async
/// callers (`lastPriceDate`, `firstPriceDate`, `priceCount`, dated FX
/// lookups).
pub type AsyncDbPool = AsyncPool<AsyncPgConnection>;

const MAX_POOL_SIZE: u32 = 16;

pub fn build_sync_pool(database_url: &str) -> DbResult<SyncPool> {
  let manager = ConnectionManager::<PgConnection>::new(database_url);
  Pool::builder().max_size(MAX_POOL_SIZE).build(manager).map_err(|e| DbError::Pool(e.to_string()))
}

pub async fn build_async_pool(database_url: &str) -> DbResult<AsyncDbPool> {
  let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
  AsyncPool::builder()
    .max_size(MAX_POOL_SIZE)
    .build(manager)
    .await
    .map_err(|e| DbError::Pool(e.to_string()))
}
