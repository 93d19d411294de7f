pub mod connection;
pub mod decimal;
pub mod error;
pub mod models;
pub mod schema;
pub mod store;

pub use connection::{build_async_pool, build_sync_pool, AsyncDbPool, SyncConnection, SyncPool};
pub use error::{DbError, DbResult};
pub use store::StockStore;
