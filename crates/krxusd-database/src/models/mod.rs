pub mod fx;
pub mod popular;
pub mod price;
pub mod stock;
pub mod sync_status;

pub use fx::{ExchangeRateRow, NewExchangeRateRow};
pub use popular::{NewPopularStockRow, PopularStockRow};
pub use price::{NewStockPriceRow, StockPriceRow};
pub use stock::{NewStockRow, StockRow};
pub use sync_status::{NewSyncStatusRow, SyncStatusRow};
