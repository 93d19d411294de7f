//! Concrete `PriceSource` adapters, registered into a
//! `CompositePriceSource` at startup in priority order.

pub mod krx_api;
pub mod naver;
pub mod yahoo;

pub use krx_api::KrxApiAdapter;
pub use naver::NaverFinanceAdapter;
pub use yahoo::YahooFinanceAdapter;
