//! Market-data access: the source trait, the KRX client and the fetch cache.

pub mod cache;
pub mod krx;
pub mod source;

pub use cache::{CacheKey, CachedSource, FetchCache};
pub use krx::KrxClient;
pub use source::{FetchError, MarketDataSource};
