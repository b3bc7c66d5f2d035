//! Market Data Layer
//!
//! Daily price series for the signal generators:
//! - `MarketDataSource` trait implemented by every backend
//! - Yahoo chart API connector
//! - In-memory fixture source for tests and demos
//! - Bounded LRU cache with expiry and explicit invalidation

pub mod cache;
pub mod error;
pub mod memory;
pub mod source;
pub mod yahoo;

pub use cache::{CacheConfig, CachedSource};
pub use error::MarketDataError;
pub use memory::{trend_bars, InMemorySource};
pub use source::MarketDataSource;
pub use yahoo::YahooChartSource;

// Re-export common types for convenience
pub use common::{Bar, Period, PriceSeries};
