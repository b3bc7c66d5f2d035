use crate::error::MarketDataError;
use async_trait::async_trait;
use common::{Period, PriceSeries};
use std::sync::Arc;

/// Backend able to return daily bars for a ticker
///
/// Implementations fail with `MarketDataError::NoData` rather than returning
/// an empty series.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_series(&self, ticker: &str, period: Period) -> Result<Arc<PriceSeries>, MarketDataError>;
}

#[async_trait]
impl<T: MarketDataSource + ?Sized> MarketDataSource for Arc<T> {
    async fn fetch_series(&self, ticker: &str, period: Period) -> Result<Arc<PriceSeries>, MarketDataError> {
        (**self).fetch_series(ticker, period).await
    }
}
