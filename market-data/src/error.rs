use common::Period;
use thiserror::Error;

/// Market data errors
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("No data found for ticker {ticker} with period {period}")]
    NoData { ticker: String, period: Period },

    #[error("Market data request failed: {0}")]
    Http(String),

    #[error("Failed to decode market data: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for MarketDataError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            MarketDataError::Decode(e.to_string())
        } else {
            MarketDataError::Http(e.to_string())
        }
    }
}
