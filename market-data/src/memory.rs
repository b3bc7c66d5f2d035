use crate::error::MarketDataError;
use crate::source::MarketDataSource;
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use common::{Bar, Period, PriceSeries};
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory market data (for testing and development)
///
/// A period selects the trailing `Period::trading_days()` bars.
#[derive(Debug, Default, Clone)]
pub struct InMemorySource {
    bars: HashMap<String, Vec<Bar>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<Bar>) -> Self {
        self.insert(ticker, bars);
        self
    }

    pub fn insert(&mut self, ticker: &str, bars: Vec<Bar>) {
        self.bars.insert(ticker.to_uppercase(), bars);
    }

    pub fn tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = self.bars.keys().cloned().collect();
        tickers.sort();
        tickers
    }
}

#[async_trait]
impl MarketDataSource for InMemorySource {
    async fn fetch_series(&self, ticker: &str, period: Period) -> Result<Arc<PriceSeries>, MarketDataError> {
        let bars = self
            .bars
            .get(&ticker.to_uppercase())
            .filter(|bars| !bars.is_empty())
            .ok_or_else(|| MarketDataError::NoData {
                ticker: ticker.to_string(),
                period,
            })?;

        let series = PriceSeries::new(ticker, bars.clone()).tail(period.trading_days());
        Ok(Arc::new(series))
    }
}

/// Weekday bars compounding `daily_return` from `start_price`
///
/// Dates start on 2022-01-03 and skip weekends.
pub fn trend_bars(start_price: f64, daily_return: f64, days: usize) -> Vec<Bar> {
    let mut bars = Vec::with_capacity(days);
    let mut date = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap_or_default();
    let mut price = start_price;

    while bars.len() < days {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            bars.push(Bar {
                date,
                open: price,
                high: price * 1.005,
                low: price * 0.995,
                close: price,
                volume: 1_000_000.0,
            });
            price *= 1.0 + daily_return;
        }
        date += Duration::days(1);
    }

    bars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_is_case_insensitive_and_trimmed_to_period() {
        let source = InMemorySource::new().with_bars("aapl", trend_bars(100.0, 0.001, 800));

        let one_year = source.fetch_series("AAPL", Period::OneYear).await.unwrap();
        assert_eq!(one_year.len(), 252);

        let three_years = source.fetch_series("aapl", Period::ThreeYears).await.unwrap();
        assert_eq!(three_years.len(), 756);
        assert_eq!(one_year.bars.last(), three_years.bars.last());
    }

    #[tokio::test]
    async fn test_unknown_ticker_is_no_data() {
        let source = InMemorySource::new().with_bars("EMPTY", Vec::new());

        for ticker in ["MISSING", "EMPTY"] {
            let err = source.fetch_series(ticker, Period::OneYear).await.unwrap_err();
            assert!(matches!(err, MarketDataError::NoData { .. }));
        }
    }

    #[test]
    fn test_trend_bars_skip_weekends() {
        let bars = trend_bars(50.0, 0.0, 10);
        assert_eq!(bars.len(), 10);
        assert!(bars
            .iter()
            .all(|b| !matches!(b.date.weekday(), Weekday::Sat | Weekday::Sun)));
        assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
    }
}
