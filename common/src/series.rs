//! Daily OHLCV bars

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Lookback window requested from the market-data layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "3y")]
    ThreeYears,
}

impl Period {
    /// Range string understood by chart APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneYear => "1y",
            Period::ThreeYears => "3y",
        }
    }

    /// Approximate number of daily bars in the period
    pub fn trading_days(&self) -> usize {
        match self {
            Period::OneYear => 252,
            Period::ThreeYears => 756,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One daily bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Bar with every price set to `close`, mostly for fixtures
    pub fn flat(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }
}

/// Date-ordered bars for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: String,
    pub bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.date);
        Self {
            ticker: ticker.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// ISO dates, the label format used by chart payloads
    pub fn labels(&self) -> Vec<String> {
        self.bars.iter().map(|b| b.date.format("%Y-%m-%d").to_string()).collect()
    }

    /// Trailing `n` bars (all of them if fewer exist)
    pub fn tail(&self, n: usize) -> PriceSeries {
        let start = self.bars.len().saturating_sub(n);
        PriceSeries {
            ticker: self.ticker.clone(),
            bars: self.bars[start..].to_vec(),
        }
    }

    /// Closing prices of both series on the dates they share, in date order
    pub fn align_closes(&self, other: &PriceSeries) -> Vec<(NaiveDate, f64, f64)> {
        let other_by_date: HashMap<NaiveDate, f64> =
            other.bars.iter().map(|b| (b.date, b.close)).collect();

        self.bars
            .iter()
            .filter_map(|b| other_by_date.get(&b.date).map(|close| (b.date, b.close, *close)))
            .collect()
    }
}
