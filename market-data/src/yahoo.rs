use crate::error::MarketDataError;
use crate::source::MarketDataSource;
use async_trait::async_trait;
use chrono::DateTime;
use common::{Bar, Period, PriceSeries};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart API connector
/// Returns daily bars for the requested range
pub struct YahooChartSource {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl YahooChartSource {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent("Mozilla/5.0 (compatible; quant-council/0.1)")
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn chart_url(&self, ticker: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), ticker)
    }
}

#[async_trait]
impl MarketDataSource for YahooChartSource {
    async fn fetch_series(&self, ticker: &str, period: Period) -> Result<Arc<PriceSeries>, MarketDataError> {
        debug!(ticker = %ticker, period = %period, "Fetching chart from Yahoo");

        let response = self
            .client
            .get(self.chart_url(ticker))
            .query(&[("range", period.as_str()), ("interval", "1d")])
            .send()
            .await?;

        // Unknown symbols come back as 404 with an error envelope
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketDataError::NoData {
                ticker: ticker.to_string(),
                period,
            });
        }

        if !response.status().is_success() {
            return Err(MarketDataError::Http(format!(
                "Yahoo chart API error: {}",
                response.status()
            )));
        }

        let body: ChartResponse = response.json().await?;
        let series = decode_chart(ticker, period, body)?;

        info!(ticker = %ticker, period = %period, bars = series.len(), "Fetched chart");

        Ok(Arc::new(series))
    }
}

fn decode_chart(ticker: &str, period: Period, body: ChartResponse) -> Result<PriceSeries, MarketDataError> {
    let no_data = || MarketDataError::NoData {
        ticker: ticker.to_string(),
        period,
    };

    if let Some(err) = body.chart.error {
        debug!(code = %err.code, description = %err.description, "Chart API returned error");
        return Err(no_data());
    }

    let result = body
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(no_data)?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let field = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        // Rows without a close are holidays or partial sessions
        let Some(close) = field(&quote.close, i) else {
            continue;
        };
        let date = DateTime::from_timestamp(*ts, 0)
            .ok_or_else(|| MarketDataError::Decode(format!("invalid timestamp {}", ts)))?
            .date_naive();

        bars.push(Bar {
            date,
            open: field(&quote.open, i).unwrap_or(close),
            high: field(&quote.high, i).unwrap_or(close),
            low: field(&quote.low, i).unwrap_or(close),
            close,
            volume: field(&quote.volume, i).unwrap_or(0.0),
        });
    }

    if bars.is_empty() {
        return Err(no_data());
    }

    Ok(PriceSeries::new(ticker, bars))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_decode_skips_null_closes() {
        let body = parse(
            r#"{"chart": {"result": [{
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {"quote": [{
                    "open": [187.15, null, 182.15],
                    "high": [188.44, null, 183.09],
                    "low": [183.89, null, 180.88],
                    "close": [185.64, null, 181.91],
                    "volume": [82488700, null, 71983600]
                }]}
            }], "error": null}}"#,
        );

        let series = decode_chart("AAPL", Period::OneYear, body).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![185.64, 181.91]);
        assert_eq!(series.labels()[0], "2024-01-02");
    }

    #[test]
    fn test_decode_error_envelope_is_no_data() {
        let body = parse(
            r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#,
        );

        let err = decode_chart("ZZZZ", Period::OneYear, body).unwrap_err();
        assert!(matches!(err, MarketDataError::NoData { .. }));
        assert_eq!(err.to_string(), "No data found for ticker ZZZZ with period 1y");
    }

    #[test]
    fn test_decode_empty_result_is_no_data() {
        let body = parse(r#"{"chart": {"result": [{"timestamp": [], "indicators": {"quote": [{}]}}]}}"#);
        assert!(matches!(
            decode_chart("AAPL", Period::ThreeYears, body),
            Err(MarketDataError::NoData { .. })
        ));
    }

    #[test]
    fn test_chart_url() {
        let source = YahooChartSource::new("https://example.test/chart/", Duration::from_secs(1)).unwrap();
        assert_eq!(source.chart_url("MSFT"), "https://example.test/chart/MSFT");
    }
}
