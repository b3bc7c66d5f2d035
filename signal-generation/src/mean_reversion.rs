use crate::indicators::{rolling_mean, rolling_std};
use crate::signals::{SignalDescriptor, SignalGenerator, SignalRequest};
use anyhow::bail;
use async_trait::async_trait;
use common::{ChartData, Period, Recommendation, SignalResult};
use market_data::MarketDataSource;
use std::sync::Arc;

pub const MEAN_REVERSION: SignalDescriptor = SignalDescriptor {
    name: "mean_reversion",
    title: "Mean Reversion (Bollinger Bands)",
    description: "Assumes prices revert to their recent average and flags overbought or oversold conditions.",
    math: "Bollinger Bands around a 20-day SMA at ±2 sample standard deviations. Buy below the lower band, Sell above the upper band.",
    tickers_required: 1,
};

#[derive(Debug, Clone)]
pub struct MeanReversionConfig {
    pub window: usize,
    pub num_std_dev: f64,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        Self {
            window: 20,
            num_std_dev: 2.0,
        }
    }
}

/// Bollinger band mean reversion over one year of daily closes
pub struct MeanReversionSignal {
    source: Arc<dyn MarketDataSource>,
    config: MeanReversionConfig,
}

impl MeanReversionSignal {
    pub fn new(source: Arc<dyn MarketDataSource>, config: MeanReversionConfig) -> Self {
        Self { source, config }
    }
}

#[async_trait]
impl SignalGenerator for MeanReversionSignal {
    fn descriptor(&self) -> &SignalDescriptor {
        &MEAN_REVERSION
    }

    async fn generate(&self, request: &SignalRequest) -> anyhow::Result<SignalResult> {
        let series = self.source.fetch_series(&request.ticker, Period::OneYear).await?;
        let closes = series.closes();
        let labels = series.labels();

        let sma = rolling_mean(&closes, self.config.window);
        let std = rolling_std(&closes, self.config.window);

        let mut chart_labels = Vec::new();
        let mut prices = Vec::new();
        let mut means = Vec::new();
        let mut uppers = Vec::new();
        let mut lowers = Vec::new();
        for i in 0..closes.len() {
            if let (Some(m), Some(s)) = (sma[i], std[i]) {
                chart_labels.push(labels[i].clone());
                prices.push(closes[i]);
                means.push(m);
                uppers.push(m + s * self.config.num_std_dev);
                lowers.push(m - s * self.config.num_std_dev);
            }
        }

        let (Some(&price), Some(&upper), Some(&lower)) = (prices.last(), uppers.last(), lowers.last()) else {
            bail!(
                "Not enough data for {}-day Bollinger Bands: {} has {} bars",
                self.config.window,
                request.ticker,
                closes.len()
            );
        };

        let (recommendation, summary) = if price < lower {
            (
                Recommendation::Buy,
                format!(
                    "Price ({:.2}) is below the lower Bollinger Band ({:.2}). Asset is oversold.",
                    price, lower
                ),
            )
        } else if price > upper {
            (
                Recommendation::Sell,
                format!(
                    "Price ({:.2}) is above the upper Bollinger Band ({:.2}). Asset is overbought.",
                    price, upper
                ),
            )
        } else {
            (
                Recommendation::Hold,
                format!("Price ({:.2}) is within the bands. No signal.", price),
            )
        };

        let chart = ChartData::new(chart_labels)
            .with_series("price", prices)
            .with_series("sma", means)
            .with_series("upper_band", uppers)
            .with_series("lower_band", lowers);

        Ok(SignalResult::new(recommendation, summary).with_chart(chart))
    }
}
