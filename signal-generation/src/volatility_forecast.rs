use crate::indicators::{log_returns, rolling_std_opt};
use crate::signals::{SignalDescriptor, SignalGenerator, SignalRequest};
use anyhow::bail;
use async_trait::async_trait;
use common::{ChartData, Period, Recommendation, SignalResult};
use market_data::MarketDataSource;
use statrs::statistics::Statistics;
use std::sync::Arc;

pub const VOLATILITY_FORECAST: SignalDescriptor = SignalDescriptor {
    name: "volatility_forecast",
    title: "Volatility Forecasting (GARCH)",
    description: "Estimates future volatility for risk management and volatility targeting. Non-directional.",
    math: "Proxy: 20-day rolling standard deviation of log returns, annualized by sqrt(252). A GARCH(1,1) model would forecast variance from past squared returns and past variances.",
    tickers_required: 1,
};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Rolling historical volatility; always votes Hold
pub struct VolatilityForecastSignal {
    source: Arc<dyn MarketDataSource>,
    window: usize,
}

impl VolatilityForecastSignal {
    pub fn new(source: Arc<dyn MarketDataSource>, window: usize) -> Self {
        Self { source, window }
    }
}

#[async_trait]
impl SignalGenerator for VolatilityForecastSignal {
    fn descriptor(&self) -> &SignalDescriptor {
        &VOLATILITY_FORECAST
    }

    async fn generate(&self, request: &SignalRequest) -> anyhow::Result<SignalResult> {
        let series = self.source.fetch_series(&request.ticker, Period::OneYear).await?;
        let labels = series.labels();
        let returns = log_returns(&series.closes());
        let rolling = rolling_std_opt(&returns, self.window);

        let (chart_labels, volatility): (Vec<String>, Vec<f64>) = rolling
            .iter()
            .zip(labels)
            .filter_map(|(sd, label)| sd.map(|s| (label, s * TRADING_DAYS_PER_YEAR.sqrt())))
            .unzip();

        let Some(&latest) = volatility.last() else {
            bail!(
                "Not enough data for {}-day volatility: {} has {} bars",
                self.window,
                request.ticker,
                series.len()
            );
        };
        let average = volatility.iter().mean();

        let summary = format!(
            "Current {}-day annualized volatility is {:.2}%. The 1-year average volatility is {:.2}%. \
             This is a simple proxy; a full GARCH(1,1) model would provide a more robust forecast. \
             This model is non-directional, so the vote is 'Hold'.",
            self.window,
            latest * 100.0,
            average * 100.0
        );

        let chart = ChartData::new(chart_labels).with_series("volatility", volatility);
        Ok(SignalResult::new(Recommendation::Hold, summary).with_chart(chart))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_data::{trend_bars, InMemorySource};

    #[tokio::test]
    async fn test_constant_growth_has_zero_volatility() {
        let source = InMemorySource::new().with_bars("FLAT", trend_bars(100.0, 0.001, 100));
        let result = VolatilityForecastSignal::new(Arc::new(source), 20)
            .generate(&SignalRequest::single("FLAT"))
            .await
            .unwrap();

        assert_eq!(result.recommendation, Some(Recommendation::Hold));
        assert!(result.summary.unwrap().starts_with("Current 20-day annualized volatility is 0.00%"));

        // first return is undefined, so the first full window ends at row 20
        let chart = result.chart_data.unwrap();
        assert_eq!(chart.labels.len(), 100 - 20);
    }

    #[tokio::test]
    async fn test_alternating_moves_are_volatile() {
        let mut bars = trend_bars(100.0, 0.0, 60);
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.close = if i % 2 == 0 { 100.0 } else { 102.0 };
        }
        let source = InMemorySource::new().with_bars("CHOP", bars);
        let result = VolatilityForecastSignal::new(Arc::new(source), 20)
            .generate(&SignalRequest::single("CHOP"))
            .await
            .unwrap();

        let vol = result.chart_data.unwrap().series("volatility").unwrap().to_vec();
        assert!(vol.iter().all(|v| *v > 0.25));
        assert_eq!(result.recommendation, Some(Recommendation::Hold));
    }
}
