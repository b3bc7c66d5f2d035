use crate::indicators::rolling_mean;
use crate::signals::{SignalDescriptor, SignalGenerator, SignalRequest};
use anyhow::bail;
use async_trait::async_trait;
use common::{ChartData, Period, Recommendation, SignalResult};
use market_data::MarketDataSource;
use std::sync::Arc;
use tracing::debug;

pub const MOMENTUM: SignalDescriptor = SignalDescriptor {
    name: "momentum",
    title: "Momentum / Trend Following",
    description: "Assumes assets that have performed well recently keep performing well (and vice-versa), using a simple moving average crossover.",
    math: "Buy while the short-term SMA is above the long-term SMA, Sell while it is below. Crossover dates are marked on the chart.",
    tickers_required: 1,
};

/// Momentum configuration
#[derive(Debug, Clone)]
pub struct MomentumConfig {
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            short_window: 50,
            long_window: 200,
        }
    }
}

/// SMA crossover trend follower over three years of daily closes
pub struct MomentumSignal {
    source: Arc<dyn MarketDataSource>,
    config: MomentumConfig,
}

impl MomentumSignal {
    pub fn new(source: Arc<dyn MarketDataSource>, config: MomentumConfig) -> Self {
        Self { source, config }
    }
}

#[async_trait]
impl SignalGenerator for MomentumSignal {
    fn descriptor(&self) -> &SignalDescriptor {
        &MOMENTUM
    }

    async fn generate(&self, request: &SignalRequest) -> anyhow::Result<SignalResult> {
        let series = self.source.fetch_series(&request.ticker, Period::ThreeYears).await?;
        let closes = series.closes();
        let (short_window, long_window) = (self.config.short_window, self.config.long_window);

        if closes.len() < long_window {
            bail!(
                "Not enough data for a {}-day moving average: {} has {} bars",
                long_window,
                request.ticker,
                closes.len()
            );
        }

        let sma_short = rolling_mean(&closes, short_window);
        let sma_long = rolling_mean(&closes, long_window);
        let labels = series.labels();

        let mut chart_labels = Vec::new();
        let mut prices = Vec::new();
        let mut shorts = Vec::new();
        let mut longs = Vec::new();
        for i in 0..closes.len() {
            if let (Some(s), Some(l)) = (sma_short[i], sma_long[i]) {
                chart_labels.push(labels[i].clone());
                prices.push(closes[i]);
                shorts.push(s);
                longs.push(l);
            }
        }

        let (Some(&latest_short), Some(&latest_long)) = (shorts.last(), longs.last()) else {
            bail!("Moving averages undefined for {}", request.ticker);
        };

        // Crossovers: the bullish flag flipping on or off between consecutive rows
        let mut buy_signals = Vec::new();
        let mut sell_signals = Vec::new();
        for i in 1..shorts.len() {
            let was_bullish = shorts[i - 1] > longs[i - 1];
            let is_bullish = shorts[i] > longs[i];
            match (was_bullish, is_bullish) {
                (false, true) => buy_signals.push(chart_labels[i].clone()),
                (true, false) => sell_signals.push(chart_labels[i].clone()),
                _ => {}
            }
        }

        let (recommendation, summary) = if latest_short > latest_long {
            (
                Recommendation::Buy,
                format!(
                    "{}-day SMA ({:.2}) is above {}-day SMA ({:.2}). Bullish trend.",
                    short_window, latest_short, long_window, latest_long
                ),
            )
        } else {
            (
                Recommendation::Sell,
                format!(
                    "{}-day SMA ({:.2}) is below {}-day SMA ({:.2}). Bearish trend.",
                    short_window, latest_short, long_window, latest_long
                ),
            )
        };

        debug!(
            ticker = %request.ticker,
            crossovers = buy_signals.len() + sell_signals.len(),
            "Momentum computed"
        );

        let chart = ChartData::new(chart_labels)
            .with_series("price", prices)
            .with_series("sma_short", shorts)
            .with_series("sma_long", longs)
            .with_markers("buy_signals", buy_signals)
            .with_markers("sell_signals", sell_signals);

        Ok(SignalResult::new(recommendation, summary).with_chart(chart))
    }
}
