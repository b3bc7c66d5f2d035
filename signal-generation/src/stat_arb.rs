use crate::indicators::{rolling_mean, rolling_std};
use crate::signals::{SignalDescriptor, SignalGenerator, SignalRequest};
use anyhow::bail;
use async_trait::async_trait;
use common::{ChartData, Period, Recommendation, SignalResult};
use market_data::MarketDataSource;
use std::sync::Arc;
use tracing::debug;

pub const STAT_ARB: SignalDescriptor = SignalDescriptor {
    name: "stat_arb",
    title: "Statistical Arbitrage (Pairs Trading)",
    description: "Trades the temporary divergence of the price spread between two correlated stocks, assuming the spread reverts to its mean.",
    math: "Z-score of the log price ratio ln(A / B) over a 20-day window. Z > 2.0 shorts the spread (Sell A, Buy B); Z < -2.0 longs it (Buy A, Sell B).",
    tickers_required: 2,
};

#[derive(Debug, Clone)]
pub struct StatArbConfig {
    pub window: usize,
    /// Absolute z-score that opens a position
    pub entry_z: f64,
}

impl Default for StatArbConfig {
    fn default() -> Self {
        Self {
            window: 20,
            entry_z: 2.0,
        }
    }
}

/// Pairs trading on the z-score of the log price ratio
pub struct StatArbSignal {
    source: Arc<dyn MarketDataSource>,
    config: StatArbConfig,
}

impl StatArbSignal {
    pub fn new(source: Arc<dyn MarketDataSource>, config: StatArbConfig) -> Self {
        Self { source, config }
    }
}

#[async_trait]
impl SignalGenerator for StatArbSignal {
    fn descriptor(&self) -> &SignalDescriptor {
        &STAT_ARB
    }

    async fn generate(&self, request: &SignalRequest) -> anyhow::Result<SignalResult> {
        let ticker1 = request.ticker.as_str();
        let ticker2 = request.require_pair()?;

        let first = self.source.fetch_series(ticker1, Period::OneYear).await?;
        let second = self.source.fetch_series(ticker2, Period::OneYear).await?;

        let aligned = first.align_closes(&second);
        if aligned.is_empty() {
            return Ok(SignalResult::failed("No overlapping data for tickers."));
        }

        let spread: Vec<f64> = aligned.iter().map(|(_, a, b)| (a / b).ln()).collect();
        let mean = rolling_mean(&spread, self.config.window);
        let std = rolling_std(&spread, self.config.window);

        let mut labels = Vec::new();
        let mut z_scores = Vec::new();
        for (i, (date, _, _)) in aligned.iter().enumerate() {
            if let (Some(m), Some(s)) = (mean[i], std[i]) {
                let z = (spread[i] - m) / s;
                if z.is_finite() {
                    labels.push(date.format("%Y-%m-%d").to_string());
                    z_scores.push(z);
                }
            }
        }

        let Some(&latest_z) = z_scores.last() else {
            bail!(
                "Not enough overlapping history for a {}-day spread z-score ({} shared days)",
                self.config.window,
                aligned.len()
            );
        };

        debug!(ticker1, ticker2, z = latest_z, "Spread z-score computed");

        let entry = self.config.entry_z;
        let (recommendation, summary) = if latest_z > entry {
            (
                Recommendation::Sell,
                format!(
                    "Spread Z-Score ({:.2}) is > {:.1}. Signal: Short the spread (Sell {}, Buy {}).",
                    latest_z, entry, ticker1, ticker2
                ),
            )
        } else if latest_z < -entry {
            (
                Recommendation::Buy,
                format!(
                    "Spread Z-Score ({:.2}) is < -{:.1}. Signal: Long the spread (Buy {}, Sell {}).",
                    latest_z, entry, ticker1, ticker2
                ),
            )
        } else {
            (
                Recommendation::Hold,
                format!(
                    "Spread Z-Score ({:.2}) is between -{:.1} and {:.1}. No signal.",
                    latest_z, entry, entry
                ),
            )
        };

        let rows = z_scores.len();
        let chart = ChartData::new(labels)
            .with_series("z_score", z_scores)
            .with_series("upper_band", vec![entry; rows])
            .with_series("lower_band", vec![-entry; rows]);

        Ok(SignalResult::new(recommendation, summary).with_chart(chart))
    }
}
