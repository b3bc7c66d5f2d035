// Signal contract
// Shared by every generator registered with the council

use async_trait::async_trait;
use common::SignalResult;
use serde::Serialize;

/// Static description of a signal generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalDescriptor {
    /// Registry key, e.g. `mean_reversion`
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub math: &'static str,
    /// 1 for single-ticker signals, 2 for pair signals
    pub tickers_required: u8,
}

impl SignalDescriptor {
    pub fn requires_pair(&self) -> bool {
        self.tickers_required == 2
    }
}

/// Tickers handed to a generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalRequest {
    pub ticker: String,
    pub pair_ticker: Option<String>,
}

impl SignalRequest {
    pub fn single(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            pair_ticker: None,
        }
    }

    pub fn pair(ticker: impl Into<String>, pair_ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            pair_ticker: Some(pair_ticker.into()),
        }
    }

    /// Second ticker, required by pair signals
    pub fn require_pair(&self) -> anyhow::Result<&str> {
        self.pair_ticker
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Ticker 2 is required for this strategy"))
    }
}

/// Signal generator trait
///
/// Generators are stateless with respect to each other: each call sees only
/// its request. A generator may fail by returning `Err` or by returning a
/// `SignalResult` whose `error` field is set.
#[async_trait]
pub trait SignalGenerator: Send + Sync {
    fn descriptor(&self) -> &SignalDescriptor;

    fn name(&self) -> &'static str {
        self.descriptor().name
    }

    async fn generate(&self, request: &SignalRequest) -> anyhow::Result<SignalResult>;
}
