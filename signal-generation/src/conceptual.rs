// Conceptual signals
// Strategies that need inputs a single ticker cannot provide (order books,
// news, a stock universe, a portfolio). They confirm the ticker has data and
// cast a fixed, documented vote.

use crate::signals::{SignalDescriptor, SignalGenerator, SignalRequest};
use async_trait::async_trait;
use common::{Period, Recommendation, SignalResult};
use market_data::MarketDataSource;
use std::sync::Arc;

pub const REINFORCEMENT: SignalDescriptor = SignalDescriptor {
    name: "reinforcement",
    title: "Reinforcement Learning (Deep Q-Learning)",
    description: "(Conceptual Placeholder) An agent learns a Buy/Sell/Hold policy by interacting with the market to maximize cumulative reward.",
    math: "A full implementation defines a state space (price, volume, indicators), an action space (Buy/Sell/Hold) and a reward, then trains a Deep Q-Network over many simulated steps.",
    tickers_required: 1,
};

pub const FACTOR_INVESTING: SignalDescriptor = SignalDescriptor {
    name: "factor_investing",
    title: "Multi-Factor Investing",
    description: "(Conceptual Placeholder) Selects assets by their exposure to factors such as Value, Momentum, Quality and Low-Volatility.",
    math: "A full implementation screens a universe of stocks, scores each on factors (P/E for Value, 12-month return for Momentum) and builds a portfolio tilted toward the desired exposures.",
    tickers_required: 1,
};

pub const MARKET_MAKING: SignalDescriptor = SignalDescriptor {
    name: "market_making",
    title: "Market Making Simulation",
    description: "(Conceptual Placeholder) Provides liquidity with simultaneous bids and asks, capturing the bid-ask spread.",
    math: "A simulation would model inventory risk and order book dynamics, e.g. Avellaneda-Stoikov quotes around a fair value.",
    tickers_required: 1,
};

pub const SENTIMENT: SignalDescriptor = SignalDescriptor {
    name: "sentiment",
    title: "NLP Sentiment Analysis",
    description: "(Conceptual Placeholder) Trades on sentiment extracted from news headlines, social media and financial reports.",
    math: "A full implementation scores text with an NLP model (BERT, VADER), aggregates sentiment over time and trades when it crosses a threshold.",
    tickers_required: 1,
};

pub const MEAN_VARIANCE_OPT: SignalDescriptor = SignalDescriptor {
    name: "mean_variance_opt",
    title: "Mean-Variance Optimization (Markowitz)",
    description: "(Conceptual Placeholder) Finds portfolio weights that maximize expected return for a given variance.",
    math: "Applies to a portfolio, not a single ticker: estimate expected returns and the covariance matrix for several assets and solve for the efficient frontier.",
    tickers_required: 1,
};

/// Fixed-vote placeholder that still validates the ticker against market data
pub struct ConceptualSignal {
    source: Arc<dyn MarketDataSource>,
    descriptor: &'static SignalDescriptor,
    recommendation: Recommendation,
    summary: &'static str,
}

impl ConceptualSignal {
    pub fn reinforcement(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source,
            descriptor: &REINFORCEMENT,
            recommendation: Recommendation::Hold,
            summary: "This is a placeholder for a Reinforcement Learning (Deep Q-Network) model. \
                      A trained agent would analyze the current state (price, indicators) and \
                      select an optimal action (Buy/Sell/Hold). This placeholder defaults to 'Hold'.",
        }
    }

    pub fn factor_investing(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source,
            descriptor: &FACTOR_INVESTING,
            recommendation: Recommendation::Buy,
            summary: "This is a placeholder for a Multi-Factor model. A full implementation \
                      would score this stock on factors like Value (P/E), Momentum (12-mo return), \
                      and Quality (ROE). This placeholder defaults to 'Buy' assuming a favorable factor screen.",
        }
    }

    pub fn market_making(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source,
            descriptor: &MARKET_MAKING,
            recommendation: Recommendation::Hold,
            summary: "This is a placeholder for a Market Making simulation. This strategy \
                      profits from the bid-ask spread and is neutral on direction. \
                      The recommendation is 'Hold' as it represents a neutral market-providing stance.",
        }
    }

    pub fn sentiment(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source,
            descriptor: &SENTIMENT,
            recommendation: Recommendation::Hold,
            summary: "This is a placeholder for an NLP Sentiment Analysis model. A real \
                      implementation would analyze real-time news and social media sentiment. \
                      This placeholder defaults to 'Hold', indicating neutral sentiment.",
        }
    }

    pub fn mean_variance_opt(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source,
            descriptor: &MEAN_VARIANCE_OPT,
            recommendation: Recommendation::Hold,
            summary: "This is a placeholder for Mean-Variance Optimization. This strategy \
                      is for *portfolio allocation* (how much to invest in multiple assets), \
                      not for directional bets on a single asset. It defaults to 'Hold' \
                      as it doesn't provide a Buy/Sell signal for one ticker.",
        }
    }
}

#[async_trait]
impl SignalGenerator for ConceptualSignal {
    fn descriptor(&self) -> &SignalDescriptor {
        self.descriptor
    }

    async fn generate(&self, request: &SignalRequest) -> anyhow::Result<SignalResult> {
        self.source.fetch_series(&request.ticker, Period::OneYear).await?;
        Ok(SignalResult::new(self.recommendation, self.summary).placeholder())
    }
}
