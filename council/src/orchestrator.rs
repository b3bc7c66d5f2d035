//! Council orchestrator
//!
//! `run_council` validates the ticker, runs every registered signal through
//! the invocation guard (at most `max_concurrent_signals` at a time), then
//! tallies and briefs in registry order regardless of completion order.

use crate::briefing::synthesize;
use crate::config::CouncilConfig;
use crate::error::{CouncilError, Result, ValidationError};
use crate::guard::{InvocationGuard, SignalOutcome};
use crate::registry::{PairFallback, SignalRegistry};
use crate::tally::VoteTally;
use chrono::{DateTime, Utc};
use common::{Recommendation, SignalResult, Vote};
use futures::stream::{self, StreamExt};
use lazy_static::lazy_static;
use market_data::MarketDataSource;
use regex::Regex;
use serde::Serialize;
use signal_generation::{default_generators, SignalDescriptor};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

lazy_static! {
    // Exchange tickers plus index (^GSPC), class (BRK-B, RDS.A) and FX (EURUSD=X) forms
    static ref TICKER_PATTERN: Regex = Regex::new(r"^\^?[A-Z0-9][A-Z0-9.\-=]{0,19}$").unwrap();
}

/// Trim, uppercase and check a ticker symbol
pub fn validate_ticker(ticker: &str) -> std::result::Result<String, ValidationError> {
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(ValidationError::EmptyTicker);
    }

    let normalized = ticker.to_uppercase();
    if !TICKER_PATTERN.is_match(&normalized) {
        return Err(ValidationError::MalformedTicker(ticker.to_string()));
    }
    Ok(normalized)
}

/// Everything one council run produced
#[derive(Debug, Clone, Serialize)]
pub struct CouncilResult {
    pub run_id: Uuid,
    pub ticker: String,
    pub generated_at: DateTime<Utc>,
    pub council_vote: Recommendation,
    pub votes: BTreeMap<Recommendation, Vec<String>>,
    /// One entry per registered signal, `Error` included
    pub recommendations: BTreeMap<String, Vote>,
    pub briefing: String,
    /// Per-signal outcomes in registry order
    pub signals: Vec<SignalOutcome>,
}

impl CouncilResult {
    pub fn tally(&self) -> VoteTally {
        VoteTally {
            votes: self.votes.clone(),
            council_vote: self.council_vote,
        }
    }

    pub fn failed_signals(&self) -> Vec<&str> {
        self.signals
            .iter()
            .filter(|s| s.vote.is_error())
            .map(|s| s.name.as_str())
            .collect()
    }
}

/// The council: a fixed registry plus the policy for running it
pub struct Council {
    registry: SignalRegistry,
    fallback: PairFallback,
    guard: InvocationGuard,
    max_concurrent: usize,
    request_deadline: Option<Duration>,
}

impl Council {
    pub fn new(registry: SignalRegistry, config: &CouncilConfig) -> Result<Self> {
        config.validate()?;
        if registry.is_empty() {
            return Err(CouncilError::Aggregation("no signals registered".to_string()));
        }

        Ok(Self {
            registry,
            fallback: PairFallback::new(
                config.reference_ticker.as_str(),
                config.secondary_reference_ticker.as_str(),
            ),
            guard: InvocationGuard::new(config.signal_timeout()),
            max_concurrent: config.max_concurrent_signals,
            request_deadline: config.request_deadline(),
        })
    }

    /// Council over the standard ten generators reading from `source`
    pub fn with_source(source: Arc<dyn MarketDataSource>, config: &CouncilConfig) -> Result<Self> {
        Self::new(SignalRegistry::new(default_generators(source))?, config)
    }

    pub fn registry(&self) -> &SignalRegistry {
        &self.registry
    }

    /// Signal metadata in registry order
    pub fn descriptors(&self) -> Vec<SignalDescriptor> {
        self.registry.descriptors()
    }

    /// Run every registered signal on `ticker` and aggregate the votes
    ///
    /// Only validation fails; signal faults become `Error` votes.
    pub async fn run_council(&self, ticker: &str) -> Result<CouncilResult> {
        let ticker = validate_ticker(ticker)?;
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let deadline = self.request_deadline.map(|d| started + d);

        info!(
            %run_id,
            ticker = %ticker,
            signals = self.registry.len(),
            concurrency = self.max_concurrent,
            "Convening council"
        );

        // `buffered` yields in input order, so outcomes stay in registry order
        let outcomes: Vec<SignalOutcome> = stream::iter(self.registry.iter().map(|generator| {
            let request = self.fallback.request_for(generator.descriptor(), &ticker);
            self.guard.invoke(generator, request, deadline)
        }))
        .buffered(self.max_concurrent)
        .collect()
        .await;

        if outcomes.len() != self.registry.len() {
            return Err(CouncilError::Aggregation(format!(
                "expected {} signal outcomes, got {}",
                self.registry.len(),
                outcomes.len()
            )));
        }

        let tally = VoteTally::from_outcomes(&outcomes);
        let briefing = synthesize(&ticker, &tally, &outcomes);
        let recommendations: BTreeMap<String, Vote> = outcomes
            .iter()
            .map(|o| (o.name.clone(), o.vote))
            .collect();

        info!(
            %run_id,
            ticker = %ticker,
            council_vote = %tally.council_vote,
            buy = tally.count(Recommendation::Buy),
            sell = tally.count(Recommendation::Sell),
            hold = tally.count(Recommendation::Hold),
            errors = outcomes.len() - tally.counted(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Council reached a verdict"
        );

        Ok(CouncilResult {
            run_id,
            ticker,
            generated_at: Utc::now(),
            council_vote: tally.council_vote,
            votes: tally.votes,
            recommendations,
            briefing,
            signals: outcomes,
        })
    }

    /// Run a single signal with explicit tickers
    ///
    /// Pair signals need `pair_ticker`; no fallback is applied here.
    pub async fn run_signal(
        &self,
        name: &str,
        ticker: &str,
        pair_ticker: Option<&str>,
    ) -> Result<SignalResult> {
        let ticker = validate_ticker(ticker)?;
        let pair_ticker = match pair_ticker.map(str::trim).filter(|t| !t.is_empty()) {
            Some(pair) => Some(validate_ticker(pair)?),
            None => None,
        };

        let (generator, request) = self.registry.request(name, &ticker, pair_ticker.as_deref())?;
        debug!(signal = name, ticker = %ticker, pair = ?request.pair_ticker, "Running single signal");

        let deadline = self.request_deadline.map(|d| Instant::now() + d);
        let result = self.guard.call(generator, request, deadline).await?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignalFault;
    use async_trait::async_trait;
    use market_data::{trend_bars, InMemorySource};
    use signal_generation::{SignalGenerator, SignalRequest};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const NAMES: [&str; 10] = [
        "momentum",
        "mean_reversion",
        "ml_predictive",
        "volatility_forecast",
        "stat_arb",
        "reinforcement",
        "factor_investing",
        "market_making",
        "sentiment",
        "mean_variance_opt",
    ];

    #[derive(Clone, Copy)]
    enum Behavior {
        Vote(Recommendation),
        Fail,
        Panic,
        SleepThen(u64, Recommendation),
    }

    struct StubSignal {
        descriptor: SignalDescriptor,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
        requests: Mutex<Vec<SignalRequest>>,
    }

    #[async_trait]
    impl SignalGenerator for StubSignal {
        fn descriptor(&self) -> &SignalDescriptor {
            &self.descriptor
        }

        async fn generate(&self, request: &SignalRequest) -> anyhow::Result<SignalResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }

            match self.behavior {
                Behavior::Vote(rec) => Ok(SignalResult::new(rec, format!("{} says {}", self.descriptor.name, rec))),
                Behavior::Fail => anyhow::bail!("No data found for ticker {} with period 1y", request.ticker),
                Behavior::Panic => panic!("division by zero"),
                Behavior::SleepThen(ms, rec) => {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(SignalResult::new(rec, "slow"))
                }
            }
        }
    }

    struct Fixture {
        council: Council,
        calls: Arc<AtomicUsize>,
        stubs: Vec<Arc<StubSignal>>,
    }

    fn fixture(behaviors: [Behavior; 10], config: CouncilConfig) -> Fixture {
        let calls = Arc::new(AtomicUsize::new(0));
        let stubs: Vec<Arc<StubSignal>> = NAMES
            .iter()
            .copied()
            .zip(behaviors)
            .map(|(name, behavior)| {
                Arc::new(StubSignal {
                    descriptor: SignalDescriptor {
                        name,
                        title: name,
                        description: "",
                        math: "",
                        tickers_required: if name == "stat_arb" { 2 } else { 1 },
                    },
                    behavior,
                    calls: Arc::clone(&calls),
                    requests: Mutex::new(Vec::new()),
                })
            })
            .collect();

        let generators: Vec<Arc<dyn SignalGenerator>> = stubs
            .iter()
            .map(|s| Arc::clone(s) as Arc<dyn SignalGenerator>)
            .collect();
        let registry = SignalRegistry::new(generators).unwrap();

        Fixture {
            council: Council::new(registry, &config).unwrap(),
            calls,
            stubs,
        }
    }

    fn uniform(rec: Recommendation) -> [Behavior; 10] {
        [Behavior::Vote(rec); 10]
    }

    #[tokio::test]
    async fn test_split_council_holds() {
        use Recommendation::*;
        let behaviors = [Buy, Sell, Buy, Hold, Buy, Hold, Buy, Hold, Hold, Sell].map(Behavior::Vote);
        let result = fixture(behaviors, CouncilConfig::default())
            .council
            .run_council("AAPL")
            .await
            .unwrap();

        assert_eq!(result.votes[&Buy].len(), 4);
        assert_eq!(result.votes[&Sell].len(), 2);
        assert_eq!(result.votes[&Hold].len(), 4);
        assert_eq!(result.council_vote, Hold);
    }

    #[tokio::test]
    async fn test_unanimous_buy() {
        let result = fixture(uniform(Recommendation::Buy), CouncilConfig::default())
            .council
            .run_council("AAPL")
            .await
            .unwrap();

        assert_eq!(result.council_vote, Recommendation::Buy);
        let buys: Vec<&str> = result.votes[&Recommendation::Buy].iter().map(String::as_str).collect();
        assert_eq!(buys, NAMES.to_vec());
        assert!(result.votes[&Recommendation::Sell].is_empty());
        assert!(result.votes[&Recommendation::Hold].is_empty());
    }

    #[tokio::test]
    async fn test_half_failing_council_still_decides() {
        let mut behaviors = uniform(Recommendation::Hold);
        for behavior in behaviors.iter_mut().step_by(2) {
            *behavior = Behavior::Fail;
        }
        let result = fixture(behaviors, CouncilConfig::default())
            .council
            .run_council("AAPL")
            .await
            .unwrap();

        let errors = result.recommendations.values().filter(|v| **v == Vote::Error).count();
        let holds = result.recommendations.values().filter(|v| **v == Vote::Hold).count();
        assert_eq!((errors, holds), (5, 5));
        assert_eq!(result.tally().counted(), 5);
        assert_eq!(result.council_vote, Recommendation::Hold);
        assert_eq!(result.failed_signals(), vec!["momentum", "ml_predictive", "stat_arb", "factor_investing", "sentiment"]);
        assert!(result.briefing.contains("Rationale: No data found for ticker AAPL with period 1y"));
    }

    #[tokio::test]
    async fn test_all_failing_council_holds() {
        let result = fixture([Behavior::Fail; 10], CouncilConfig::default())
            .council
            .run_council("AAPL")
            .await
            .unwrap();

        assert_eq!(result.council_vote, Recommendation::Hold);
        assert_eq!(result.recommendations.len(), 10);
        assert!(result.recommendations.values().all(|v| v.is_error()));
        assert_eq!(result.briefing.matches("Vote: Error").count(), 10);
    }

    #[tokio::test]
    async fn test_empty_ticker_rejected_before_any_signal() {
        let fixture = fixture(uniform(Recommendation::Buy), CouncilConfig::default());

        for bad in ["", "   "] {
            let err = fixture.council.run_council(bad).await.unwrap_err();
            assert!(matches!(err, CouncilError::Validation(ValidationError::EmptyTicker)));
        }
        let err = fixture.council.run_council("AA PL;").await.unwrap_err();
        assert!(matches!(err, CouncilError::Validation(ValidationError::MalformedTicker(_))));

        assert_eq!(fixture.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reference_ticker_pairs_with_secondary() {
        let fixture = fixture(uniform(Recommendation::Hold), CouncilConfig::default());
        fixture.council.run_council("spy").await.unwrap();
        fixture.council.run_council("AAPL").await.unwrap();

        let stat_arb = &fixture.stubs[4];
        let requests = stat_arb.requests.lock().unwrap().clone();
        assert_eq!(requests, vec![SignalRequest::pair("SPY", "QQQ"), SignalRequest::pair("AAPL", "SPY")]);

        let momentum = fixture.stubs[0].requests.lock().unwrap().clone();
        assert_eq!(momentum[0], SignalRequest::single("SPY"));
    }

    #[tokio::test]
    async fn test_panicking_and_slow_signals_are_isolated() {
        let mut behaviors = uniform(Recommendation::Buy);
        behaviors[1] = Behavior::Panic;
        behaviors[2] = Behavior::SleepThen(5_000, Recommendation::Sell);
        let config = CouncilConfig {
            signal_timeout_secs: Some(1),
            ..CouncilConfig::default()
        };

        let fixture = fixture(behaviors, config);
        let result = fixture.council.run_council("AAPL").await.unwrap();

        assert_eq!(result.recommendations["mean_reversion"], Vote::Error);
        assert_eq!(result.recommendations["ml_predictive"], Vote::Error);
        assert!(result.signals[1].summary.contains("division by zero"));
        assert!(result.signals[2].summary.starts_with("Signal timed out"));
        assert_eq!(result.votes[&Recommendation::Buy].len(), 8);
        assert_eq!(result.council_vote, Recommendation::Buy);
        assert_eq!(fixture.calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_concurrent_run_keeps_registry_order() {
        let behaviors: [Behavior; 10] =
            std::array::from_fn(|i| Behavior::SleepThen(((10 - i) * 5) as u64, Recommendation::Hold));
        let config = CouncilConfig {
            max_concurrent_signals: 10,
            ..CouncilConfig::default()
        };
        let fixture = fixture(behaviors, config);

        let first = fixture.council.run_council("AAPL").await.unwrap();
        let second = fixture.council.run_council("AAPL").await.unwrap();

        let order: Vec<&str> = first.signals.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(order, NAMES.to_vec());
        assert_eq!(first.briefing, second.briefing);
        assert_ne!(first.run_id, second.run_id);
    }

    #[tokio::test]
    async fn test_request_deadline_bounds_the_run() {
        let config = CouncilConfig {
            max_concurrent_signals: 10,
            request_deadline_secs: Some(1),
            ..CouncilConfig::default()
        };
        let mut behaviors = uniform(Recommendation::Sell);
        behaviors[9] = Behavior::SleepThen(10_000, Recommendation::Buy);

        let result = fixture(behaviors, config).council.run_council("AAPL").await.unwrap();
        assert_eq!(result.recommendations["mean_variance_opt"], Vote::Error);
        assert_eq!(result.council_vote, Recommendation::Sell);
    }

    #[tokio::test]
    async fn test_run_signal() {
        let mut behaviors = uniform(Recommendation::Buy);
        behaviors[0] = Behavior::Fail;
        let fixture = fixture(behaviors, CouncilConfig::default());
        let council = &fixture.council;

        let result = council.run_signal("sentiment", "aapl", None).await.unwrap();
        assert_eq!(result.recommendation, Some(Recommendation::Buy));

        council.run_signal("stat_arb", "KO", Some("pep")).await.unwrap();
        let requests = fixture.stubs[4].requests.lock().unwrap().clone();
        assert_eq!(requests, vec![SignalRequest::pair("KO", "PEP")]);

        let missing = council.run_signal("stat_arb", "KO", None).await.unwrap_err();
        assert!(matches!(missing, CouncilError::Validation(ValidationError::MissingPairTicker(_))));

        let unknown = council.run_signal("astrology", "KO", None).await.unwrap_err();
        assert!(matches!(unknown, CouncilError::Validation(ValidationError::UnknownSignal(_))));

        let fault = council.run_signal("momentum", "KO", None).await.unwrap_err();
        assert!(matches!(fault, CouncilError::Signal(SignalFault::Raised { .. })));
    }

    #[test]
    fn test_validate_ticker() {
        assert_eq!(validate_ticker(" aapl ").unwrap(), "AAPL");
        assert_eq!(validate_ticker("brk-b").unwrap(), "BRK-B");
        assert_eq!(validate_ticker("^GSPC").unwrap(), "^GSPC");
        assert_eq!(validate_ticker("EURUSD=X").unwrap(), "EURUSD=X");
        assert_eq!(validate_ticker(""), Err(ValidationError::EmptyTicker));
        assert!(matches!(validate_ticker("DROP TABLE"), Err(ValidationError::MalformedTicker(_))));
        assert!(matches!(validate_ticker("../etc"), Err(ValidationError::MalformedTicker(_))));
    }

    #[tokio::test]
    async fn test_descriptors_follow_registry() {
        let fixture = fixture(uniform(Recommendation::Hold), CouncilConfig::default());
        let names: Vec<&str> = fixture.council.descriptors().iter().map(|d| d.name).collect();
        assert_eq!(names, NAMES.to_vec());
    }

    #[tokio::test]
    async fn test_standard_lineup_on_fixture_data() {
        let source = InMemorySource::new()
            .with_bars("AAPL", trend_bars(100.0, 0.002, 800))
            .with_bars("SPY", trend_bars(400.0, 0.001, 800));
        let council = Council::with_source(Arc::new(source), &CouncilConfig::default()).unwrap();

        let result = council.run_council("AAPL").await.unwrap();

        assert_eq!(result.recommendations.len(), 10);
        assert_eq!(result.signals.len(), 10);
        assert_eq!(result.recommendations["momentum"], Vote::Buy);
        assert_eq!(result.recommendations["factor_investing"], Vote::Buy);
        assert_eq!(result.recommendations["volatility_forecast"], Vote::Hold);
        assert_ne!(result.recommendations["stat_arb"], Vote::Error);

        let json = serde_json::to_value(&result).unwrap();
        assert!(json["votes"]["Buy"].is_array());
        assert_eq!(json["ticker"], "AAPL");
    }

    #[tokio::test]
    async fn test_unknown_ticker_fails_every_signal() {
        let council =
            Council::with_source(Arc::new(InMemorySource::new()), &CouncilConfig::default()).unwrap();
        let result = council.run_council("ZZZZ").await.unwrap();

        assert_eq!(result.council_vote, Recommendation::Hold);
        assert_eq!(result.failed_signals().len(), 10);
    }
}
