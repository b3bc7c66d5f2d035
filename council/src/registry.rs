//! Signal registry
//!
//! An immutable, ordered line-up of generators built once and shared by
//! reference. Registry order is the order of every council output.

use crate::error::{CouncilError, Result, SignalFault, ValidationError};
use common::SignalResult;
use signal_generation::{SignalDescriptor, SignalGenerator, SignalRequest};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Ordered set of registered signal generators
#[derive(Clone)]
pub struct SignalRegistry {
    generators: Vec<Arc<dyn SignalGenerator>>,
}

impl SignalRegistry {
    /// Build a registry, rejecting malformed entries
    pub fn new(generators: Vec<Arc<dyn SignalGenerator>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for generator in &generators {
            let descriptor = generator.descriptor();
            if descriptor.name.is_empty() {
                return Err(CouncilError::Aggregation(
                    "registered signal has an empty name".to_string(),
                ));
            }
            if !(1..=2).contains(&descriptor.tickers_required) {
                return Err(CouncilError::Aggregation(format!(
                    "signal {} requires {} tickers, expected 1 or 2",
                    descriptor.name, descriptor.tickers_required
                )));
            }
            if !seen.insert(descriptor.name) {
                return Err(CouncilError::Aggregation(format!(
                    "signal {} is registered twice",
                    descriptor.name
                )));
            }
        }

        debug!(signals = generators.len(), "Signal registry built");
        Ok(Self { generators })
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Registered signal names in registry order
    pub fn names(&self) -> Vec<&'static str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    pub fn descriptors(&self) -> Vec<SignalDescriptor> {
        self.generators.iter().map(|g| *g.descriptor()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SignalGenerator>> {
        self.generators.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn SignalGenerator>> {
        self.generators.iter().find(|g| g.name() == name)
    }

    /// Whether `name` needs a second ticker; unknown names do not
    pub fn requires_pair(&self, name: &str) -> bool {
        self.get(name)
            .map(|g| g.descriptor().requires_pair())
            .unwrap_or(false)
    }

    /// Resolve a generator and build its request from explicit tickers
    pub fn request(
        &self,
        name: &str,
        ticker: &str,
        pair_ticker: Option<&str>,
    ) -> std::result::Result<(Arc<dyn SignalGenerator>, SignalRequest), ValidationError> {
        let generator = self
            .get(name)
            .ok_or_else(|| ValidationError::UnknownSignal(name.to_string()))?;

        let request = if generator.descriptor().requires_pair() {
            match pair_ticker.map(str::trim).filter(|t| !t.is_empty()) {
                Some(pair) => SignalRequest::pair(ticker, pair),
                None => return Err(ValidationError::MissingPairTicker(name.to_string())),
            }
        } else {
            SignalRequest::single(ticker)
        };

        Ok((Arc::clone(generator), request))
    }

    /// Dispatch directly to a registered generator
    ///
    /// A returned `Err` and a result carrying an `error` field both surface
    /// as `CouncilError::Signal`.
    pub async fn invoke(
        &self,
        name: &str,
        ticker: &str,
        pair_ticker: Option<&str>,
    ) -> Result<SignalResult> {
        let (generator, request) = self.request(name, ticker, pair_ticker)?;

        let result = generator
            .generate(&request)
            .await
            .map_err(|e| SignalFault::from_error(&e))?;

        match result.error {
            Some(message) => Err(SignalFault::Reported(message).into()),
            None => Ok(result),
        }
    }
}

/// Second ticker for pair signals driven by a single-ticker council run
///
/// Pair signals are compared against `reference`, or against `secondary`
/// when the requested ticker is the reference itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairFallback {
    reference: String,
    secondary: String,
}

impl PairFallback {
    pub fn new(reference: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            reference: reference.into().trim().to_uppercase(),
            secondary: secondary.into().trim().to_uppercase(),
        }
    }

    pub fn counterpart(&self, ticker: &str) -> &str {
        if ticker.trim().eq_ignore_ascii_case(&self.reference) {
            &self.secondary
        } else {
            &self.reference
        }
    }

    /// Request for `descriptor` in a council run on `ticker`
    pub fn request_for(&self, descriptor: &SignalDescriptor, ticker: &str) -> SignalRequest {
        if descriptor.requires_pair() {
            SignalRequest::pair(ticker, self.counterpart(ticker))
        } else {
            SignalRequest::single(ticker)
        }
    }
}

impl Default for PairFallback {
    fn default() -> Self {
        Self::new("SPY", "QQQ")
    }
}
