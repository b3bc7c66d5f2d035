//! Invocation guard
//!
//! Runs one generator on its own task so a returned error, an `error`
//! field, a panic or a timeout all come back as a `SignalFault` instead of
//! unwinding through the council.

use crate::error::SignalFault;
use common::{SignalResult, Vote};
use serde::Serialize;
use signal_generation::{SignalDescriptor, SignalGenerator, SignalRequest};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::{debug, warn};

pub const NO_SUMMARY: &str = "No summary available.";

/// Normalized outcome of one signal in a council run
#[derive(Debug, Clone, Serialize)]
pub struct SignalOutcome {
    pub name: String,
    pub display_name: String,
    pub vote: Vote,
    /// Rationale, or the fault message for an `Error` vote
    pub summary: String,
    /// Diagnostics for raised, timed out and panicked faults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
    /// Generator output, kept for chart rendering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SignalResult>,
    pub elapsed_ms: u64,
}

impl SignalOutcome {
    pub fn succeeded(descriptor: &SignalDescriptor, result: SignalResult, elapsed_ms: u64) -> Self {
        let vote = result.recommendation.map(Vote::from).unwrap_or(Vote::Hold);
        let summary = result
            .summary
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| NO_SUMMARY.to_string());

        Self {
            name: descriptor.name.to_string(),
            display_name: descriptor.title.to_string(),
            vote,
            summary,
            trace: None,
            result: Some(result),
            elapsed_ms,
        }
    }

    pub fn faulted(descriptor: &SignalDescriptor, fault: &SignalFault, elapsed_ms: u64) -> Self {
        Self {
            name: descriptor.name.to_string(),
            display_name: descriptor.title.to_string(),
            vote: Vote::Error,
            summary: fault.to_string(),
            trace: fault.trace().map(str::to_string),
            result: None,
            elapsed_ms,
        }
    }
}

/// Failure boundary around a single generator call
#[derive(Debug, Clone, Default)]
pub struct InvocationGuard {
    timeout: Option<Duration>,
}

impl InvocationGuard {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run `generator`, bounded by the per-signal timeout and `deadline`
    pub async fn call(
        &self,
        generator: Arc<dyn SignalGenerator>,
        request: SignalRequest,
        deadline: Option<Instant>,
    ) -> Result<SignalResult, SignalFault> {
        let limit = self.effective_limit(deadline);
        let target = describe_request(generator.name(), &request);
        let mut task = tokio::spawn(async move { generator.generate(&request).await });

        let joined = match limit {
            Some((limit, bound)) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    task.abort();
                    let after_ms = limit.as_millis() as u64;
                    return Err(SignalFault::TimedOut {
                        after_ms,
                        trace: format!("{} aborted: {} of {} ms elapsed", target, bound, after_ms),
                    });
                }
            },
            None => task.await,
        };

        match joined {
            Ok(Ok(result)) => match &result.error {
                Some(message) => Err(SignalFault::Reported(message.clone())),
                None => Ok(result),
            },
            Ok(Err(err)) => Err(SignalFault::from_error(&err)),
            Err(join_err) => {
                let message = panic_message(join_err);
                Err(SignalFault::Panicked {
                    trace: format!("{} panicked: {}", target, message),
                    message,
                })
            }
        }
    }

    /// Run `generator` and normalize whatever happens; never fails
    pub async fn invoke(
        &self,
        generator: &Arc<dyn SignalGenerator>,
        request: SignalRequest,
        deadline: Option<Instant>,
    ) -> SignalOutcome {
        let descriptor = *generator.descriptor();
        let started = Instant::now();
        let result = self.call(Arc::clone(generator), request, deadline).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(result) => {
                debug!(signal = descriptor.name, elapsed_ms, "Signal completed");
                SignalOutcome::succeeded(&descriptor, result, elapsed_ms)
            }
            Err(fault) => {
                warn!(signal = descriptor.name, elapsed_ms, error = %fault, "Error running signal");
                SignalOutcome::faulted(&descriptor, &fault, elapsed_ms)
            }
        }
    }

    /// The tighter of the per-signal timeout and the time left before `deadline`
    fn effective_limit(&self, deadline: Option<Instant>) -> Option<(Duration, &'static str)> {
        let timeout = self.timeout.map(|t| (t, "per-signal timeout"));
        let remaining = deadline.map(|d| (d.saturating_duration_since(Instant::now()), "request deadline"));
        match (timeout, remaining) {
            (Some(timeout), Some(remaining)) if remaining.0 < timeout.0 => Some(remaining),
            (Some(timeout), _) => Some(timeout),
            (None, remaining) => remaining,
        }
    }
}

fn describe_request(name: &str, request: &SignalRequest) -> String {
    match &request.pair_ticker {
        Some(pair) => format!("signal task {}({}, {})", name, request.ticker, pair),
        None => format!("signal task {}({})", name, request.ticker),
    }
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return "signal task was cancelled".to_string();
    }
    let payload: Box<dyn Any + Send> = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
