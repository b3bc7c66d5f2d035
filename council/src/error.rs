//! Council error taxonomy
//!
//! - `ValidationError`: bad input, rejected before any signal runs
//! - `SignalFault`: one generator failed; recovered by the invocation guard
//! - `CouncilError`: what callers of the council see

use thiserror::Error;

/// Input rejected before any signal is invoked
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("A ticker is required")]
    EmptyTicker,

    #[error("Malformed ticker: {0:?}")]
    MalformedTicker(String),

    #[error("Unknown signal: {0}")]
    UnknownSignal(String),

    #[error("Ticker 2 is required for signal {0}")]
    MissingPairTicker(String),
}

/// A single generator failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalFault {
    /// The generator returned `Err`; `trace` holds the full cause chain
    #[error("{message}")]
    Raised { message: String, trace: String },

    /// The generator returned a result with its `error` field set
    #[error("{0}")]
    Reported(String),

    /// `trace` names the bound that fired
    #[error("Signal timed out after {after_ms} ms")]
    TimedOut { after_ms: u64, trace: String },

    /// `trace` names the request the task was running
    #[error("Signal panicked: {message}")]
    Panicked { message: String, trace: String },
}

impl SignalFault {
    pub fn from_error(err: &anyhow::Error) -> Self {
        SignalFault::Raised {
            message: err.to_string(),
            trace: format!("{:?}", err),
        }
    }

    /// Diagnostic detail beyond the message, if any
    pub fn trace(&self) -> Option<&str> {
        match self {
            SignalFault::Raised { trace, .. }
            | SignalFault::TimedOut { trace, .. }
            | SignalFault::Panicked { trace, .. } => Some(trace),
            SignalFault::Reported(_) => None,
        }
    }
}

/// Errors surfaced to council callers
#[derive(Debug, Error)]
pub enum CouncilError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Signal failed: {0}")]
    Signal(#[from] SignalFault),

    /// Defect in the registry, tally or briefing; not retryable
    #[error("Aggregation fault: {0}")]
    Aggregation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for CouncilError {
    fn from(e: config::ConfigError) -> Self {
        CouncilError::Config(e.to_string())
    }
}

/// Result type alias for council operations
pub type Result<T> = std::result::Result<T, CouncilError>;
