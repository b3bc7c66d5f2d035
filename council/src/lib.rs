//! Quant Council
//!
//! Runs a fixed line-up of independent signal generators on one ticker and
//! aggregates their votes:
//! - `SignalRegistry`: ordered, immutable set of generators
//! - `InvocationGuard`: isolates each generator's faults, panics and timeouts
//! - `VoteTally`: strict-plurality vote with Hold as the tie-break
//! - `synthesize`: markdown briefing for a reviewer or language model
//! - `Council`: composes the above into `run_council` / `run_signal`

pub mod briefing;
pub mod config;
pub mod error;
pub mod guard;
pub mod orchestrator;
pub mod registry;
pub mod tally;

pub use briefing::synthesize;
pub use config::{create_config_template, load_config, save_config, CouncilConfig, MarketDataConfig};
pub use error::{CouncilError, Result, SignalFault, ValidationError};
pub use guard::{InvocationGuard, SignalOutcome};
pub use orchestrator::{validate_ticker, Council, CouncilResult};
pub use registry::{PairFallback, SignalRegistry};
pub use tally::{resolve_vote, VoteTally};

// Re-export common types for convenience
pub use common::{Recommendation, SignalResult, Vote};
