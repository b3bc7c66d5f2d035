//! Council configuration

use crate::error::{CouncilError, Result};
use config::{Config, Environment, File};
use market_data::yahoo::DEFAULT_CHART_URL;
use market_data::CacheConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Overall council configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouncilConfig {
    /// Counterpart handed to pair signals during a council run
    #[serde(default = "default_reference_ticker")]
    pub reference_ticker: String,

    /// Counterpart used when the requested ticker is the reference itself
    #[serde(default = "default_secondary_reference_ticker")]
    pub secondary_reference_ticker: String,

    /// Signals allowed in flight at once (1 runs them one after another)
    #[serde(default = "default_max_concurrent_signals")]
    pub max_concurrent_signals: usize,

    /// Per-signal timeout in seconds
    #[serde(default = "default_signal_timeout_secs")]
    pub signal_timeout_secs: Option<u64>,

    /// Deadline for a whole council run in seconds
    #[serde(default)]
    pub request_deadline_secs: Option<u64>,

    #[serde(default)]
    pub market_data: MarketDataConfig,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            reference_ticker: default_reference_ticker(),
            secondary_reference_ticker: default_secondary_reference_ticker(),
            max_concurrent_signals: default_max_concurrent_signals(),
            signal_timeout_secs: default_signal_timeout_secs(),
            request_deadline_secs: None,
            market_data: MarketDataConfig::default(),
        }
    }
}

impl CouncilConfig {
    pub fn signal_timeout(&self) -> Option<Duration> {
        self.signal_timeout_secs.map(Duration::from_secs)
    }

    pub fn request_deadline(&self) -> Option<Duration> {
        self.request_deadline_secs.map(Duration::from_secs)
    }

    /// Reject settings the council cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_signals == 0 {
            return Err(CouncilError::Config(
                "max_concurrent_signals must be at least 1".to_string(),
            ));
        }
        if self.market_data.cache_capacity == 0 {
            return Err(CouncilError::Config(
                "market_data.cache_capacity must be at least 1".to_string(),
            ));
        }

        let primary = self.reference_ticker.trim();
        let secondary = self.secondary_reference_ticker.trim();
        if primary.is_empty() || secondary.is_empty() {
            return Err(CouncilError::Config(
                "reference tickers must not be empty".to_string(),
            ));
        }
        if primary.eq_ignore_ascii_case(secondary) {
            return Err(CouncilError::Config(format!(
                "secondary_reference_ticker must differ from reference_ticker ({})",
                primary
            )));
        }

        Ok(())
    }
}

fn default_reference_ticker() -> String {
    "SPY".to_string()
}

fn default_secondary_reference_ticker() -> String {
    "QQQ".to_string()
}

fn default_max_concurrent_signals() -> usize {
    1
}

fn default_signal_timeout_secs() -> Option<u64> {
    Some(30)
}

/// Market data backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataConfig {
    /// Chart endpoint, ticker is appended as a path segment
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum cached (ticker, period) series
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Cache entry lifetime in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: Option<u64>,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl MarketDataConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache(&self) -> CacheConfig {
        CacheConfig {
            capacity: self.cache_capacity,
            ttl_secs: self.cache_ttl_secs,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_CHART_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_cache_capacity() -> usize {
    CacheConfig::default().capacity
}

fn default_cache_ttl_secs() -> Option<u64> {
    CacheConfig::default().ttl_secs
}

/// Load configuration from an optional TOML file, overridden by
/// `COUNCIL__*` environment variables (e.g. `COUNCIL__MARKET_DATA__CACHE_CAPACITY`)
pub fn load_config(path: Option<&str>) -> Result<CouncilConfig> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::with_name(path));
    }

    let settings = builder
        .add_source(
            Environment::with_prefix("COUNCIL")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: CouncilConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to TOML file
pub fn save_config(config: &CouncilConfig, path: &str) -> Result<()> {
    let content =
        toml::to_string_pretty(config).map_err(|e| CouncilError::Config(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| CouncilError::Config(e.to_string()))?;
    Ok(())
}

/// Create a default configuration file template
pub fn create_config_template(path: &str) -> Result<()> {
    let template = format!(
        "# Quant Council Configuration

# Counterpart for pair signals (statistical arbitrage) in a council run
reference_ticker = \"SPY\"

# Used instead when the requested ticker is the reference itself
secondary_reference_ticker = \"QQQ\"

# Signals in flight at once (1 = one after another, in registry order)
max_concurrent_signals = 1

# Per-signal timeout (seconds); a timed out signal votes Error
signal_timeout_secs = 30

# Deadline for a whole council run (seconds); unset means none
# request_deadline_secs = 120

[market_data]
# Chart endpoint
base_url = \"{}\"

# HTTP request timeout (seconds)
request_timeout_secs = 10

# Maximum cached (ticker, period) series
cache_capacity = 128

# Cache entry lifetime (seconds)
cache_ttl_secs = 900
",
        DEFAULT_CHART_URL
    );

    std::fs::write(path, template).map_err(|e| CouncilError::Config(e.to_string()))?;
    Ok(())
}
