//! Bounded market data cache
//!
//! Least-recently-used eviction keyed by (ticker, period). Entries also
//! expire after `ttl_secs` so intraday reruns pick up fresh bars, and
//! `invalidate` / `clear` drop entries on demand.

use crate::error::MarketDataError;
use crate::source::MarketDataSource;
use async_trait::async_trait;
use common::{Period, PriceSeries};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache sizing and expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of (ticker, period) entries
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Entry lifetime in seconds, `None` keeps entries until evicted
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_capacity() -> usize {
    128
}

fn default_ttl_secs() -> Option<u64> {
    Some(900)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    ticker: String,
    period: Period,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    series: Arc<PriceSeries>,
    fetched_at: Instant,
}

/// Caching wrapper around any `MarketDataSource`
pub struct CachedSource<S> {
    inner: S,
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    ttl: Option<Duration>,
}

impl<S: MarketDataSource> CachedSource<S> {
    pub fn new(inner: S, config: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            inner,
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: config.ttl_secs.map(Duration::from_secs),
        }
    }

    /// Drop every cached period for `ticker`, returning how many entries went
    pub fn invalidate(&self, ticker: &str) -> usize {
        let ticker = ticker.to_uppercase();
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };

        let stale: Vec<CacheKey> = entries
            .iter()
            .filter(|(key, _)| key.ticker == ticker)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            entries.pop(key);
        }

        debug!(ticker = %ticker, removed = stale.len(), "Invalidated cached series");
        stale.len()
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &CacheKey) -> Option<Arc<PriceSeries>> {
        let mut entries = self.entries.lock().ok()?;
        let entry = entries.get(key)?.clone();

        if let Some(ttl) = self.ttl {
            if entry.fetched_at.elapsed() >= ttl {
                entries.pop(key);
                return None;
            }
        }

        Some(entry.series)
    }

    fn store(&self, key: CacheKey, series: Arc<PriceSeries>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(
                key,
                CacheEntry {
                    series,
                    fetched_at: Instant::now(),
                },
            );
        }
    }
}

#[async_trait]
impl<S: MarketDataSource> MarketDataSource for CachedSource<S> {
    async fn fetch_series(&self, ticker: &str, period: Period) -> Result<Arc<PriceSeries>, MarketDataError> {
        let key = CacheKey {
            ticker: ticker.to_uppercase(),
            period,
        };

        if let Some(series) = self.lookup(&key) {
            debug!(ticker = %key.ticker, period = %period, "Cache hit");
            return Ok(series);
        }

        debug!(ticker = %key.ticker, period = %period, "Cache miss");
        // Failures are not cached
        let series = self.inner.fetch_series(ticker, period).await?;
        self.store(key, Arc::clone(&series));

        Ok(series)
    }
}
