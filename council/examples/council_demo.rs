//! Quant Council demo on fixture data
//!
//! This example demonstrates:
//! 1. Building fixture market data with `InMemorySource`
//! 2. Convening the standard ten-signal council
//! 3. Reading the vote breakdown and briefing
//! 4. Running a single pair signal with explicit tickers
//! 5. The pair fallback when the ticker is the reference index

use anyhow::Result;
use council::{Council, CouncilConfig, Recommendation};
use market_data::{trend_bars, CacheConfig, CachedSource, InMemorySource, MarketDataSource};
use std::sync::Arc;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Quant Council - Example");
    info!("=======================");

    // Step 1: Fixture data, three years of daily bars per ticker
    let mut choppy = trend_bars(50.0, 0.0005, 800);
    for (i, bar) in choppy.iter_mut().enumerate() {
        if i % 3 == 0 {
            bar.close *= 0.98;
        }
    }
    let fixtures = InMemorySource::new()
        .with_bars("AAPL", trend_bars(150.0, 0.0015, 800))
        .with_bars("KO", choppy)
        .with_bars("SPY", trend_bars(400.0, 0.0007, 800))
        .with_bars("QQQ", trend_bars(350.0, 0.0009, 800));
    let source: Arc<dyn MarketDataSource> = Arc::new(CachedSource::new(fixtures, &CacheConfig::default()));
    info!("Fixture data loaded");

    // Step 2: Council with four signals in flight at a time
    let config = CouncilConfig {
        max_concurrent_signals: 4,
        ..CouncilConfig::default()
    };
    let council = Council::with_source(source, &config)?;
    for descriptor in council.descriptors() {
        info!("  {:<20} {}", descriptor.name, descriptor.title);
    }

    // Step 3: Full council run
    let result = council.run_council("AAPL").await?;
    info!("Council vote for {}: {}", result.ticker, result.council_vote);
    for rec in Recommendation::ALL {
        info!("  {} ({}): {}", rec, result.votes[&rec].len(), result.votes[&rec].join(", "));
    }
    for signal in &result.signals {
        info!("  {:<20} {:<5} {} ms", signal.name, signal.vote.as_str(), signal.elapsed_ms);
    }
    println!("{}", result.briefing);

    // Step 4: Single pair signal with an explicit counterpart
    let pair = council.run_signal("stat_arb", "KO", Some("SPY")).await?;
    info!("stat_arb KO/SPY: {:?} - {}", pair.recommendation, pair.summary.unwrap_or_default());

    // Step 5: The reference index is compared against the secondary reference
    let spy = council.run_council("SPY").await?;
    if let Some(stat_arb) = spy.signals.iter().find(|s| s.name == "stat_arb") {
        info!("stat_arb on SPY: {} - {}", stat_arb.vote, stat_arb.summary);
    }

    info!("Example completed");
    Ok(())
}
