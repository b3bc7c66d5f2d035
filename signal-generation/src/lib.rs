// Signal Generation Framework
// Independent generators turning market data into Buy/Sell/Hold recommendations

pub mod conceptual;
pub mod indicators;
pub mod mean_reversion;
pub mod ml_predictive;
pub mod momentum;
pub mod signals;
pub mod stat_arb;
pub mod volatility_forecast;

pub use conceptual::ConceptualSignal;
pub use mean_reversion::{MeanReversionConfig, MeanReversionSignal};
pub use ml_predictive::{ForestConfig, MlPredictiveSignal};
pub use momentum::{MomentumConfig, MomentumSignal};
pub use signals::{SignalDescriptor, SignalGenerator, SignalRequest};
pub use stat_arb::{StatArbConfig, StatArbSignal};
pub use volatility_forecast::VolatilityForecastSignal;

use market_data::MarketDataSource;
use std::sync::Arc;

/// The standard council line-up, in registry order
pub fn default_generators(source: Arc<dyn MarketDataSource>) -> Vec<Arc<dyn SignalGenerator>> {
    vec![
        Arc::new(MomentumSignal::new(Arc::clone(&source), MomentumConfig::default())),
        Arc::new(MeanReversionSignal::new(Arc::clone(&source), MeanReversionConfig::default())),
        Arc::new(MlPredictiveSignal::new(Arc::clone(&source), ForestConfig::default())),
        Arc::new(VolatilityForecastSignal::new(Arc::clone(&source), 20)),
        Arc::new(StatArbSignal::new(Arc::clone(&source), StatArbConfig::default())),
        Arc::new(ConceptualSignal::reinforcement(Arc::clone(&source))),
        Arc::new(ConceptualSignal::factor_investing(Arc::clone(&source))),
        Arc::new(ConceptualSignal::market_making(Arc::clone(&source))),
        Arc::new(ConceptualSignal::sentiment(Arc::clone(&source))),
        Arc::new(ConceptualSignal::mean_variance_opt(source)),
    ]
}
