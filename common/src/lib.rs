//! Shared types for the quant council workspace
//!
//! This crate holds the signal contract that every generator satisfies and
//! the daily price bars the generators consume from the market-data layer.

pub mod series;
pub mod signal;

pub use series::{Bar, Period, PriceSeries};
pub use signal::{ChartData, ChartMarkers, ChartSeries, ChartType, Recommendation, SignalResult, Vote};
