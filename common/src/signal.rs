//! Signal contract
//!
//! `SignalResult` is what a generator hands back; `Vote` is the normalized
//! value the council counts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional recommendation produced by a signal generator
///
/// Declaration order is the order used for vote breakdowns (Buy, Sell, Hold).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl Recommendation {
    pub const ALL: [Recommendation; 3] = [Recommendation::Buy, Recommendation::Sell, Recommendation::Hold];

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Buy => "Buy",
            Recommendation::Sell => "Sell",
            Recommendation::Hold => "Hold",
        }
    }
}

impl Default for Recommendation {
    fn default() -> Self {
        Recommendation::Hold
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized outcome of one signal in a council run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vote {
    Buy,
    Sell,
    Hold,
    Error,
}

impl Vote {
    /// The counted recommendation, `None` for a failed signal
    pub fn recommendation(&self) -> Option<Recommendation> {
        match self {
            Vote::Buy => Some(Recommendation::Buy),
            Vote::Sell => Some(Recommendation::Sell),
            Vote::Hold => Some(Recommendation::Hold),
            Vote::Error => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Vote::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Vote::Buy => "Buy",
            Vote::Sell => "Sell",
            Vote::Hold => "Hold",
            Vote::Error => "Error",
        }
    }
}

impl From<Recommendation> for Vote {
    fn from(rec: Recommendation) -> Self {
        match rec {
            Recommendation::Buy => Vote::Buy,
            Recommendation::Sell => Vote::Sell,
            Recommendation::Hold => Vote::Hold,
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering hint for chart payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
    Pie,
}

/// One named numeric series aligned with `ChartData::labels`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Named subset of labels to highlight (e.g. crossover dates)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartMarkers {
    pub name: String,
    pub labels: Vec<String>,
}

/// Chart payload attached to a signal result; opaque to the council
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<ChartMarkers>,
}

impl ChartData {
    pub fn new(labels: Vec<String>) -> Self {
        Self {
            labels,
            series: Vec::new(),
            markers: Vec::new(),
        }
    }

    pub fn with_series(mut self, name: &str, values: Vec<f64>) -> Self {
        self.series.push(ChartSeries {
            name: name.to_string(),
            values,
        });
        self
    }

    pub fn with_markers(mut self, name: &str, labels: Vec<String>) -> Self {
        self.markers.push(ChartMarkers {
            name: name.to_string(),
            labels,
        });
        self
    }

    pub fn series(&self, name: &str) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.values.as_slice())
    }
}

/// Output of a signal generator
///
/// A result carrying `error` counts as a failed signal no matter what the
/// other fields say.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_data: Option<ChartData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartType>,
    #[serde(default)]
    pub is_placeholder: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SignalResult {
    pub fn new(recommendation: Recommendation, summary: impl Into<String>) -> Self {
        Self {
            recommendation: Some(recommendation),
            summary: Some(summary.into()),
            ..Default::default()
        }
    }

    /// A result reporting failure through the `error` field
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_chart(mut self, chart: ChartData) -> Self {
        self.chart_data = Some(chart);
        self
    }

    pub fn with_chart_type(mut self, chart_type: ChartType) -> Self {
        self.chart_type = Some(chart_type);
        self
    }

    pub fn placeholder(mut self) -> Self {
        self.is_placeholder = true;
        self
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_from_recommendation() {
        assert_eq!(Vote::from(Recommendation::Sell), Vote::Sell);
        assert_eq!(Vote::Buy.recommendation(), Some(Recommendation::Buy));
        assert_eq!(Vote::Error.recommendation(), None);
        assert!(Vote::Error.is_error());
    }

    #[test]
    fn test_recommendation_ordering_follows_breakdown() {
        let mut recs = vec![Recommendation::Hold, Recommendation::Buy, Recommendation::Sell];
        recs.sort();
        assert_eq!(recs, Recommendation::ALL.to_vec());
    }

    #[test]
    fn test_error_only_payload_deserializes() {
        let result: SignalResult =
            serde_json::from_str(r#"{"error": "No data found for ticker ZZZZ with period 1y"}"#).unwrap();
        assert!(result.is_failed());
        assert_eq!(result.recommendation, None);
        assert!(!result.is_placeholder);
    }

    #[test]
    fn test_serialized_shape() {
        let result = SignalResult::new(Recommendation::Buy, "Bullish trend.")
            .with_chart(ChartData::new(vec!["2024-01-02".to_string()]).with_series("price", vec![101.5]))
            .with_chart_type(ChartType::Bar);
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["recommendation"], "Buy");
        assert_eq!(value["chart_type"], "bar");
        assert_eq!(value["chart_data"]["series"][0]["name"], "price");
        assert!(value.get("error").is_none());
    }
}
