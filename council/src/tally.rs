//! Vote tally
//!
//! Buckets per-signal votes and resolves the council verdict. A strict
//! plurality is needed for Buy or Sell; every other case, including no
//! counted votes at all, resolves to Hold.

use crate::guard::SignalOutcome;
use common::{Recommendation, Vote};
use serde::Serialize;
use std::collections::BTreeMap;

/// Resolve the council vote from bucket counts
pub fn resolve_vote(buy: usize, sell: usize, hold: usize) -> Recommendation {
    if buy > sell && buy > hold {
        Recommendation::Buy
    } else if sell > buy && sell > hold {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    }
}

/// Votes bucketed by recommendation, with the resolved verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    /// Always holds Buy, Sell and Hold; names keep registry order
    pub votes: BTreeMap<Recommendation, Vec<String>>,
    pub council_vote: Recommendation,
}

impl VoteTally {
    /// Tally `(name, vote)` pairs; `Error` votes are not counted
    pub fn from_votes<'a, I>(votes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Vote)>,
    {
        let mut buckets: BTreeMap<Recommendation, Vec<String>> =
            Recommendation::ALL.iter().map(|r| (*r, Vec::new())).collect();

        for (name, vote) in votes {
            if let Some(rec) = vote.recommendation() {
                buckets.entry(rec).or_default().push(name.to_string());
            }
        }

        let count = |rec: Recommendation| buckets.get(&rec).map(Vec::len).unwrap_or(0);
        let council_vote = resolve_vote(
            count(Recommendation::Buy),
            count(Recommendation::Sell),
            count(Recommendation::Hold),
        );

        Self {
            votes: buckets,
            council_vote,
        }
    }

    pub fn from_outcomes(outcomes: &[SignalOutcome]) -> Self {
        Self::from_votes(outcomes.iter().map(|o| (o.name.as_str(), o.vote)))
    }

    pub fn names(&self, rec: Recommendation) -> &[String] {
        self.votes.get(&rec).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, rec: Recommendation) -> usize {
        self.names(rec).len()
    }

    /// Number of counted (non-error) votes
    pub fn counted(&self) -> usize {
        self.votes.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: [&str; 10] = [
        "momentum",
        "mean_reversion",
        "ml_predictive",
        "volatility_forecast",
        "stat_arb",
        "reinforcement",
        "factor_investing",
        "market_making",
        "sentiment",
        "mean_variance_opt",
    ];

    fn tally(votes: [Vote; 10]) -> VoteTally {
        VoteTally::from_votes(REGISTRY.iter().copied().zip(votes))
    }

    #[test]
    fn test_resolve_vote_matches_rule_for_all_small_counts() {
        for b in 0..=10 {
            for s in 0..=10 {
                for h in 0..=10 {
                    let expected = if b > s && b > h {
                        Recommendation::Buy
                    } else if s > b && s > h {
                        Recommendation::Sell
                    } else {
                        Recommendation::Hold
                    };
                    assert_eq!(resolve_vote(b, s, h), expected, "b={} s={} h={}", b, s, h);
                }
            }
        }
    }

    #[test]
    fn test_ties_resolve_to_hold() {
        assert_eq!(resolve_vote(0, 0, 0), Recommendation::Hold);
        assert_eq!(resolve_vote(3, 3, 3), Recommendation::Hold);
        assert_eq!(resolve_vote(4, 4, 2), Recommendation::Hold);
        assert_eq!(resolve_vote(4, 2, 4), Recommendation::Hold);
        assert_eq!(resolve_vote(5, 1, 0), Recommendation::Buy);
        assert_eq!(resolve_vote(1, 2, 1), Recommendation::Sell);
    }

    #[test]
    fn test_mixed_votes_without_plurality_hold() {
        use Vote::*;
        let tally = tally([Buy, Sell, Buy, Hold, Buy, Hold, Buy, Hold, Hold, Sell]);

        assert_eq!(tally.count(Recommendation::Buy), 4);
        assert_eq!(tally.count(Recommendation::Sell), 2);
        assert_eq!(tally.count(Recommendation::Hold), 4);
        assert_eq!(tally.council_vote, Recommendation::Hold);
        assert_eq!(
            tally.names(Recommendation::Sell),
            &["mean_reversion".to_string(), "mean_variance_opt".to_string()]
        );
    }

    #[test]
    fn test_unanimous_buy_keeps_registry_order() {
        let tally = tally([Vote::Buy; 10]);

        assert_eq!(tally.council_vote, Recommendation::Buy);
        let buys: Vec<&str> = tally.names(Recommendation::Buy).iter().map(String::as_str).collect();
        assert_eq!(buys, REGISTRY.to_vec());
        assert!(tally.names(Recommendation::Sell).is_empty());
        assert!(tally.names(Recommendation::Hold).is_empty());
    }

    #[test]
    fn test_errors_are_not_counted() {
        use Vote::*;
        let half_failed = tally([Error, Hold, Error, Hold, Error, Hold, Error, Hold, Error, Hold]);
        assert_eq!(half_failed.counted(), 5);
        assert_eq!(half_failed.count(Recommendation::Hold), 5);
        assert_eq!(half_failed.council_vote, Recommendation::Hold);

        let all_failed = tally([Error; 10]);
        assert_eq!(all_failed.counted(), 0);
        assert_eq!(all_failed.council_vote, Recommendation::Hold);
        assert_eq!(all_failed.votes.len(), 3);
    }

    #[test]
    fn test_serializes_named_buckets() {
        let tally = VoteTally::from_votes(vec![("momentum", Vote::Buy), ("sentiment", Vote::Error)]);
        let json = serde_json::to_value(&tally).unwrap();

        assert_eq!(json["council_vote"], "Buy");
        assert_eq!(json["votes"]["Buy"][0], "momentum");
        assert_eq!(json["votes"]["Sell"].as_array().unwrap().len(), 0);
        assert_eq!(json["votes"]["Hold"].as_array().unwrap().len(), 0);
    }
}
