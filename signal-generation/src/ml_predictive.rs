use crate::indicators::{pct_change, rolling_mean};
use crate::signals::{SignalDescriptor, SignalGenerator, SignalRequest};
use anyhow::bail;
use async_trait::async_trait;
use common::{ChartData, ChartType, Period, Recommendation, SignalResult};
use market_data::MarketDataSource;
use std::sync::Arc;
use tracing::debug;

pub const ML_PREDICTIVE: SignalDescriptor = SignalDescriptor {
    name: "ml_predictive",
    title: "Machine Learning (Random Forest)",
    description: "Predicts the next day's price direction with a random forest trained on lagged returns and a moving average.",
    math: "Features: lag-1 return, lag-5 return, prior 10-day rolling mean. Target: 1 if the next close is higher. Trained on the first 80% of rows, scored on the last 20%.",
    tickers_required: 1,
};

const FEATURE_NAMES: [&str; 3] = ["Lag_1", "Lag_5", "Rolling_Mean_10"];

/// Random forest hyperparameters
#[derive(Debug, Clone)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 4,
            min_samples_split: 2,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Next-day direction classifier over three years of closes
pub struct MlPredictiveSignal {
    source: Arc<dyn MarketDataSource>,
    config: ForestConfig,
}

impl MlPredictiveSignal {
    pub fn new(source: Arc<dyn MarketDataSource>, config: ForestConfig) -> Self {
        Self { source, config }
    }
}

#[async_trait]
impl SignalGenerator for MlPredictiveSignal {
    fn descriptor(&self) -> &SignalDescriptor {
        &ML_PREDICTIVE
    }

    async fn generate(&self, request: &SignalRequest) -> anyhow::Result<SignalResult> {
        let series = self.source.fetch_series(&request.ticker, Period::ThreeYears).await?;
        let dataset = Dataset::from_closes(&series.closes());

        let Some(latest) = dataset.latest else {
            bail!("Not enough data for ML model.");
        };

        let n = dataset.features.len();
        let n_test = (n as f64 * self.config.test_fraction).ceil() as usize;
        let n_train = n.saturating_sub(n_test);
        if n_train == 0 || n_test == 0 {
            bail!("Not enough data for ML model training split.");
        }

        // Training is CPU-bound; keep it off the async workers
        let config = self.config.clone();
        let (predicts_up, accuracy, importances) = tokio::task::spawn_blocking(move || {
            let forest = RandomForest::fit(
                &dataset.features[..n_train],
                &dataset.targets[..n_train],
                &config,
            );

            let correct = dataset.features[n_train..]
                .iter()
                .zip(&dataset.targets[n_train..])
                .filter(|(x, y)| forest.predict(x) == **y)
                .count();
            let accuracy = correct as f64 / n_test as f64;

            (forest.predict(&latest), accuracy, *forest.feature_importances())
        })
        .await?;

        debug!(ticker = %request.ticker, n_train, n_test, accuracy, "Forest trained");

        let (recommendation, direction) = if predicts_up {
            (Recommendation::Buy, "Random Forest model predicts an UPWARD movement for the next trading day.")
        } else {
            (Recommendation::Sell, "Random Forest model predicts a DOWNWARD movement for the next trading day.")
        };
        let summary = format!(
            "{} Model accuracy on test data: {:.2}%. (Note: This is a simplified placeholder).",
            direction,
            accuracy * 100.0
        );

        let chart = ChartData::new(FEATURE_NAMES.iter().map(|s| s.to_string()).collect())
            .with_series("importance", importances.to_vec());

        Ok(SignalResult::new(recommendation, summary)
            .with_chart(chart)
            .with_chart_type(ChartType::Bar))
    }
}

type Features = [f64; 3];

/// Labelled rows in date order plus the unlabelled latest row
struct Dataset {
    features: Vec<Features>,
    targets: Vec<bool>,
    latest: Option<Features>,
}

impl Dataset {
    fn from_closes(closes: &[f64]) -> Self {
        let returns = pct_change(closes);
        let rolling = rolling_mean(closes, 10);

        let mut features = Vec::new();
        let mut targets = Vec::new();
        let mut latest = None;

        for i in 5..closes.len() {
            let (Some(lag_1), Some(lag_5), Some(mean_10)) = (returns[i - 1], returns[i - 5], rolling[i - 1]) else {
                continue;
            };
            let row = [lag_1, lag_5, mean_10];

            match closes.get(i + 1) {
                Some(next) => {
                    features.push(row);
                    targets.push(*next > closes[i]);
                }
                None => latest = Some(row),
            }
        }

        Self {
            features,
            targets,
            latest,
        }
    }
}

#[derive(Debug)]
enum Node {
    Leaf {
        p_up: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn p_up(&self, x: &Features) -> f64 {
        match self {
            Node::Leaf { p_up } => *p_up,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if x[*feature] <= *threshold {
                    left.p_up(x)
                } else {
                    right.p_up(x)
                }
            }
        }
    }
}

/// Bagged CART trees with one random candidate feature per split
struct RandomForest {
    trees: Vec<Node>,
    importances: Features,
}

struct TreeBuilder<'a> {
    x: &'a [Features],
    y: &'a [bool],
    config: &'a ForestConfig,
    rng: &'a mut fastrand::Rng,
    importances: Features,
}

impl RandomForest {
    fn fit(x: &[Features], y: &[bool], config: &ForestConfig) -> Self {
        let mut rng = fastrand::Rng::with_seed(config.seed);
        let mut trees = Vec::with_capacity(config.n_trees);
        let mut importances = [0.0; 3];

        for _ in 0..config.n_trees {
            let sample: Vec<usize> = (0..x.len()).map(|_| rng.usize(..x.len())).collect();
            let mut builder = TreeBuilder {
                x,
                y,
                config,
                rng: &mut rng,
                importances: [0.0; 3],
            };
            trees.push(builder.build(sample, 0));

            // Each tree contributes normalized importances
            let total: f64 = builder.importances.iter().sum();
            if total > 0.0 {
                for (acc, imp) in importances.iter_mut().zip(builder.importances) {
                    *acc += imp / total;
                }
            }
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|imp| *imp /= total);
        }

        Self { trees, importances }
    }

    fn predict(&self, x: &Features) -> bool {
        let mean = self.trees.iter().map(|t| t.p_up(x)).sum::<f64>() / self.trees.len().max(1) as f64;
        mean > 0.5
    }

    fn feature_importances(&self) -> &Features {
        &self.importances
    }
}

impl TreeBuilder<'_> {
    fn build(&mut self, rows: Vec<usize>, depth: usize) -> Node {
        let ups = rows.iter().filter(|&&r| self.y[r]).count();
        let p_up = if rows.is_empty() { 0.5 } else { ups as f64 / rows.len() as f64 };

        let pure = ups == 0 || ups == rows.len();
        if depth >= self.config.max_depth || rows.len() < self.config.min_samples_split || pure {
            return Node::Leaf { p_up };
        }

        // sqrt(3 features) rounds down to one candidate per split; retry the
        // others only if the drawn feature cannot split
        let first = self.rng.usize(..FEATURE_NAMES.len());
        let candidates = (0..FEATURE_NAMES.len()).map(|k| (first + k) % FEATURE_NAMES.len());

        for feature in candidates {
            if let Some((threshold, gain)) = self.best_split(&rows, feature) {
                let (left, right): (Vec<usize>, Vec<usize>) =
                    rows.iter().partition(|&&r| self.x[r][feature] <= threshold);

                self.importances[feature] += gain;
                let left = Box::new(self.build(left, depth + 1));
                let right = Box::new(self.build(right, depth + 1));
                return Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                };
            }
        }

        Node::Leaf { p_up }
    }

    /// Threshold with the largest weighted Gini decrease, if any split helps
    fn best_split(&self, rows: &[usize], feature: usize) -> Option<(f64, f64)> {
        let mut sorted: Vec<(f64, bool)> = rows.iter().map(|&r| (self.x[r][feature], self.y[r])).collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = sorted.len() as f64;
        let total_up = sorted.iter().filter(|(_, up)| *up).count() as f64;
        let parent = n * gini(total_up, n);

        let mut best: Option<(f64, f64)> = None;
        let mut left_up = 0.0;
        for i in 0..sorted.len() - 1 {
            if sorted[i].1 {
                left_up += 1.0;
            }
            if sorted[i].0 == sorted[i + 1].0 {
                continue;
            }

            let left_n = (i + 1) as f64;
            let right_n = n - left_n;
            let child = left_n * gini(left_up, left_n) + right_n * gini(total_up - left_up, right_n);
            let gain = parent - child;

            if gain > 1e-12 && best.map_or(true, |(_, g)| gain > g) {
                best = Some(((sorted[i].0 + sorted[i + 1].0) / 2.0, gain));
            }
        }

        best
    }
}

fn gini(ups: f64, n: f64) -> f64 {
    if n == 0.0 {
        return 0.0;
    }
    let p = ups / n;
    2.0 * p * (1.0 - p)
}
