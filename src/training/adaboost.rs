//! AdaBoost regression (AdaBoost.R2)
//!
//! Each round fits a shallow tree on a weighted bootstrap of the training set,
//! then reweights samples by their linear loss normalized to [0, 1].
//! Predictions are the weighted median of the estimators' outputs.

use super::decision_tree::DecisionTree;
use super::models::{Algorithm, Regressor};
use crate::error::{check_fit_input, check_predict_width, ModelError};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoostRegressor {
    pub n_estimators: usize,
    pub learning_rate: f64,
    /// Depth of each weak learner
    pub max_depth: usize,
    pub random_state: u64,
    estimators: Vec<DecisionTree>,
    estimator_weights: Vec<f64>,
    n_features: usize,
    is_fitted: bool,
}

impl Default for AdaBoostRegressor {
    fn default() -> Self {
        Self::new(50, 1.0)
    }
}

impl AdaBoostRegressor {
    pub fn new(n_estimators: usize, learning_rate: f64) -> Self {
        Self {
            n_estimators,
            learning_rate,
            max_depth: 3,
            random_state: 42,
            estimators: Vec::new(),
            estimator_weights: Vec::new(),
            n_features: 0,
            is_fitted: false,
        }
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_fit_input(x, y)?;
        if self.n_estimators == 0 || self.learning_rate <= 0.0 {
            return Err(ModelError::InvalidInput(
                "n_estimators and learning_rate must be positive".to_string(),
            ));
        }

        let n_samples = x.nrows();
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut weights = vec![1.0 / n_samples as f64; n_samples];
        let mut estimators = Vec::with_capacity(self.n_estimators);
        let mut estimator_weights = Vec::with_capacity(self.n_estimators);

        for round in 0..self.n_estimators {
            let bootstrap = weighted_bootstrap(&weights, &mut rng);
            let mut tree = DecisionTree::new().with_max_depth(self.max_depth);
            tree.fit_indices(x, y, &bootstrap)?;

            let predictions = tree.predict(x)?;
            let mut errors: Vec<f64> = predictions.iter().zip(y.iter()).map(|(p, t)| (p - t).abs()).collect();
            let max_error = errors.iter().copied().fold(0.0, f64::max);
            if max_error > 0.0 {
                errors.iter_mut().for_each(|e| *e /= max_error);
            }

            let estimator_error: f64 = errors.iter().zip(&weights).map(|(e, w)| e * w).sum();

            if estimator_error <= 0.0 {
                // Perfect fit
                estimators.push(tree);
                estimator_weights.push(1.0);
                break;
            }
            if estimator_error >= 0.5 {
                // Worse than chance; keep it only if nothing else exists
                if estimators.is_empty() {
                    estimators.push(tree);
                    estimator_weights.push(1.0);
                }
                debug!(round, estimator_error, "AdaBoost stopped early");
                break;
            }

            let beta = estimator_error / (1.0 - estimator_error);
            estimators.push(tree);
            estimator_weights.push(self.learning_rate * (1.0 / beta).ln());

            if round + 1 < self.n_estimators {
                for (w, e) in weights.iter_mut().zip(&errors) {
                    *w *= beta.powf((1.0 - e) * self.learning_rate);
                }
                let total: f64 = weights.iter().sum();
                if total <= 0.0 || !total.is_finite() {
                    break;
                }
                weights.iter_mut().for_each(|w| *w /= total);
            }
        }

        self.estimators = estimators;
        self.estimator_weights = estimator_weights;
        self.n_features = x.ncols();
        self.is_fitted = true;
        Ok(self)
    }

    /// Weighted median of the estimators' predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(ModelError::NotFitted);
        }
        check_predict_width(x, self.n_features)?;

        let per_estimator = self
            .estimators
            .iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<Array1<f64>>>>()?;
        let total_weight: f64 = self.estimator_weights.iter().sum();

        Ok((0..x.nrows())
            .map(|i| {
                let mut ranked: Vec<(f64, f64)> = per_estimator
                    .iter()
                    .zip(&self.estimator_weights)
                    .map(|(p, &w)| (p[i], w))
                    .collect();
                ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

                let half = 0.5 * total_weight;
                let mut cumulative = 0.0;
                for &(value, w) in &ranked {
                    cumulative += w;
                    if cumulative >= half {
                        return value;
                    }
                }
                ranked.last().map_or(0.0, |&(value, _)| value)
            })
            .collect())
    }

    pub fn n_estimators_fitted(&self) -> usize {
        self.estimators.len()
    }
}

/// Draw `weights.len()` row indices with replacement, proportional to weight
fn weighted_bootstrap(weights: &[f64], rng: &mut ChaCha8Rng) -> Vec<usize> {
    let mut cdf = Vec::with_capacity(weights.len());
    let mut acc = 0.0;
    for &w in weights {
        acc += w;
        cdf.push(acc);
    }
    let last = weights.len().saturating_sub(1);

    (0..weights.len())
        .map(|_| {
            let u = rng.gen::<f64>() * acc;
            cdf.partition_point(|&c| c <= u).min(last)
        })
        .collect()
}

impl Regressor for AdaBoostRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        AdaBoostRegressor::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        AdaBoostRegressor::predict(self, x)
    }

    fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

impl Algorithm for AdaBoostRegressor {
    const KEY: &'static str = "adaboost";

    fn with_seed(seed: u64) -> Self {
        AdaBoostRegressor::default().with_random_state(seed)
    }
}
