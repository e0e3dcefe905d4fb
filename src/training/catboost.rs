//! CatBoost-style gradient boosting over symmetric (oblivious) trees
//!
//! Every level of a tree applies one (feature, threshold) split to all nodes,
//! so a tree of depth d is a list of d splits plus 2^d leaf values. Features
//! are quantized into at most `border_count` borders before training.

use super::gradient_boosting::sample_fraction;
use super::models::{Algorithm, Regressor};
use crate::error::{check_fit_input, check_predict_width, ModelError};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatBoostConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub reg_lambda: f64,
    pub subsample: f64,
    /// Maximum split candidates per feature
    pub border_count: usize,
    pub random_state: u64,
}

impl Default for CatBoostConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 6,
            reg_lambda: 3.0,
            subsample: 1.0,
            border_count: 254,
            random_state: 42,
        }
    }
}

/// Symmetric tree: each level uses the same split feature and threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SymmetricTree {
    /// (feature, threshold) per level
    splits: Vec<(usize, f64)>,
    /// 2^depth leaf values
    leaf_values: Vec<f64>,
}

impl SymmetricTree {
    fn predict(&self, sample: ArrayView1<f64>) -> f64 {
        let mut idx = 0usize;
        for &(feature, threshold) in &self.splits {
            idx = idx * 2 + usize::from(sample[feature] > threshold);
        }
        self.leaf_values.get(idx).copied().unwrap_or(0.0)
    }
}

/// Per-feature quantization borders and the bin of every training row
struct Quantized {
    borders: Vec<Vec<f64>>,
    /// bins[feature][row] = number of borders strictly below the value
    bins: Vec<Vec<usize>>,
}

impl Quantized {
    fn new(x: &Array2<f64>, border_count: usize) -> Self {
        let (borders, bins): (Vec<Vec<f64>>, Vec<Vec<usize>>) = x
            .axis_iter(Axis(1))
            .into_par_iter()
            .map(|col| {
                let mut values: Vec<f64> = col.to_vec();
                values.sort_by(f64::total_cmp);
                values.dedup();

                let midpoints: Vec<f64> = values.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
                let borders = if midpoints.len() <= border_count {
                    midpoints
                } else {
                    let step = midpoints.len() as f64 / border_count as f64;
                    (0..border_count)
                        .map(|k| midpoints[((k as f64 + 0.5) * step) as usize])
                        .collect()
                };

                let bins: Vec<usize> = col.iter().map(|v| borders.partition_point(|b| b < v)).collect();
                (borders, bins)
            })
            .unzip();
        Self { borders, bins }
    }
}

fn build_symmetric_tree(
    data: &Quantized,
    gradients: &[f64],
    hessians: &[f64],
    indices: &[usize],
    max_depth: usize,
    reg_lambda: f64,
) -> SymmetricTree {
    let n_features = data.borders.len();
    let mut splits = Vec::with_capacity(max_depth);
    let mut buckets: Vec<Vec<usize>> = vec![indices.to_vec()];

    let score = |g: f64, h: f64| g * g / (h + reg_lambda);

    for _depth in 0..max_depth {
        // One split shared by every bucket; candidates gathered in feature order
        let candidates: Vec<Option<(usize, usize, f64)>> = (0..n_features)
            .into_par_iter()
            .map(|feat| {
                let n_borders = data.borders[feat].len();
                if n_borders == 0 {
                    return None;
                }
                let bins = &data.bins[feat];

                let mut total_gain = vec![0.0; n_borders];
                for bucket in &buckets {
                    let mut g_hist = vec![0.0; n_borders + 1];
                    let mut h_hist = vec![0.0; n_borders + 1];
                    for &i in bucket {
                        g_hist[bins[i]] += gradients[i];
                        h_hist[bins[i]] += hessians[i];
                    }
                    let g_total: f64 = g_hist.iter().sum();
                    let h_total: f64 = h_hist.iter().sum();
                    let parent = score(g_total, h_total);

                    let (mut g_left, mut h_left) = (0.0, 0.0);
                    for k in 0..n_borders {
                        g_left += g_hist[k];
                        h_left += h_hist[k];
                        total_gain[k] +=
                            score(g_left, h_left) + score(g_total - g_left, h_total - h_left) - parent;
                    }
                }

                let mut best: Option<(usize, usize, f64)> = None;
                for (k, &gain) in total_gain.iter().enumerate() {
                    if gain > 1e-12 && best.map_or(true, |b| gain > b.2) {
                        best = Some((feat, k, gain));
                    }
                }
                best
            })
            .collect();

        let mut best: Option<(usize, usize, f64)> = None;
        for candidate in candidates.into_iter().flatten() {
            if best.map_or(true, |b| candidate.2 > b.2) {
                best = Some(candidate);
            }
        }

        let Some((feat, border, _)) = best else {
            break;
        };
        splits.push((feat, data.borders[feat][border]));

        let bins = &data.bins[feat];
        let mut next = Vec::with_capacity(buckets.len() * 2);
        for bucket in &buckets {
            let (left, right): (Vec<usize>, Vec<usize>) = bucket.iter().partition(|&&i| bins[i] <= border);
            next.push(left);
            next.push(right);
        }
        buckets = next;
    }

    let leaf_values = buckets
        .iter()
        .map(|bucket| {
            if bucket.is_empty() {
                return 0.0;
            }
            let g: f64 = bucket.iter().map(|&i| gradients[i]).sum();
            let h: f64 = bucket.iter().map(|&i| hessians[i]).sum();
            -g / (h + reg_lambda)
        })
        .collect();

    SymmetricTree { splits, leaf_values }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatBoostRegressor {
    pub config: CatBoostConfig,
    trees: Vec<SymmetricTree>,
    base_prediction: f64,
    n_features: usize,
    is_fitted: bool,
}

impl Default for CatBoostRegressor {
    fn default() -> Self {
        Self::new(CatBoostConfig::default())
    }
}

impl CatBoostRegressor {
    pub fn new(config: CatBoostConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            base_prediction: 0.0,
            n_features: 0,
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let n = x.nrows();

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state);
        let data = Quantized::new(x, self.config.border_count.max(1));
        let base_prediction = y.mean().unwrap_or(0.0);
        let mut predictions = Array1::from_elem(n, base_prediction);
        let hessians = vec![1.0; n];

        let mut trees = Vec::with_capacity(self.config.n_estimators);
        for _ in 0..self.config.n_estimators {
            let gradients: Vec<f64> = predictions.iter().zip(y.iter()).map(|(&p, &yi)| p - yi).collect();
            let indices = sample_fraction(n, self.config.subsample, &mut rng);

            let tree = build_symmetric_tree(
                &data,
                &gradients,
                &hessians,
                &indices,
                self.config.max_depth,
                self.config.reg_lambda,
            );

            for (i, row) in x.rows().into_iter().enumerate() {
                predictions[i] += self.config.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        self.trees = trees;
        self.base_prediction = base_prediction;
        self.n_features = x.ncols();
        self.is_fitted = true;
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(ModelError::NotFitted);
        }
        check_predict_width(x, self.n_features)?;

        let lr = self.config.learning_rate;
        Ok(x.rows()
            .into_iter()
            .map(|row| self.base_prediction + self.trees.iter().map(|t| lr * t.predict(row)).sum::<f64>())
            .collect())
    }
}

impl Regressor for CatBoostRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        CatBoostRegressor::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        CatBoostRegressor::predict(self, x)
    }

    fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

impl Algorithm for CatBoostRegressor {
    const KEY: &'static str = "catboost";

    fn with_seed(seed: u64) -> Self {
        CatBoostRegressor::new(CatBoostConfig {
            random_state: seed,
            ..Default::default()
        })
    }
}
