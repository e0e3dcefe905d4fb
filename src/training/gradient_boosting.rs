//! Gradient Boosting regression
//!
//! Least-squares boosting: each round fits a shallow regression tree to the
//! current residuals and adds it with shrinkage.

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use super::decision_tree::DecisionTree;
use super::models::{Algorithm, Regressor};
use crate::error::{check_fit_input, check_predict_width, ModelError};

type Result<T> = std::result::Result<T, ModelError>;

/// Gradient Boosting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Row subsample ratio for each tree
    pub subsample: f64,
    /// Column subsample ratio for each tree
    pub colsample_bytree: f64,
    pub random_state: u64,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            colsample_bytree: 1.0,
            random_state: 42,
        }
    }
}

/// Gradient Boosting Regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTree>,
    col_indices_per_tree: Vec<Vec<usize>>,
    initial_prediction: f64,
    n_features: usize,
    is_fitted: bool,
}

impl Default for GradientBoostingRegressor {
    fn default() -> Self {
        Self::new(GradientBoostingConfig::default())
    }
}

impl GradientBoostingRegressor {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            col_indices_per_tree: Vec::new(),
            initial_prediction: 0.0,
            n_features: 0,
            is_fitted: false,
        }
    }

    pub fn config(&self) -> &GradientBoostingConfig {
        &self.config
    }

    /// Fit the gradient boosting model
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        if !(self.config.subsample > 0.0 && self.config.subsample <= 1.0)
            || !(self.config.colsample_bytree > 0.0 && self.config.colsample_bytree <= 1.0)
        {
            return Err(ModelError::InvalidInput(
                "subsample ratios must be in (0, 1]".to_string(),
            ));
        }

        let n_samples = x.nrows();
        let n_features = x.ncols();

        let initial_prediction = y.mean().unwrap_or(0.0);
        let mut predictions = Array1::from_elem(n_samples, initial_prediction);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state);

        let mut trees = Vec::with_capacity(self.config.n_estimators);
        let mut col_indices_per_tree = Vec::with_capacity(self.config.n_estimators);

        for _ in 0..self.config.n_estimators {
            let residuals = y - &predictions;

            let sample_indices = sample_fraction(n_samples, self.config.subsample, &mut rng);
            let col_indices = sample_fraction(n_features, self.config.colsample_bytree, &mut rng);
            let x_cols = select_columns(x, &col_indices);

            let mut tree = DecisionTree::new()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf);
            tree.fit_indices(&x_cols, &residuals, &sample_indices)?;

            // Every row moves, not only the sampled ones
            let update = tree.predict(&x_cols)?;
            predictions.scaled_add(self.config.learning_rate, &update);

            trees.push(tree);
            col_indices_per_tree.push(col_indices);
        }

        self.trees = trees;
        self.col_indices_per_tree = col_indices_per_tree;
        self.initial_prediction = initial_prediction;
        self.n_features = n_features;
        self.is_fitted = true;
        Ok(())
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(ModelError::NotFitted);
        }
        check_predict_width(x, self.n_features)?;

        let mut predictions = Array1::from_elem(x.nrows(), self.initial_prediction);
        for (tree, col_indices) in self.trees.iter().zip(&self.col_indices_per_tree) {
            let x_cols = select_columns(x, col_indices);
            predictions.scaled_add(self.config.learning_rate, &tree.predict(&x_cols)?);
        }
        Ok(predictions)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Sorted random subset of `ceil(ratio * n)` indices; all of them when `ratio >= 1`
pub(crate) fn sample_fraction(n: usize, ratio: f64, rng: &mut impl Rng) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    if ratio >= 1.0 {
        return indices;
    }
    let sample_size = ((n as f64) * ratio).ceil().max(1.0) as usize;
    indices.shuffle(rng);
    indices.truncate(sample_size);
    indices.sort_unstable();
    indices
}

pub(crate) fn select_columns<'a>(x: &'a Array2<f64>, cols: &[usize]) -> Cow<'a, Array2<f64>> {
    if cols.len() == x.ncols() {
        Cow::Borrowed(x)
    } else {
        Cow::Owned(x.select(Axis(1), cols))
    }
}

impl Regressor for GradientBoostingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        GradientBoostingRegressor::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        GradientBoostingRegressor::predict(self, x)
    }

    fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

impl Algorithm for GradientBoostingRegressor {
    const KEY: &'static str = "gradient_boosting";

    fn with_seed(seed: u64) -> Self {
        GradientBoostingRegressor::new(GradientBoostingConfig {
            random_state: seed,
            ..Default::default()
        })
    }
}
