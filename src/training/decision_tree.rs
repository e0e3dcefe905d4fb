//! Decision tree regressor

use super::models::{Algorithm, Regressor};
use crate::error::{check_fit_input, check_predict_width, ModelError};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, ModelError>;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64, n_samples: usize },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

impl TreeNode {
    /// Route one sample to its leaf value
    pub fn predict_row(&self, sample: ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                    node = if sample[*feature_idx] <= *threshold { left } else { right };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

/// CART regression tree with the squared-error criterion.
///
/// Among equally good splits the first candidate (lowest feature index, then
/// lowest threshold) wins, so fitting is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    n_features: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Fit on all rows
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_fit_input(x, y)?;
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.fit_indices(x, y, &indices)
    }

    /// Fit on a subset of rows; repeated indices act as sample weights
    pub fn fit_indices(&mut self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> Result<&mut Self> {
        if indices.is_empty() {
            return Err(ModelError::InvalidInput("empty training set".to_string()));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= x.nrows() || i >= y.len()) {
            return Err(ModelError::InvalidInput(format!("row index {} out of bounds", bad)));
        }

        let root = self.build_tree(x, y, indices.to_vec(), 0);
        self.n_features = x.ncols();
        self.root = Some(root);
        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: Vec<usize>,
        depth: usize,
    ) -> TreeNode {
        let n_samples = indices.len();
        let sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let value = sum / n_samples as f64;

        let first = y[indices[0]];
        let is_pure = indices.iter().all(|&i| (y[i] - first).abs() < 1e-12);
        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_pure;

        if should_stop {
            return TreeNode::Leaf { value, n_samples };
        }

        let Some(split) = self.find_best_split(x, y, &indices) else {
            return TreeNode::Leaf { value, n_samples };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[[i, split.feature]] <= split.threshold);

        let left = Box::new(self.build_tree(x, y, left_indices, depth + 1));
        let right = Box::new(self.build_tree(x, y, right_indices, depth + 1));

        TreeNode::Split {
            feature_idx: split.feature,
            threshold: split.threshold,
            left,
            right,
            n_samples,
        }
    }

    /// Best split over every feature, scanning each feature's sorted values once.
    ///
    /// Gain is the reduction in summed squared error.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
    ) -> Option<Split> {
        let n = indices.len() as f64;
        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let parent_score = total_sum * total_sum / n;
        let min_leaf = self.min_samples_leaf.max(1);

        // Collected in feature order so ties resolve identically with or without threads
        let per_feature: Vec<Option<Split>> = (0..x.ncols())
            .into_par_iter()
            .map(|feature| {
                let mut order: Vec<(f64, f64)> = indices.iter().map(|&i| (x[[i, feature]], y[i])).collect();
                order.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut best: Option<Split> = None;
                let mut left_sum = 0.0;
                for k in 0..order.len() - 1 {
                    left_sum += order[k].1;
                    let n_left = k + 1;
                    let n_right = order.len() - n_left;
                    if order[k].0 == order[k + 1].0 || n_left < min_leaf || n_right < min_leaf {
                        continue;
                    }

                    let right_sum = total_sum - left_sum;
                    let score = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
                    let gain = score - parent_score;
                    if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                        best = Some(Split {
                            feature,
                            threshold: (order[k].0 + order[k + 1].0) / 2.0,
                            gain,
                        });
                    }
                }
                best
            })
            .collect();

        let mut best: Option<Split> = None;
        for candidate in per_feature.into_iter().flatten() {
            if best.as_ref().map_or(true, |b| candidate.gain > b.gain) {
                best = Some(candidate);
            }
        }
        best
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(ModelError::NotFitted)?;
        check_predict_width(x, self.n_features)?;
        Ok(x.rows().into_iter().map(|row| root.predict_row(row)).collect())
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    pub fn get_depth(&self) -> usize {
        self.root.as_ref().map_or(0, TreeNode::depth)
    }

    pub fn get_n_leaves(&self) -> usize {
        self.root.as_ref().map_or(0, TreeNode::n_leaves)
    }
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl Regressor for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        DecisionTree::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        DecisionTree::predict(self, x)
    }

    fn is_fitted(&self) -> bool {
        self.root.is_some()
    }
}

impl Algorithm for DecisionTree {
    const KEY: &'static str = "decision_tree";

    /// Splits are exhaustive, so the seed has nothing to drive
    fn with_seed(_seed: u64) -> Self {
        DecisionTree::new()
    }
}
