//! K-Nearest Neighbors regression

use super::models::{Algorithm, Regressor};
use crate::error::{check_fit_input, check_predict_width, ModelError};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

type Result<T> = std::result::Result<T, ModelError>;

/// KNN configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNConfig {
    /// Number of neighbors
    pub n_neighbors: usize,
}

impl Default for KNNConfig {
    fn default() -> Self {
        Self { n_neighbors: 5 }
    }
}

/// K-Nearest Neighbors Regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNRegressor {
    config: KNNConfig,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl Default for KNNRegressor {
    fn default() -> Self {
        Self::new(KNNConfig::default())
    }
}

impl KNNRegressor {
    pub fn new(config: KNNConfig) -> Self {
        Self {
            config,
            x_train: None,
            y_train: None,
        }
    }

    /// Create with default config and specified k
    pub fn with_k(k: usize) -> Self {
        Self::new(KNNConfig { n_neighbors: k })
    }

    pub fn config(&self) -> &KNNConfig {
        &self.config
    }

    /// Fit the regressor (stores training data)
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        if self.config.n_neighbors == 0 {
            return Err(ModelError::InvalidInput("n_neighbors must be positive".to_string()));
        }
        if x.nrows() < self.config.n_neighbors {
            return Err(ModelError::InvalidInput(format!(
                "n_neighbors = {} exceeds {} training samples",
                self.config.n_neighbors,
                x.nrows()
            )));
        }
        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(())
    }

    /// Mean target of the k nearest training rows by Euclidean distance,
    /// parallelized over test samples
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (x_train, y_train) = match (&self.x_train, &self.y_train) {
            (Some(x_train), Some(y_train)) => (x_train, y_train),
            _ => return Err(ModelError::NotFitted),
        };
        check_predict_width(x, x_train.ncols())?;

        let k = self.config.n_neighbors;
        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let neighbors = find_k_nearest(x.row(i), x_train, k);
                neighbors.iter().map(|n| y_train[n.index]).sum::<f64>() / neighbors.len() as f64
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}

impl Regressor for KNNRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        KNNRegressor::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        KNNRegressor::predict(self, x)
    }

    fn is_fitted(&self) -> bool {
        self.x_train.is_some()
    }
}

impl Algorithm for KNNRegressor {
    const KEY: &'static str = "knn";

    fn with_seed(_seed: u64) -> Self {
        KNNRegressor::default()
    }
}

/// Max-heap entry; ties on distance resolve to the earlier training row
#[derive(Debug, Clone, Copy)]
struct Neighbor {
    dist: f64,
    index: usize,
}

impl PartialEq for Neighbor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then(self.index.cmp(&other.index))
    }
}

/// Keep the k smallest distances with a max-heap, O(n log k)
fn find_k_nearest(
    point: ArrayView1<f64>,
    x_train: &Array2<f64>,
    k: usize,
) -> Vec<Neighbor> {
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for (index, row) in x_train.rows().into_iter().enumerate() {
        let candidate = Neighbor {
            dist: euclidean(point, row),
            index,
        };
        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().map_or(false, |top| candidate < *top) {
            heap.pop();
            heap.push(candidate);
        }
    }

    heap.into_sorted_vec()
}

fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(ai, bi)| (ai - bi).powi(2))
        .sum::<f64>()
        .sqrt()
}
