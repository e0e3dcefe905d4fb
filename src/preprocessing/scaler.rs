//! Feature scaling

use crate::error::TransformError;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Column-wise standard scaler over a dense matrix.
///
/// Uses the population standard deviation. A column with zero deviation is
/// scaled by 1. With `with_mean = false` columns are only divided, which keeps
/// one-hot indicators sparse-friendly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    with_mean: bool,
    mean: Vec<f64>,
    scale: Vec<f64>,
    is_fitted: bool,
}

impl StandardScaler {
    /// Create a new scaler
    pub fn new(with_mean: bool) -> Self {
        Self {
            with_mean,
            mean: Vec::new(),
            scale: Vec::new(),
            is_fitted: false,
        }
    }

    /// Fit per-column mean and deviation
    pub fn fit(&mut self, x: &Array2<f64>) -> &mut Self {
        let n = x.nrows() as f64;
        let (mean, scale): (Vec<f64>, Vec<f64>) = x
            .axis_iter(Axis(1))
            .map(|col| {
                if col.is_empty() {
                    return (0.0, 1.0);
                }
                let mean = col.sum() / n;
                let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                (mean, if std == 0.0 { 1.0 } else { std })
            })
            .unzip();

        self.mean = mean;
        self.scale = scale;
        self.is_fitted = true;
        self
    }

    /// Scale with the frozen parameters
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, TransformError> {
        if !self.is_fitted {
            return Err(TransformError::NotFitted);
        }
        if x.ncols() != self.scale.len() {
            return Err(TransformError::InvalidColumn {
                column: "<scaled block>".to_string(),
                reason: format!("expected {} columns, got {}", self.scale.len(), x.ncols()),
            });
        }

        let mut out = x.clone();
        for (j, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
            let center = if self.with_mean { self.mean[j] } else { 0.0 };
            let scale = self.scale[j];
            col.mapv_inplace(|v| (v - center) / scale);
        }
        Ok(out)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>, TransformError> {
        self.fit(x);
        self.transform(x)
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}
