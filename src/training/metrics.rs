//! Held-out regression metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Coefficient of determination.
///
/// A constant target scores 1.0 when predicted exactly and 0.0 otherwise.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    if n == 0.0 {
        return f64::NAN;
    }
    let y_mean = y_true.sum() / n;
    let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = y_true.iter().zip(y_pred.iter()).map(|(t, p)| (t - p).powi(2)).sum();

    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub r2: f64,
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
}

impl RegressionMetrics {
    /// Compute all metrics over aligned true/predicted vectors
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true.iter().zip(y_pred.iter()).map(|(t, p)| t - p).collect();

        let mse = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        Self {
            r2: r2_score(y_true, y_pred),
            mae,
            mse,
            rmse: mse.sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regression_metrics() {
        let y_true = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let y_pred = array![1.1, 2.0, 2.9, 4.1, 5.0];

        let metrics = RegressionMetrics::compute(&y_true, &y_pred);
        assert!(metrics.r2 > 0.9);
        assert!((metrics.mse - 0.006).abs() < 1e-12);
        assert!((metrics.rmse - 0.006f64.sqrt()).abs() < 1e-12);
        assert!((metrics.mae - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_r2_of_mean_prediction_is_zero() {
        let y_true = array![1.0, 2.0, 3.0];
        let y_pred = array![2.0, 2.0, 2.0];
        assert_eq!(r2_score(&y_true, &y_pred), 0.0);
    }

    #[test]
    fn test_r2_can_be_negative() {
        let y_true = array![1.0, 2.0, 3.0];
        let y_pred = array![3.0, 2.0, 1.0];
        assert_eq!(r2_score(&y_true, &y_pred), -3.0);
    }

    #[test]
    fn test_r2_constant_target() {
        let y_true = array![4.0, 4.0];
        assert_eq!(r2_score(&y_true, &array![4.0, 4.0]), 1.0);
        assert_eq!(r2_score(&y_true, &array![4.0, 5.0]), 0.0);
    }
}
