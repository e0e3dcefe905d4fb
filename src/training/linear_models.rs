//! Ordinary least squares regression

use super::models::{Algorithm, Regressor};
use crate::error::{check_fit_input, check_predict_width, ModelError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

type Result<T> = std::result::Result<T, ModelError>;

/// Relative ridge terms tried, in order, when X^T X is not positive definite
const JITTER_STEPS: [f64; 4] = [1e-10, 1e-8, 1e-6, 1e-4];

/// Pivots below this fraction of the original diagonal count as singular
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Cholesky solve of `A x = b`; `None` if `A` is not positive definite
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    // A = L * L^T
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= PIVOT_TOLERANCE * a[[i, i]].abs() || diag <= 0.0 || !diag.is_finite() {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L * y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // L^T * x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Gauss-Jordan inversion with partial pivoting
fn matrix_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    // [M | I]
    let mut aug = Array2::<f64>::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = m[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let mut max_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }

        if max_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [max_row, j]);
            }
        }

        if aug[[col, col]].abs() < 1e-10 {
            return None;
        }

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..2 * n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    Some(aug.slice(ndarray::s![.., n..]).to_owned())
}

/// Solve the normal equations `(X^T X) w = X^T y`.
///
/// Rank-deficient designs (one-hot blocks next to an intercept) get a growing
/// ridge term until Cholesky succeeds; Gauss-Jordan is the last resort.
fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);

    if let Some(w) = cholesky_solve(&xtx, &xty) {
        return Some(w);
    }

    let n = xtx.nrows();
    let mean_diag = if n == 0 {
        0.0
    } else {
        xtx.diag().iter().map(|v| v.abs()).sum::<f64>() / n as f64
    };
    let base = if mean_diag > 0.0 { mean_diag } else { 1.0 };

    for step in JITTER_STEPS {
        let mut regularized = xtx.clone();
        let ridge = step * base;
        for k in 0..n {
            regularized[[k, k]] += ridge;
        }
        if let Some(w) = cholesky_solve(&regularized, &xty) {
            debug!(ridge, "Normal equations regularized");
            return Some(w);
        }
    }

    matrix_inverse(&xtx).map(|inv| inv.dot(&xty))
}

/// Linear regression model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: Option<f64>,
    /// Whether to fit intercept
    pub fit_intercept: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Create a new linear regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept: true,
        }
    }

    /// Enable/disable fitting intercept
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Fit the model to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_fit_input(x, y)?;

        // Center data if fitting intercept
        let (coefficients, intercept) = if self.fit_intercept {
            let x_mean = x
                .mean_axis(Axis(0))
                .ok_or_else(|| ModelError::InvalidInput("empty training set".to_string()))?;
            let y_mean = y.mean().unwrap_or(0.0);

            let x_centered = x - &x_mean.view().insert_axis(Axis(0));
            let y_centered = y - y_mean;

            let w = solve_least_squares(&x_centered, &y_centered).ok_or_else(singular)?;
            let b = y_mean - w.dot(&x_mean);
            (w, b)
        } else {
            (solve_least_squares(x, y).ok_or_else(singular)?, 0.0)
        };

        if coefficients.iter().any(|c| !c.is_finite()) || !intercept.is_finite() {
            return Err(ModelError::Computation("non-finite coefficients".to_string()));
        }

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);
        Ok(self)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(ModelError::NotFitted)?;
        check_predict_width(x, coefficients.len())?;
        Ok(x.dot(coefficients) + self.intercept.unwrap_or(0.0))
    }
}

fn singular() -> ModelError {
    ModelError::Computation("matrix is singular, cannot solve least squares".to_string())
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        LinearRegression::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LinearRegression::predict(self, x)
    }

    fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

impl Algorithm for LinearRegression {
    const KEY: &'static str = "linear_regression";

    fn with_seed(_seed: u64) -> Self {
        LinearRegression::new()
    }
}
