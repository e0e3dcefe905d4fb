//! Regressor traits and the factories that build and restore them

use crate::error::ModelError;
use ndarray::{Array1, Array2};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Serializable view of a model's state.
///
/// Blanket-implemented for every `Serialize` type so `dyn Regressor` can be
/// persisted without knowing its concrete type.
pub trait StateSnapshot {
    fn snapshot(&self) -> Result<serde_json::Value, ModelError>;
}

impl<T: Serialize> StateSnapshot for T {
    fn snapshot(&self) -> Result<serde_json::Value, ModelError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Uniform contract every candidate algorithm satisfies
pub trait Regressor: StateSnapshot + Send + Sync + fmt::Debug {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError>;

    /// Predict one value per row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError>;

    fn is_fitted(&self) -> bool;
}

/// A concrete algorithm that can live in the model registry.
///
/// Implementing this is all a new algorithm needs: [`RegressorFactory::of`]
/// derives construction and restoration from it.
pub trait Algorithm: Regressor + Serialize + DeserializeOwned + 'static {
    /// Stable key written into persisted artifacts
    const KEY: &'static str;

    /// Fresh, unfitted instance with default hyperparameters
    fn with_seed(seed: u64) -> Self;
}

/// Builds fresh instances of one algorithm and restores persisted ones
#[derive(Clone, Copy)]
pub struct RegressorFactory {
    algorithm: &'static str,
    build: fn(u64) -> Box<dyn Regressor>,
    restore: fn(serde_json::Value) -> Result<Box<dyn Regressor>, ModelError>,
}

impl RegressorFactory {
    pub fn of<A: Algorithm>() -> Self {
        Self {
            algorithm: A::KEY,
            build: build_boxed::<A>,
            restore: restore_boxed::<A>,
        }
    }

    pub fn algorithm(&self) -> &'static str {
        self.algorithm
    }

    /// New unfitted instance
    pub fn build(&self, seed: u64) -> Box<dyn Regressor> {
        (self.build)(seed)
    }

    /// Rebuild a model from its [`StateSnapshot`]
    pub fn restore(&self, state: serde_json::Value) -> Result<Box<dyn Regressor>, ModelError> {
        (self.restore)(state)
    }
}

impl fmt::Debug for RegressorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegressorFactory")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

fn build_boxed<A: Algorithm>(seed: u64) -> Box<dyn Regressor> {
    Box::new(A::with_seed(seed))
}

fn restore_boxed<A: Algorithm>(state: serde_json::Value) -> Result<Box<dyn Regressor>, ModelError> {
    let model: A = serde_json::from_value(state)?;
    Ok(Box::new(model))
}
