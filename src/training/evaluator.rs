//! Fit every registry model on the training matrix and score it on held-out data

use super::metrics::RegressionMetrics;
use super::models::Regressor;
use super::registry::{ModelRegistry, RegistryEntry};
use crate::error::{ModelError, PipelineError, Result};
use crate::utils::Timer;
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// What to do when one model fails to fit or predict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Stop at the first failure and surface it
    #[default]
    Abort,
    /// Record the failure and keep evaluating the rest
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvaluationMode {
    #[default]
    Sequential,
    /// One rayon task per registry entry
    Parallel,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EvaluationOptions {
    pub policy: FailurePolicy,
    pub mode: EvaluationMode,
}

impl EvaluationOptions {
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Held-out result of one successfully evaluated model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub name: String,
    pub algorithm: String,
    pub r2: f64,
    pub mae: f64,
    pub rmse: f64,
    pub fit_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFailure {
    pub name: String,
    pub error: String,
}

/// Model name to held-out score, in registry order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    scores: Vec<ModelScore>,
    failures: Vec<ModelFailure>,
}

impl ScoreReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a score; names must be unique across the report
    pub fn push_score(&mut self, score: ModelScore) -> Result<()> {
        self.ensure_new(&score.name)?;
        self.scores.push(score);
        Ok(())
    }

    pub fn push_failure(&mut self, failure: ModelFailure) -> Result<()> {
        self.ensure_new(&failure.name)?;
        self.failures.push(failure);
        Ok(())
    }

    fn ensure_new(&self, name: &str) -> Result<()> {
        let taken = self.scores.iter().any(|s| s.name == name) || self.failures.iter().any(|f| f.name == name);
        if taken {
            return Err(PipelineError::InvalidInput(format!(
                "model '{}' appears twice in the score report",
                name
            )));
        }
        Ok(())
    }

    pub fn scores(&self) -> &[ModelScore] {
        &self.scores
    }

    pub fn failures(&self) -> &[ModelFailure] {
        &self.failures
    }

    /// R² of `name`, if it was scored
    pub fn get(&self, name: &str) -> Option<f64> {
        self.scores.iter().find(|s| s.name == name).map(|s| s.r2)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Highest non-NaN R²; the earliest entry wins a tie
    pub fn best(&self) -> Option<&ModelScore> {
        let mut best: Option<&ModelScore> = None;
        for score in self.scores.iter().filter(|s| !s.r2.is_nan()) {
            if best.map_or(true, |b| score.r2 > b.r2) {
                best = Some(score);
            }
        }
        best
    }
}

/// Runs the registry against one train/test split
#[derive(Debug, Clone, Default)]
pub struct ModelEvaluator {
    options: EvaluationOptions,
}

impl ModelEvaluator {
    pub fn new(options: EvaluationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> EvaluationOptions {
        self.options
    }

    /// Fit, predict and score every entry, mutating each model in place
    pub fn evaluate(
        &self,
        train_x: &Array2<f64>,
        train_y: &Array1<f64>,
        test_x: &Array2<f64>,
        test_y: &Array1<f64>,
        registry: &mut ModelRegistry,
    ) -> Result<ScoreReport> {
        validate_inputs(train_x, train_y, test_x, test_y)?;
        let data = SplitData {
            train_x,
            train_y,
            test_x,
            test_y,
        };

        info!(
            models = registry.len(),
            train_rows = train_x.nrows(),
            test_rows = test_x.nrows(),
            mode = ?self.options.mode,
            "Evaluating candidate models"
        );

        let outcomes: Vec<(String, std::result::Result<ModelScore, ModelError>)> = match self.options.mode {
            EvaluationMode::Sequential => {
                let mut outcomes = Vec::with_capacity(registry.len());
                for entry in registry.entries_mut() {
                    let outcome = evaluate_entry(entry, &data);
                    let failed = outcome.is_err();
                    outcomes.push((entry.name().to_string(), outcome));
                    if failed && self.options.policy == FailurePolicy::Abort {
                        break;
                    }
                }
                outcomes
            }
            // Collected in registry order regardless of completion order
            EvaluationMode::Parallel => registry
                .entries_mut()
                .par_iter_mut()
                .map(|entry| (entry.name().to_string(), evaluate_entry(entry, &data)))
                .collect(),
        };

        let mut report = ScoreReport::new();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(score) => {
                    info!(model = %name, r2 = score.r2, fit_secs = score.fit_secs, "Model evaluated");
                    report.push_score(score)?;
                }
                Err(err) => match self.options.policy {
                    FailurePolicy::Abort => return Err(PipelineError::model_fit(name, err)),
                    FailurePolicy::Continue => {
                        warn!(model = %name, error = %err, "Model failed, skipping");
                        report.push_failure(ModelFailure {
                            name,
                            error: err.to_string(),
                        })?;
                    }
                },
            }
        }
        Ok(report)
    }
}

/// Evaluate with the default options (sequential, abort on failure)
pub fn evaluate(
    train_x: &Array2<f64>,
    train_y: &Array1<f64>,
    test_x: &Array2<f64>,
    test_y: &Array1<f64>,
    registry: &mut ModelRegistry,
) -> Result<ScoreReport> {
    ModelEvaluator::default().evaluate(train_x, train_y, test_x, test_y, registry)
}

struct SplitData<'a> {
    train_x: &'a Array2<f64>,
    train_y: &'a Array1<f64>,
    test_x: &'a Array2<f64>,
    test_y: &'a Array1<f64>,
}

fn evaluate_entry(entry: &mut RegistryEntry, data: &SplitData<'_>) -> std::result::Result<ModelScore, ModelError> {
    let timer = Timer::start();
    entry.model_mut().fit(data.train_x, data.train_y)?;
    let fit_secs = timer.elapsed_secs();

    let predictions = entry.model().predict(data.test_x)?;
    if predictions.len() != data.test_y.len() {
        return Err(ModelError::ShapeMismatch {
            expected: format!("{} predictions", data.test_y.len()),
            actual: format!("{} predictions", predictions.len()),
        });
    }
    let metrics = RegressionMetrics::compute(data.test_y, &predictions);
    // Non-finite metrics cannot be persisted in the JSON report
    if ![metrics.r2, metrics.mae, metrics.rmse].iter().all(|v| v.is_finite()) {
        return Err(ModelError::Computation(format!(
            "non-finite held-out metrics (r2 {}, mae {}, rmse {})",
            metrics.r2, metrics.mae, metrics.rmse
        )));
    }

    Ok(ModelScore {
        name: entry.name().to_string(),
        algorithm: entry.algorithm().to_string(),
        r2: metrics.r2,
        mae: metrics.mae,
        rmse: metrics.rmse,
        fit_secs,
    })
}

fn validate_inputs(
    train_x: &Array2<f64>,
    train_y: &Array1<f64>,
    test_x: &Array2<f64>,
    test_y: &Array1<f64>,
) -> Result<()> {
    if train_x.nrows() != train_y.len() {
        return Err(PipelineError::InvalidInput(format!(
            "training matrix has {} rows but target has {}",
            train_x.nrows(),
            train_y.len()
        )));
    }
    if test_x.nrows() != test_y.len() {
        return Err(PipelineError::InvalidInput(format!(
            "test matrix has {} rows but target has {}",
            test_x.nrows(),
            test_y.len()
        )));
    }
    if train_x.ncols() != test_x.ncols() {
        return Err(PipelineError::InvalidInput(format!(
            "train width {} differs from test width {}",
            train_x.ncols(),
            test_x.ncols()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{DecisionTree, LinearRegression};

    fn split() -> (Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| ((i * (j + 1)) % 9) as f64);
        let y = x.column(0).mapv(|v| 2.0 * v) + &x.column(1);
        let train_x = x.slice(ndarray::s![..30, ..]).to_owned();
        let train_y = y.slice(ndarray::s![..30]).to_owned();
        let test_x = x.slice(ndarray::s![30.., ..]).to_owned();
        let test_y = y.slice(ndarray::s![30..]).to_owned();
        (train_x, train_y, test_x, test_y)
    }

    fn registry() -> ModelRegistry {
        let mut registry = ModelRegistry::new(7);
        registry.register_algorithm::<LinearRegression>("Linear Regression").unwrap();
        registry.register_algorithm::<DecisionTree>("Decision Tree").unwrap();
        registry
    }

    #[test]
    fn test_every_model_is_scored() {
        let (train_x, train_y, test_x, test_y) = split();
        let mut registry = registry();
        let report = evaluate(&train_x, &train_y, &test_x, &test_y, &mut registry).unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report.scores()[0].name, "Linear Regression");
        assert_eq!(report.scores()[1].name, "Decision Tree");
        assert!(report.get("Linear Regression").unwrap() > 0.999);
        assert!(registry.entries().iter().all(|e| e.model().is_fitted()));
    }

    #[test]
    fn test_empty_registry_gives_empty_report() {
        let (train_x, train_y, test_x, test_y) = split();
        let mut registry = ModelRegistry::new(0);
        let report = evaluate(&train_x, &train_y, &test_x, &test_y, &mut registry).unwrap();
        assert!(report.is_empty());
        assert!(report.best().is_none());
    }

    #[test]
    fn test_width_mismatch_is_invalid_input() {
        let (train_x, train_y, _, test_y) = split();
        let test_x = Array2::zeros((test_y.len(), 3));
        let err = evaluate(&train_x, &train_y, &test_x, &test_y, &mut registry()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    /// Fits fine but predicts NaN everywhere
    #[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
    struct NanPredictor {
        fitted: bool,
    }

    impl Regressor for NanPredictor {
        fn fit(&mut self, _x: &Array2<f64>, _y: &Array1<f64>) -> std::result::Result<(), ModelError> {
            self.fitted = true;
            Ok(())
        }

        fn predict(&self, x: &Array2<f64>) -> std::result::Result<Array1<f64>, ModelError> {
            Ok(Array1::from_elem(x.nrows(), f64::NAN))
        }

        fn is_fitted(&self) -> bool {
            self.fitted
        }
    }

    impl crate::training::Algorithm for NanPredictor {
        const KEY: &'static str = "nan_predictor";

        fn with_seed(_seed: u64) -> Self {
            Self::default()
        }
    }

    #[test]
    fn test_non_finite_metrics_are_model_failures() {
        let (train_x, train_y, test_x, test_y) = split();
        let mut registry = registry();
        registry.register_algorithm::<NanPredictor>("NaN").unwrap();

        let continue_on = ModelEvaluator::new(EvaluationOptions::default().with_policy(FailurePolicy::Continue));
        let report = continue_on
            .evaluate(&train_x, &train_y, &test_x, &test_y, &mut registry)
            .unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report.failures()[0].name, "NaN");
        assert!(report.scores().iter().all(|s| s.r2.is_finite() && s.mae.is_finite()));

        let err = evaluate(&train_x, &train_y, &test_x, &test_y, &mut registry).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ModelFit { model, source: ModelError::Computation(_) } if model == "NaN"
        ));
    }

    #[test]
    fn test_best_prefers_first_on_tie_and_skips_nan() {
        let score = |name: &str, r2: f64| ModelScore {
            name: name.to_string(),
            algorithm: "test".to_string(),
            r2,
            mae: 0.0,
            rmse: 0.0,
            fit_secs: 0.0,
        };
        let mut report = ScoreReport::new();
        report.push_score(score("a", f64::NAN)).unwrap();
        report.push_score(score("b", 0.7)).unwrap();
        report.push_score(score("c", 0.7)).unwrap();
        assert_eq!(report.best().unwrap().name, "b");
        assert!(report.push_score(score("b", 0.1)).is_err());
    }
}
