//! Model training and selection
//!
//! Candidate regressors live behind the [`Regressor`] trait:
//! - Linear regression (OLS)
//! - K-Nearest Neighbors
//! - Decision trees and Random Forests
//! - Gradient boosting, XGBoost-style and CatBoost-style boosting
//! - AdaBoost.R2
//!
//! [`ModelRegistry`] holds them in evaluation order, [`ModelEvaluator`] scores
//! each on held-out data and [`select`] picks the winner.

mod models;
pub mod adaboost;
pub mod catboost;
pub mod decision_tree;
pub mod evaluator;
pub mod gradient_boosting;
pub mod knn;
pub mod linear_models;
pub mod metrics;
pub mod random_forest;
pub mod registry;
pub mod selector;
pub mod xgboost;

pub use models::{Algorithm, Regressor, RegressorFactory, StateSnapshot};
pub use adaboost::AdaBoostRegressor;
pub use catboost::{CatBoostConfig, CatBoostRegressor};
pub use decision_tree::{DecisionTree, TreeNode};
pub use evaluator::{
    evaluate, EvaluationMode, EvaluationOptions, FailurePolicy, ModelEvaluator, ModelFailure, ModelScore,
    ScoreReport,
};
pub use gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use knn::{KNNConfig, KNNRegressor};
pub use linear_models::LinearRegression;
pub use metrics::{r2_score, RegressionMetrics};
pub use random_forest::RandomForest;
pub use registry::{builtin_factories, factory_for, ModelRegistry, RegistryEntry, STANDARD_MODELS};
pub use selector::{select, SelectedModel, DEFAULT_THRESHOLD};
pub use xgboost::{XGBoostConfig, XGBoostRegressor};
