//! Ordered, named collection of candidate regressors

use super::adaboost::AdaBoostRegressor;
use super::catboost::CatBoostRegressor;
use super::decision_tree::DecisionTree;
use super::gradient_boosting::GradientBoostingRegressor;
use super::knn::KNNRegressor;
use super::linear_models::LinearRegression;
use super::models::{Algorithm, Regressor, RegressorFactory};
use super::random_forest::RandomForest;
use super::xgboost::XGBoostRegressor;
use crate::error::{PipelineError, Result};

/// Display name and algorithm of every standard candidate, in evaluation order
pub const STANDARD_MODELS: [(&str, &str); 8] = [
    ("Linear Regression", LinearRegression::KEY),
    ("KNN", KNNRegressor::KEY),
    ("Decision Tree", DecisionTree::KEY),
    ("Random Forest", RandomForest::KEY),
    ("XGBRegressor", XGBoostRegressor::KEY),
    ("CatBoostRegressor", CatBoostRegressor::KEY),
    ("AdaBoostRegressor", AdaBoostRegressor::KEY),
    ("Gradient Boost", GradientBoostingRegressor::KEY),
];

/// Factories for every built-in algorithm
pub fn builtin_factories() -> [RegressorFactory; 8] {
    [
        RegressorFactory::of::<LinearRegression>(),
        RegressorFactory::of::<KNNRegressor>(),
        RegressorFactory::of::<DecisionTree>(),
        RegressorFactory::of::<RandomForest>(),
        RegressorFactory::of::<XGBoostRegressor>(),
        RegressorFactory::of::<CatBoostRegressor>(),
        RegressorFactory::of::<AdaBoostRegressor>(),
        RegressorFactory::of::<GradientBoostingRegressor>(),
    ]
}

/// Look up a built-in factory by its persisted algorithm key
pub fn factory_for(algorithm: &str) -> Option<RegressorFactory> {
    builtin_factories()
        .into_iter()
        .find(|f| f.algorithm() == algorithm)
}

/// One registry slot: a display name, its factory and the owned instance
#[derive(Debug)]
pub struct RegistryEntry {
    name: String,
    factory: RegressorFactory,
    model: Box<dyn Regressor>,
}

impl RegistryEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn algorithm(&self) -> &'static str {
        self.factory.algorithm()
    }

    pub fn factory(&self) -> RegressorFactory {
        self.factory
    }

    pub fn model(&self) -> &dyn Regressor {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> &mut dyn Regressor {
        self.model.as_mut()
    }

    pub(crate) fn into_parts(self) -> (String, RegressorFactory, Box<dyn Regressor>) {
        (self.name, self.factory, self.model)
    }
}

/// Freshly constructed models, evaluated and selected in insertion order
#[derive(Debug)]
pub struct ModelRegistry {
    seed: u64,
    entries: Vec<RegistryEntry>,
}

impl ModelRegistry {
    /// Empty registry; models added later are seeded with `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            entries: Vec::new(),
        }
    }

    /// The eight standard candidates
    pub fn standard(seed: u64) -> Self {
        let mut registry = Self::new(seed);
        for ((name, _), factory) in STANDARD_MODELS.iter().zip(builtin_factories()) {
            registry.entries.push(RegistryEntry {
                name: (*name).to_string(),
                factory,
                model: factory.build(seed),
            });
        }
        registry
    }

    /// Append a candidate built from `factory`; display names must be unique
    pub fn register(&mut self, name: impl Into<String>, factory: RegressorFactory) -> Result<&mut Self> {
        let name = name.into();
        if self.contains(&name) {
            return Err(PipelineError::InvalidInput(format!(
                "model '{}' is already registered",
                name
            )));
        }
        let model = factory.build(self.seed);
        self.entries.push(RegistryEntry { name, factory, model });
        Ok(self)
    }

    /// Shorthand for [`register`](Self::register) with a concrete algorithm
    pub fn register_algorithm<A: Algorithm>(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.register(name, RegressorFactory::of::<A>())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [RegistryEntry] {
        &mut self.entries
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Remove an entry, transferring ownership of its model to the caller
    pub fn take(&mut self, name: &str) -> Option<RegistryEntry> {
        let position = self.entries.iter().position(|e| e.name == name)?;
        Some(self.entries.remove(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_order() {
        let registry = ModelRegistry::standard(42);
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "Linear Regression",
                "KNN",
                "Decision Tree",
                "Random Forest",
                "XGBRegressor",
                "CatBoostRegressor",
                "AdaBoostRegressor",
                "Gradient Boost",
            ]
        );
        for (entry, (_, key)) in registry.entries().iter().zip(STANDARD_MODELS) {
            assert_eq!(entry.algorithm(), key);
            assert!(!entry.model().is_fitted());
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut registry = ModelRegistry::new(0);
        registry.register_algorithm::<LinearRegression>("OLS").unwrap();
        let err = registry.register_algorithm::<DecisionTree>("OLS").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_factory_lookup() {
        assert_eq!(factory_for("catboost").map(|f| f.algorithm()), Some("catboost"));
        assert!(factory_for("lightgbm").is_none());
    }

    #[test]
    fn test_take_transfers_entry() {
        let mut registry = ModelRegistry::standard(1);
        let entry = registry.take("KNN").unwrap();
        assert_eq!(entry.algorithm(), "knn");
        assert_eq!(registry.len(), 7);
        assert!(!registry.contains("KNN"));
    }
}
