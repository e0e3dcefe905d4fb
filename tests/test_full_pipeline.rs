//! End-to-end tests: acquisition, split, transform, selection, persistence, inference

mod common;

use ndarray::{Array1, Array2};
use score_predictor::error::{ModelError, PipelineError, TransformError};
use score_predictor::export::ArtifactStore;
use score_predictor::inference::InferenceEngine;
use score_predictor::ingestion::{CsvSource, MemorySource, StudentRecord};
use score_predictor::pipeline::{PipelineConfig, TrainingPipeline};
use score_predictor::training::{
    r2_score, Algorithm, DecisionTree, FailurePolicy, KNNRegressor, LinearRegression, ModelRegistry, Regressor,
};
use serde::{Deserialize, Serialize};
use score_predictor::utils::{DataLoader, DataSaver};
use tempfile::tempdir;

/// Fits, then predicts NaN for every row
#[derive(Debug, Default, Serialize, Deserialize)]
struct NanModel {
    fitted: bool,
}

impl Regressor for NanModel {
    fn fit(&mut self, _x: &Array2<f64>, _y: &Array1<f64>) -> Result<(), ModelError> {
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        Ok(Array1::from_elem(x.nrows(), f64::NAN))
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }
}

impl Algorithm for NanModel {
    const KEY: &'static str = "nan_model";

    fn with_seed(_seed: u64) -> Self {
        Self::default()
    }
}

fn small_registry(seed: u64) -> ModelRegistry {
    let mut registry = ModelRegistry::new(seed);
    registry.register_algorithm::<LinearRegression>("Linear Regression").unwrap();
    registry.register_algorithm::<KNNRegressor>("KNN").unwrap();
    registry.register_algorithm::<DecisionTree>("Decision Tree").unwrap();
    registry
}

#[test]
fn test_pipeline_commits_all_artifacts() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig::default().with_artifact_dir(dir.path());
    let df = common::student_table(150, 5);

    let outcome = TrainingPipeline::new(config, MemorySource::new(df))
        .with_registry(small_registry(42))
        .run()
        .unwrap();

    assert!(outcome.score >= 0.6);
    assert_eq!(outcome.report.len(), 3);
    assert_eq!(
        common::dir_entries(dir.path()),
        vec!["data.csv", "model.json", "preprocessor.json", "test.csv", "train.csv"]
    );

    let loader = DataLoader::new();
    let train = loader.load_csv(&outcome.paths.train).unwrap();
    let test = loader.load_csv(&outcome.paths.test).unwrap();
    assert_eq!(train.height(), 120);
    assert_eq!(test.height(), 30);
    assert_eq!(loader.load_csv(&outcome.paths.data).unwrap().height(), 150);
}

#[test]
fn test_reloaded_artifacts_reproduce_score() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig::default().with_artifact_dir(dir.path());
    let outcome = TrainingPipeline::new(config, MemorySource::new(common::student_table(150, 9)))
        .with_registry(small_registry(42))
        .run()
        .unwrap();

    let engine = InferenceEngine::load(dir.path()).unwrap();
    assert_eq!(engine.model_name(), outcome.model_name);

    let test = DataLoader::new().load_csv(&outcome.paths.test).unwrap();
    let predictions = engine.predict_frame(&test).unwrap();
    let actual = engine.transformer().target(&test).unwrap();
    // Reloaded floats are bit-identical, so the held-out score is too
    assert_eq!(r2_score(&actual, &predictions), outcome.score);

    let stored = ArtifactStore::new(dir.path()).load_model().unwrap();
    assert_eq!(stored.name, outcome.model_name);
    assert_eq!(stored.report, outcome.report);
}

#[test]
fn test_predict_single_record_after_training() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig::default().with_artifact_dir(dir.path());
    TrainingPipeline::new(config, MemorySource::new(common::student_table(150, 2)))
        .with_registry(small_registry(1))
        .run()
        .unwrap();

    let engine = InferenceEngine::load(dir.path()).unwrap();
    let record = StudentRecord {
        gender: "female".to_string(),
        race_ethnicity: "group C".to_string(),
        parental_level_of_education: "bachelor's degree".to_string(),
        lunch: "standard".to_string(),
        test_preparation_course: "completed".to_string(),
        reading_score: 80.0,
        writing_score: 82.0,
    };
    let predicted = engine.predict_record(&record).unwrap();
    assert!(predicted.is_finite());
    assert!((50.0..=100.0).contains(&predicted), "predicted {}", predicted);

    // Unseen category still predicts
    let unseen = StudentRecord {
        race_ethnicity: "group Z".to_string(),
        ..record
    };
    assert!(engine.predict_record(&unseen).unwrap().is_finite());
}

#[test]
fn test_failed_run_leaves_no_partial_files() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig::default()
        .with_artifact_dir(dir.path())
        .with_threshold(1.1);

    let err = TrainingPipeline::new(config, MemorySource::new(common::student_table(100, 4)))
        .with_registry(small_registry(0))
        .run()
        .unwrap_err();

    assert!(matches!(err, PipelineError::NoAcceptableModel { best: Some(_), .. }));
    assert!(common::dir_entries(dir.path()).is_empty());
}

#[test]
fn test_failed_run_keeps_previous_artifacts() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig::default().with_artifact_dir(dir.path());
    TrainingPipeline::new(config.clone(), MemorySource::new(common::student_table(100, 4)))
        .with_registry(small_registry(0))
        .run()
        .unwrap();
    let model_before = std::fs::read(dir.path().join("model.json")).unwrap();
    let train_before = std::fs::read(dir.path().join("train.csv")).unwrap();

    let failing = config.with_threshold(1.1).with_seeds(7, 7);
    assert!(TrainingPipeline::new(failing, MemorySource::new(common::student_table(100, 8)))
        .with_registry(small_registry(0))
        .run()
        .is_err());

    assert_eq!(std::fs::read(dir.path().join("model.json")).unwrap(), model_before);
    assert_eq!(std::fs::read(dir.path().join("train.csv")).unwrap(), train_before);
    assert_eq!(common::dir_entries(dir.path()).len(), 5);
}

#[test]
fn test_missing_column_is_rejected_before_writing() {
    let dir = tempdir().unwrap();
    let df = common::student_table(50, 1).drop("lunch").unwrap();
    let config = PipelineConfig::default().with_artifact_dir(dir.path().join("out"));

    let err = TrainingPipeline::new(config, MemorySource::new(df)).run().unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Transform(TransformError::MissingColumn(c)) if c == "lunch"
    ));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_csv_source_feeds_pipeline() {
    let dir = tempdir().unwrap();
    let csv_path = dir.path().join("stud.csv");
    let file = std::fs::File::create(&csv_path).unwrap();
    DataSaver::write_csv(&common::student_table(120, 6), file).unwrap();

    let config = PipelineConfig::default().with_artifact_dir(dir.path().join("artifact"));
    let outcome = TrainingPipeline::new(config, CsvSource::new(&csv_path))
        .with_registry(small_registry(42))
        .run()
        .unwrap();
    assert!(outcome.paths.model.exists());
}

#[test]
fn test_missing_csv_is_data_access_error() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig::default().with_artifact_dir(dir.path());
    let err = TrainingPipeline::new(config, CsvSource::new(dir.path().join("absent.csv")))
        .run()
        .unwrap_err();
    assert!(matches!(err, PipelineError::DataAccess { .. }));
}

#[test]
fn test_artifacts_reload_after_nan_candidate() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig::default()
        .with_artifact_dir(dir.path())
        .with_failure_policy(FailurePolicy::Continue);

    let mut registry = ModelRegistry::new(0);
    registry.register_algorithm::<NanModel>("NaN").unwrap();
    registry.register_algorithm::<LinearRegression>("Linear Regression").unwrap();

    let outcome = TrainingPipeline::new(config, MemorySource::new(common::student_table(120, 3)))
        .with_registry(registry)
        .run()
        .unwrap();
    assert_eq!(outcome.model_name, "Linear Regression");
    assert_eq!(outcome.report.failures().len(), 1);
    assert_eq!(outcome.report.failures()[0].name, "NaN");

    let engine = InferenceEngine::load(dir.path()).unwrap();
    assert_eq!(engine.model_name(), "Linear Regression");
    assert_eq!(ArtifactStore::new(dir.path()).load_model().unwrap().report, outcome.report);
}

#[test]
fn test_nan_candidate_aborts_by_default() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig::default().with_artifact_dir(dir.path());

    let mut registry = ModelRegistry::new(0);
    registry.register_algorithm::<LinearRegression>("Linear Regression").unwrap();
    registry.register_algorithm::<NanModel>("NaN").unwrap();

    let err = TrainingPipeline::new(config, MemorySource::new(common::student_table(120, 3)))
        .with_registry(registry)
        .run()
        .unwrap_err();
    assert!(matches!(err, PipelineError::ModelFit { model, .. } if model == "NaN"));
    assert!(common::dir_entries(dir.path()).is_empty());
}

#[test]
fn test_form_cased_record_predicts_like_lowercase() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig::default().with_artifact_dir(dir.path());
    TrainingPipeline::new(config, MemorySource::new(common::student_table(150, 2)))
        .with_registry(small_registry(1))
        .run()
        .unwrap();
    let engine = InferenceEngine::load(dir.path()).unwrap();

    let lowercase = StudentRecord {
        gender: "male".to_string(),
        race_ethnicity: "group D".to_string(),
        parental_level_of_education: "master's degree".to_string(),
        lunch: "free/reduced".to_string(),
        test_preparation_course: "none".to_string(),
        reading_score: 64.0,
        writing_score: 61.0,
    };
    let form_cased = StudentRecord {
        gender: "Male".to_string(),
        parental_level_of_education: "Master's Degree".to_string(),
        lunch: "Free/Reduced".to_string(),
        ..lowercase.clone()
    };

    assert!(!engine.transformer().is_known_category("gender", "Male"));
    assert!(lowercase
        .categories()
        .iter()
        .all(|(column, value)| engine.transformer().is_known_category(column, value)));
    assert_eq!(
        engine.predict_record(&form_cased.normalized()).unwrap(),
        engine.predict_record(&lowercase).unwrap()
    );
}
