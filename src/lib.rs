//! Score Predictor - student math-score regression pipeline
//!
//! Ingests student-performance records, turns them into numeric feature
//! matrices, trains a fixed set of candidate regressors and keeps the best
//! one by held-out R².
//!
//! # Modules
//!
//! - [`ingestion`] - Data sources (MySQL, CSV, memory), schema and splitting
//! - [`preprocessing`] - Imputation, scaling, one-hot encoding
//! - [`training`] - Regressors, model registry, evaluation and selection
//! - [`export`] - Staged artifact persistence
//! - [`pipeline`] - Configuration and the training orchestrator
//! - [`inference`] - Predictions from persisted artifacts
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data
pub mod ingestion;
pub mod preprocessing;

// Models
pub mod training;

// Runs and artifacts
pub mod export;
pub mod inference;
pub mod pipeline;

// Interfaces and helpers
pub mod cli;
pub mod utils;

pub use error::{PipelineError, Result};
#[cfg(feature = "mysql")]
pub use pipeline::run_training_pipeline;

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{ModelError, PipelineError, Result, TransformError};

    // Data acquisition
    pub use crate::ingestion::{train_test_split, CsvSource, DataSource, MemorySource, StudentRecord};
    #[cfg(feature = "mysql")]
    pub use crate::ingestion::MySqlSource;

    // Preprocessing
    pub use crate::preprocessing::{FeatureTransformer, TransformerConfig};

    // Training
    pub use crate::training::{
        select, Algorithm, EvaluationMode, EvaluationOptions, FailurePolicy, ModelEvaluator, ModelRegistry,
        Regressor, RegressorFactory, ScoreReport, SelectedModel,
    };

    // Persistence, orchestration and inference
    pub use crate::export::{ArtifactStore, ModelArtifact};
    pub use crate::inference::{InferenceConfig, InferenceEngine};
    pub use crate::pipeline::{DatabaseConfig, PipelineConfig, TrainingOutcome, TrainingPipeline};
}
