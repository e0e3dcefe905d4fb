//! Predict math scores with a persisted transformer and model

use super::InferenceConfig;
use crate::error::{PipelineError, Result};
use crate::export::{ArtifactStore, ModelArtifact};
use crate::ingestion::StudentRecord;
use crate::preprocessing::FeatureTransformer;
use crate::training::Regressor;
use ndarray::{concatenate, Array1, Array2, Axis};
use polars::prelude::DataFrame;
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Loaded transformer plus fitted winner
pub struct InferenceEngine {
    config: InferenceConfig,
    transformer: FeatureTransformer,
    model: Box<dyn Regressor>,
    model_name: String,
    algorithm: String,
    score: f64,
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("config", &self.config)
            .field("model_name", &self.model_name)
            .field("algorithm", &self.algorithm)
            .field("score", &self.score)
            .finish()
    }
}

impl InferenceEngine {
    /// Assemble from in-memory parts
    pub fn new(
        config: InferenceConfig,
        transformer: FeatureTransformer,
        artifact: &ModelArtifact,
    ) -> Result<Self> {
        if !transformer.is_fitted() {
            return Err(crate::error::TransformError::NotFitted.into());
        }
        let model = artifact.restore()?;
        Ok(Self {
            config,
            transformer,
            model,
            model_name: artifact.name.clone(),
            algorithm: artifact.algorithm.clone(),
            score: artifact.score,
        })
    }

    /// Load `preprocessor.json` and `model.json` from an artifact directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_config(dir, InferenceConfig::default())
    }

    pub fn load_with_config(dir: impl AsRef<Path>, config: InferenceConfig) -> Result<Self> {
        let store = ArtifactStore::new(dir.as_ref());
        let transformer = store.load_transformer()?;
        let artifact = store.load_model()?;
        let engine = Self::new(config, transformer, &artifact)?;

        info!(
            dir = %dir.as_ref().display(),
            model = %engine.model_name,
            r2 = engine.score,
            "Loaded inference artifacts"
        );
        Ok(engine)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Held-out R² recorded at training time
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn transformer(&self) -> &FeatureTransformer {
        &self.transformer
    }

    /// Predict the math score of one student
    pub fn predict_record(&self, record: &StudentRecord) -> Result<f64> {
        if self.config.validate_records {
            record.validate()?;
        }
        for (column, value) in record.categories() {
            if !self.transformer.is_known_category(column, value) {
                warn!(column, value, "Category not seen during training, encoded as all zeros");
            }
        }
        let predictions = self.predict_frame(&record.to_frame()?)?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| PipelineError::InvalidInput("model returned no prediction".to_string()))
    }

    /// Predict one value per row of a table with the feature columns
    pub fn predict_frame(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let x = self.transformer.transform(df)?;
        self.predict_array(&x)
    }

    /// Predict on an already transformed matrix
    pub fn predict_array(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let batch_size = self.config.batch_size.max(1);
        if x.nrows() <= batch_size {
            return self.predict_chunk(x);
        }

        let chunks: Vec<Array2<f64>> = x
            .axis_chunks_iter(Axis(0), batch_size)
            .map(|chunk| chunk.to_owned())
            .collect();
        debug!(rows = x.nrows(), chunks = chunks.len(), "Predicting in batches");

        let parts = if self.config.parallel {
            chunks
                .par_iter()
                .map(|chunk| self.predict_chunk(chunk))
                .collect::<Result<Vec<_>>>()?
        } else {
            chunks
                .iter()
                .map(|chunk| self.predict_chunk(chunk))
                .collect::<Result<Vec<_>>>()?
        };

        let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
        concatenate(Axis(0), &views).map_err(|e| PipelineError::InvalidInput(e.to_string()))
    }

    fn predict_chunk(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.model
            .predict(x)
            .map_err(|e| PipelineError::model_fit(self.model_name.clone(), e))
    }
}
