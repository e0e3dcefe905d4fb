//! End-to-end training run

use super::PipelineConfig;
use crate::error::Result;
use crate::export::{
    ArtifactPaths, ArtifactStore, ModelArtifact, DATA_FILE, MODEL_FILE, PREPROCESSOR_FILE, TEST_FILE, TRAIN_FILE,
};
use crate::ingestion::{schema, train_test_split, DataSource};
use crate::preprocessing::FeatureTransformer;
use crate::training::{select, ModelEvaluator, ModelRegistry, ScoreReport};
use crate::utils::Timer;
use tracing::info;

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model_name: String,
    pub algorithm: String,
    /// Held-out R² of the selected model
    pub score: f64,
    pub report: ScoreReport,
    pub paths: ArtifactPaths,
}

/// Acquire, split, transform, evaluate, select and persist
pub struct TrainingPipeline {
    config: PipelineConfig,
    source: Box<dyn DataSource>,
    registry: Option<ModelRegistry>,
}

impl std::fmt::Debug for TrainingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainingPipeline")
            .field("config", &self.config)
            .field("source", &self.source.describe())
            .finish()
    }
}

impl TrainingPipeline {
    pub fn new(config: PipelineConfig, source: impl DataSource + 'static) -> Self {
        Self {
            config,
            source: Box::new(source),
            registry: None,
        }
    }

    /// Replace the standard candidates
    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage; artifacts are committed only if all of them succeed
    pub fn run(self) -> Result<TrainingOutcome> {
        let Self {
            config,
            source,
            registry,
        } = self;
        config.validate()?;
        let timer = Timer::start();

        info!(source = %source.describe(), "Acquiring dataset");
        let df = source.load(&config.query)?;
        schema::validate_columns(&df)?;

        let store = ArtifactStore::new(&config.artifact_dir);
        let mut staged = store.begin()?;
        staged.write_csv(DATA_FILE, &df)?;

        let split = train_test_split(&df, config.test_size, config.split_seed)?;
        staged.write_csv(TRAIN_FILE, &split.train)?;
        staged.write_csv(TEST_FILE, &split.test)?;
        info!(train_rows = split.train.height(), test_rows = split.test.height(), "Split dataset");

        let mut transformer = FeatureTransformer::default();
        let (train_x, train_y) = transformer.fit_transform(&split.train)?;
        let test_x = transformer.transform(&split.test)?;
        let test_y = transformer.target(&split.test)?;
        staged.write_json(PREPROCESSOR_FILE, &transformer)?;

        let mut registry = registry.unwrap_or_else(|| ModelRegistry::standard(config.model_seed));
        let report = ModelEvaluator::new(config.evaluation_options()).evaluate(
            &train_x,
            &train_y,
            &test_x,
            &test_y,
            &mut registry,
        )?;
        let selected = select(&report, &mut registry, config.threshold)?;

        let artifact = ModelArtifact::from_selected(&selected, &report)?;
        staged.write_json(MODEL_FILE, &artifact)?;
        let paths = staged.commit()?;

        info!(
            model = %selected.name,
            r2 = selected.score,
            elapsed_secs = timer.elapsed_secs(),
            "Training pipeline finished"
        );
        Ok(TrainingOutcome {
            model_name: selected.name,
            algorithm: selected.algorithm.to_string(),
            score: selected.score,
            report,
            paths,
        })
    }
}

/// Train from the MySQL source configured by `SCORE_*` environment variables
/// and return the selected model's held-out R².
#[cfg(feature = "mysql")]
pub fn run_training_pipeline() -> Result<f64> {
    let config = PipelineConfig::from_env()?;
    let source = crate::ingestion::MySqlSource::new(config.database.clone());
    TrainingPipeline::new(config, source).run().map(|outcome| outcome.score)
}
