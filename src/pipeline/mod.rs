//! Training orchestration
//!
//! [`TrainingPipeline`] wires a [`DataSource`](crate::ingestion::DataSource)
//! through splitting, feature transformation, model evaluation and selection,
//! then commits the artifacts.

mod config;
mod orchestrator;

pub use config::{DatabaseConfig, PipelineConfig};
#[cfg(feature = "mysql")]
pub use orchestrator::run_training_pipeline;
pub use orchestrator::{TrainingOutcome, TrainingPipeline};
