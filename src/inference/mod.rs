//! Inference engine module
//!
//! Loads the persisted feature transformer and selected model, then predicts
//! math scores for single records or whole tables. Large tables are split
//! into batches that can run on the rayon pool.

mod config;
mod engine;

pub use config::InferenceConfig;
pub use engine::InferenceEngine;
