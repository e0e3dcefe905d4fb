//! Artifact persistence
//!
//! A run writes `data.csv`, `train.csv`, `test.csv`, `preprocessor.json` and
//! `model.json` into a staging directory and moves them into the artifact
//! directory only once every stage has succeeded.

mod artifact;
mod store;

pub use artifact::ModelArtifact;
pub use store::{
    ArtifactPaths, ArtifactStore, StagedArtifacts, DATA_FILE, MODEL_FILE, PREPROCESSOR_FILE, TEST_FILE,
    TRAIN_FILE,
};
