//! Staged, all-or-nothing artifact writes

use super::ModelArtifact;
use crate::error::{PipelineError, Result};
use crate::preprocessing::FeatureTransformer;
use crate::utils::DataSaver;
use polars::prelude::DataFrame;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};

pub const DATA_FILE: &str = "data.csv";
pub const TRAIN_FILE: &str = "train.csv";
pub const TEST_FILE: &str = "test.csv";
pub const PREPROCESSOR_FILE: &str = "preprocessor.json";
pub const MODEL_FILE: &str = "model.json";

/// Commit order; the model goes last so a readable model implies the rest
const COMMIT_ORDER: [&str; 5] = [DATA_FILE, TRAIN_FILE, TEST_FILE, PREPROCESSOR_FILE, MODEL_FILE];

/// Final locations of committed artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub data: PathBuf,
    pub train: PathBuf,
    pub test: PathBuf,
    pub preprocessor: PathBuf,
    pub model: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            data: dir.join(DATA_FILE),
            train: dir.join(TRAIN_FILE),
            test: dir.join(TEST_FILE),
            preprocessor: dir.join(PREPROCESSOR_FILE),
            model: dir.join(MODEL_FILE),
            dir,
        }
    }
}

/// Artifact directory: where runs stage and commit their files
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    paths: ArtifactPaths,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            paths: ArtifactPaths::new(dir),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.paths.dir
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Open a staging area inside the artifact directory
    pub fn begin(&self) -> Result<StagedArtifacts> {
        fs::create_dir_all(&self.paths.dir).map_err(|e| PipelineError::persistence(&self.paths.dir, e))?;
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.paths.dir)
            .map_err(|e| PipelineError::persistence(&self.paths.dir, e))?;
        debug!(staging = %staging.path().display(), "Opened artifact staging directory");

        Ok(StagedArtifacts {
            staging,
            paths: self.paths.clone(),
            staged: Vec::new(),
        })
    }

    pub fn load_transformer(&self) -> Result<FeatureTransformer> {
        read_json(&self.paths.preprocessor)
    }

    pub fn load_model(&self) -> Result<ModelArtifact> {
        read_json(&self.paths.model)
    }
}

/// Files written during one run; dropped without [`commit`](Self::commit)
/// the staging directory and everything in it is removed.
#[derive(Debug)]
pub struct StagedArtifacts {
    staging: TempDir,
    paths: ArtifactPaths,
    staged: Vec<&'static str>,
}

impl StagedArtifacts {
    pub fn write_csv(&mut self, name: &'static str, df: &DataFrame) -> Result<()> {
        self.write_with(name, |writer| {
            DataSaver::write_csv(df, writer).map_err(|e| e.to_string())
        })
    }

    pub fn write_json<T: Serialize>(&mut self, name: &'static str, value: &T) -> Result<()> {
        self.write_with(name, |writer| {
            serde_json::to_writer_pretty(writer, value).map_err(|e| e.to_string())
        })
    }

    /// Temp file in the staging directory, renamed over `name` once complete
    fn write_with<F>(&mut self, name: &'static str, write: F) -> Result<()>
    where
        F: FnOnce(&mut BufWriter<&File>) -> std::result::Result<(), String>,
    {
        let target = self.staging.path().join(name);
        let tmp = NamedTempFile::new_in(self.staging.path()).map_err(|e| PipelineError::persistence(&target, e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            write(&mut writer).map_err(|e| PipelineError::persistence(&target, e))?;
            writer.flush().map_err(|e| PipelineError::persistence(&target, e))?;
        }
        tmp.as_file().sync_all().map_err(|e| PipelineError::persistence(&target, e))?;
        tmp.persist(&target).map_err(|e| PipelineError::persistence(&target, e.error))?;

        if !self.staged.contains(&name) {
            self.staged.push(name);
        }
        debug!(file = name, "Staged artifact");
        Ok(())
    }

    pub fn staged(&self) -> &[&'static str] {
        &self.staged
    }

    /// Move every staged file into the artifact directory, model last
    pub fn commit(self) -> Result<ArtifactPaths> {
        for name in COMMIT_ORDER.iter().filter(|n| self.staged.contains(*n)) {
            let from = self.staging.path().join(name);
            let to = self.paths.dir.join(name);
            fs::rename(&from, &to).map_err(|e| PipelineError::persistence(&to, e))?;
        }
        info!(dir = %self.paths.dir.display(), files = self.staged.len(), "Committed artifacts");
        Ok(self.paths)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| PipelineError::persistence(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| PipelineError::persistence(path, e))
}
