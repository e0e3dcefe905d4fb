//! Pipeline configuration

use crate::error::{PipelineError, Result};
use crate::training::{EvaluationMode, EvaluationOptions, FailurePolicy, DEFAULT_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Connection parameters for the MySQL data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Seconds to wait for a pooled connection
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "mlproject1".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

/// Everything one training run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub database: DatabaseConfig,
    /// Query handed to the data source
    pub query: String,
    /// Where the five artifacts are committed
    pub artifact_dir: PathBuf,
    /// Fraction of rows held out; the test split gets `ceil(test_size * n)` rows
    pub test_size: f64,
    pub split_seed: u64,
    /// Seed for every stochastic model
    pub model_seed: u64,
    /// Minimum held-out R² of an acceptable winner
    pub threshold: f64,
    pub failure_policy: FailurePolicy,
    pub evaluation_mode: EvaluationMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            query: "SELECT * FROM stud".to_string(),
            artifact_dir: PathBuf::from("artifact"),
            test_size: 0.2,
            split_seed: 42,
            model_seed: 42,
            threshold: DEFAULT_THRESHOLD,
            failure_policy: FailurePolicy::Abort,
            evaluation_mode: EvaluationMode::Sequential,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a TOML file; absent keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| PipelineError::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `SCORE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SCORE_DB_HOST") {
            self.database.host = host;
        }
        if let Some(port) = lookup("SCORE_DB_PORT") {
            self.database.port = parse_var("SCORE_DB_PORT", &port)?;
        }
        if let Some(user) = lookup("SCORE_DB_USER") {
            self.database.user = user;
        }
        if let Some(password) = lookup("SCORE_DB_PASSWORD") {
            self.database.password = password;
        }
        if let Some(name) = lookup("SCORE_DB_NAME") {
            self.database.database = name;
        }
        if let Some(query) = lookup("SCORE_QUERY") {
            self.query = query;
        }
        if let Some(dir) = lookup("SCORE_ARTIFACT_DIR") {
            self.artifact_dir = PathBuf::from(dir);
        }
        if let Some(threshold) = lookup("SCORE_THRESHOLD") {
            self.threshold = parse_var("SCORE_THRESHOLD", &threshold)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_seeds(mut self, split_seed: u64, model_seed: u64) -> Self {
        self.split_seed = split_seed;
        self.model_seed = model_seed;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_evaluation_mode(mut self, mode: EvaluationMode) -> Self {
        self.evaluation_mode = mode;
        self
    }

    pub fn evaluation_options(&self) -> EvaluationOptions {
        EvaluationOptions::default()
            .with_policy(self.failure_policy)
            .with_mode(self.evaluation_mode)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::Config(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if !self.threshold.is_finite() {
            return Err(PipelineError::Config(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        if self.query.trim().is_empty() {
            return Err(PipelineError::Config("query must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| PipelineError::Config(format!("{}={:?}: {}", key, value, e)))
}
