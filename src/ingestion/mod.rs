//! Data acquisition
//!
//! A [`DataSource`] turns a query string into a tabular dataset. The training
//! orchestrator does not care whether rows come from a relational store, a
//! CSV file or memory.

pub mod schema;
pub mod split;
#[cfg(feature = "mysql")]
pub mod mysql;

pub use schema::{StudentRecord, CATEGORICAL_FEATURES, COLUMNS, NUMERIC_FEATURES, TARGET};
pub use split::{train_test_split, TrainTestSplit};
#[cfg(feature = "mysql")]
pub use mysql::MySqlSource;

use crate::error::Result;
use crate::utils::DataLoader;
use polars::prelude::*;
use std::path::PathBuf;
use tracing::info;

/// Source of raw tabular records
pub trait DataSource {
    /// Run `query` and return the resulting table
    fn load(&self, query: &str) -> Result<DataFrame>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

/// Reads the dataset from a CSV file; the query is ignored
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    loader: DataLoader,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loader: DataLoader::new(),
        }
    }
}

impl DataSource for CsvSource {
    fn load(&self, _query: &str) -> Result<DataFrame> {
        let df = self.loader.load_csv(&self.path)?;
        info!(path = %self.path.display(), rows = df.height(), "Loaded CSV dataset");
        Ok(df)
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

/// Serves a pre-built frame
#[derive(Debug, Clone)]
pub struct MemorySource {
    df: DataFrame,
}

impl MemorySource {
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }
}

impl DataSource for MemorySource {
    fn load(&self, _query: &str) -> Result<DataFrame> {
        Ok(self.df.clone())
    }

    fn describe(&self) -> String {
        format!("memory:{} rows", self.df.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    #[test]
    fn test_memory_source_returns_frame() {
        let df = df!("gender" => &["female", "male"]).unwrap();
        let source = MemorySource::new(df);
        let loaded = source.load("SELECT * FROM stud").unwrap();
        assert_eq!(loaded.height(), 2);
        assert!(source.describe().starts_with("memory"));
    }

    #[test]
    fn test_csv_source_missing_file() {
        let source = CsvSource::new("/no/such/dir/data.csv");
        assert!(matches!(source.load(""), Err(PipelineError::DataAccess { .. })));
    }
}
