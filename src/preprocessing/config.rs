//! Feature transformer configuration

use crate::ingestion::schema::{CATEGORICAL_FEATURES, NUMERIC_FEATURES, TARGET};
use serde::{Deserialize, Serialize};

/// Which columns the transformer reads, and in what order they are emitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformerConfig {
    /// Numeric columns: median imputation, then standard scaling
    pub numeric_columns: Vec<String>,

    /// Categorical columns: most-frequent imputation, one-hot, then scaling without centering
    pub categorical_columns: Vec<String>,

    /// Target column isolated by `fit_transform` and `target`
    pub target_column: String,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            numeric_columns: NUMERIC_FEATURES.iter().map(|s| s.to_string()).collect(),
            categorical_columns: CATEGORICAL_FEATURES.iter().map(|s| s.to_string()).collect(),
            target_column: TARGET.to_string(),
        }
    }
}

impl TransformerConfig {
    /// Create a configuration for the student-performance schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set numeric columns
    pub fn with_numeric_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.numeric_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set categorical columns
    pub fn with_categorical_columns<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.categorical_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the target column
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_column = target.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema() {
        let config = TransformerConfig::default();
        assert_eq!(config.numeric_columns, vec!["writing_score", "reading_score"]);
        assert_eq!(config.categorical_columns.len(), 5);
        assert_eq!(config.target_column, "math_score");
    }

    #[test]
    fn test_builder() {
        let config = TransformerConfig::new()
            .with_numeric_columns(["a"])
            .with_categorical_columns(Vec::<String>::new())
            .with_target("y");
        assert_eq!(config.numeric_columns, vec!["a"]);
        assert!(config.categorical_columns.is_empty());
        assert_eq!(config.target_column, "y");
    }
}
