//! Error types for the score prediction pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Boxed cause carried by boundary errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Data access error: {context}")]
    DataAccess {
        context: String,
        #[source]
        source: BoxError,
    },

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Model '{model}' failed: {source}")]
    ModelFit {
        model: String,
        #[source]
        source: ModelError,
    },

    #[error("{}", no_acceptable_message(.best, .threshold))]
    NoAcceptableModel {
        /// Best (name, score) pair seen, if any model was scored at all
        best: Option<(String, f64)>,
        threshold: f64,
    },

    #[error("Persistence error at {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

fn no_acceptable_message(best: &Option<(String, f64)>, threshold: &f64) -> String {
    match best {
        Some((name, score)) => format!(
            "No acceptable model found: best was '{}' with R² {:.4}, below threshold {}",
            name, score, threshold
        ),
        None => format!("No acceptable model found: no model was scored (threshold {})", threshold),
    }
}

impl PipelineError {
    /// Wrap a data acquisition failure
    pub fn data_access(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        PipelineError::DataAccess {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Wrap an artifact read/write failure
    pub fn persistence(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        PipelineError::Persistence {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Attribute an algorithm failure to a registry entry
    pub fn model_fit(model: impl Into<String>, source: ModelError) -> Self {
        PipelineError::ModelFit {
            model: model.into(),
            source,
        }
    }
}

/// Feature transformer failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("column '{0}' not found in input table")]
    MissingColumn(String),

    #[error("column '{column}' cannot be used: {reason}")]
    InvalidColumn { column: String, reason: String },

    #[error("target column '{column}' has {nulls} missing value(s)")]
    MissingTarget { column: String, nulls: usize },

    #[error("transformer must be fitted before transform")]
    NotFitted,

    #[error("cannot fit transformer on an empty table")]
    EmptyTable,
}

/// Failures raised by individual regression algorithms
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Model not fitted")]
    NotFitted,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

/// Shared precondition for `fit(x, y)` across algorithms
pub(crate) fn check_fit_input(
    x: &ndarray::Array2<f64>,
    y: &ndarray::Array1<f64>,
) -> std::result::Result<(), ModelError> {
    if x.nrows() != y.len() {
        return Err(ModelError::ShapeMismatch {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(ModelError::InvalidInput("empty training set".to_string()));
    }
    Ok(())
}

/// Shared precondition for `predict(x)` on a fitted model
pub(crate) fn check_predict_width(
    x: &ndarray::Array2<f64>,
    n_features: usize,
) -> std::result::Result<(), ModelError> {
    if x.ncols() != n_features {
        return Err(ModelError::ShapeMismatch {
            expected: format!("{} features", n_features),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::Config("bad threshold".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad threshold");
    }

    #[test]
    fn test_transform_error_converts() {
        let err: PipelineError = TransformError::MissingColumn("lunch".to_string()).into();
        assert!(matches!(err, PipelineError::Transform(TransformError::MissingColumn(_))));
        assert!(err.to_string().contains("lunch"));
    }

    #[test]
    fn test_no_acceptable_message() {
        let err = PipelineError::NoAcceptableModel {
            best: Some(("KNN".to_string(), 0.59)),
            threshold: 0.6,
        };
        assert!(err.to_string().contains("KNN"));

        let empty = PipelineError::NoAcceptableModel { best: None, threshold: 0.6 };
        assert!(empty.to_string().contains("no model was scored"));
    }

    #[test]
    fn test_model_fit_keeps_source() {
        use std::error::Error as _;
        let err = PipelineError::model_fit("Decision Tree", ModelError::NotFitted);
        assert!(err.to_string().contains("Decision Tree"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_check_fit_input() {
        let x = ndarray::Array2::<f64>::zeros((3, 2));
        let y = ndarray::Array1::<f64>::zeros(2);
        assert!(matches!(check_fit_input(&x, &y), Err(ModelError::ShapeMismatch { .. })));
    }
}
