//! Data preprocessing module
//!
//! Turns the raw student table into a fixed-width numeric matrix:
//! - Missing value imputation (median, most frequent)
//! - One-hot encoding against a frozen, sorted vocabulary
//! - Standard scaling, with or without centering
//!
//! [`FeatureTransformer`] composes the three and is the only type the rest of
//! the crate touches.

mod config;
mod encoder;
mod imputer;
mod scaler;
mod transformer;

pub use config::TransformerConfig;
pub use encoder::OneHotEncoder;
pub use imputer::{ImputeStrategy, Imputer};
pub use scaler::StandardScaler;
pub use transformer::FeatureTransformer;

use crate::error::TransformError;
use polars::prelude::*;

/// Fetch a column coerced to `Float64`; values that cannot parse are an error
pub(crate) fn numeric_column(df: &DataFrame, name: &str) -> Result<Float64Chunked, TransformError> {
    let column = df
        .column(name)
        .map_err(|_| TransformError::MissingColumn(name.to_string()))?;

    let series = column
        .as_materialized_series()
        .strict_cast(&DataType::Float64)
        .map_err(|e| TransformError::InvalidColumn {
            column: name.to_string(),
            reason: format!("expected numeric values ({})", e),
        })?;

    series.f64().cloned().map_err(|e| TransformError::InvalidColumn {
        column: name.to_string(),
        reason: e.to_string(),
    })
}

/// Fetch a column coerced to `String`
pub(crate) fn categorical_column(df: &DataFrame, name: &str) -> Result<StringChunked, TransformError> {
    let column = df
        .column(name)
        .map_err(|_| TransformError::MissingColumn(name.to_string()))?;

    let series = column
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(|e| TransformError::InvalidColumn {
            column: name.to_string(),
            reason: format!("expected categorical values ({})", e),
        })?;

    series.str().cloned().map_err(|e| TransformError::InvalidColumn {
        column: name.to_string(),
        reason: e.to_string(),
    })
}
