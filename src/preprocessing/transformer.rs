//! Fitted feature transformer: raw table to numeric matrix

use super::{numeric_column, ImputeStrategy, Imputer, OneHotEncoder, StandardScaler, TransformerConfig};
use crate::error::TransformError;
use ndarray::{concatenate, Array1, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

type Result<T> = std::result::Result<T, TransformError>;

/// Fit-once, apply-many encoding of the student table.
///
/// Output columns are the scaled numeric columns followed by one scaled
/// indicator block per categorical column, both in configuration order.
/// Width and order are frozen by `fit_transform`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureTransformer {
    config: TransformerConfig,
    numeric_imputer: Imputer,
    numeric_scaler: StandardScaler,
    categorical_imputer: Imputer,
    encoder: OneHotEncoder,
    categorical_scaler: StandardScaler,
    feature_names: Vec<String>,
    is_fitted: bool,
}

impl Default for FeatureTransformer {
    fn default() -> Self {
        Self::new(TransformerConfig::default())
    }
}

impl FeatureTransformer {
    pub fn new(config: TransformerConfig) -> Self {
        Self {
            config,
            numeric_imputer: Imputer::new(ImputeStrategy::Median),
            numeric_scaler: StandardScaler::new(true),
            categorical_imputer: Imputer::new(ImputeStrategy::MostFrequent),
            encoder: OneHotEncoder::new(),
            categorical_scaler: StandardScaler::new(false),
            feature_names: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Fit every stage on `df` and return its matrix and target.
    ///
    /// State is only replaced once the whole fit has succeeded.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<(Array2<f64>, Array1<f64>)> {
        if df.height() == 0 {
            return Err(TransformError::EmptyTable);
        }

        let y = self.target(df)?;

        let mut numeric_imputer = Imputer::new(ImputeStrategy::Median);
        let numeric = numeric_imputer.fit_transform(df, &self.config.numeric_columns)?;
        let numeric = numeric_matrix(&numeric, &self.config.numeric_columns)?;
        let mut numeric_scaler = StandardScaler::new(true);
        let numeric = numeric_scaler.fit_transform(&numeric)?;

        let mut categorical_imputer = Imputer::new(ImputeStrategy::MostFrequent);
        let categorical = categorical_imputer.fit_transform(df, &self.config.categorical_columns)?;
        let mut encoder = OneHotEncoder::new();
        encoder.fit(&categorical, &self.config.categorical_columns)?;
        let indicators = encoder.transform(&categorical)?;
        let mut categorical_scaler = StandardScaler::new(false);
        let indicators = categorical_scaler.fit_transform(&indicators)?;

        let x = join_blocks(&numeric, &indicators)?;

        let mut feature_names = self.config.numeric_columns.clone();
        feature_names.extend(encoder.feature_names());

        self.numeric_imputer = numeric_imputer;
        self.numeric_scaler = numeric_scaler;
        self.categorical_imputer = categorical_imputer;
        self.encoder = encoder;
        self.categorical_scaler = categorical_scaler;
        self.feature_names = feature_names;
        self.is_fitted = true;

        info!(
            rows = x.nrows(),
            width = x.ncols(),
            numeric = self.config.numeric_columns.len(),
            categorical = self.config.categorical_columns.len(),
            "Fitted feature transformer"
        );
        debug!(features = ?self.feature_names, "Transformer output columns");

        Ok((x, y))
    }

    /// Apply the frozen encoding. The target column, if present, is ignored.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(TransformError::NotFitted);
        }

        let numeric = self.numeric_imputer.transform(df)?;
        let numeric = numeric_matrix(&numeric, &self.config.numeric_columns)?;
        let numeric = self.numeric_scaler.transform(&numeric)?;

        let categorical = self.categorical_imputer.transform(df)?;
        let indicators = self.encoder.transform(&categorical)?;
        let indicators = self.categorical_scaler.transform(&indicators)?;

        join_blocks(&numeric, &indicators)
    }

    /// Extract the target vector; any null or NaN target is an error
    pub fn target(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let name = &self.config.target_column;
        let ca = numeric_column(df, name)?;

        let values: Vec<f64> = ca.into_iter().flatten().filter(|v| !v.is_nan()).collect();
        let missing = df.height() - values.len();
        if missing > 0 {
            return Err(TransformError::MissingTarget {
                column: name.clone(),
                nulls: missing,
            });
        }
        Ok(Array1::from(values))
    }

    /// Whether a categorical value was seen during fit; unseen values encode as zeros
    pub fn is_known_category(&self, column: &str, value: &str) -> bool {
        self.encoder.contains(column, value)
    }

    /// Width of every matrix produced after fit
    pub fn output_width(&self) -> usize {
        self.feature_names.len()
    }

    /// Output column names, numeric first
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

fn numeric_matrix(df: &DataFrame, columns: &[String]) -> Result<Array2<f64>> {
    let mut out = Array2::<f64>::zeros((df.height(), columns.len()));
    for (j, name) in columns.iter().enumerate() {
        let ca = numeric_column(df, name)?;
        for (i, v) in ca.into_iter().enumerate() {
            out[[i, j]] = v.unwrap_or(f64::NAN);
        }
    }
    Ok(out)
}

fn join_blocks(numeric: &Array2<f64>, indicators: &Array2<f64>) -> Result<Array2<f64>> {
    concatenate(Axis(1), &[numeric.view(), indicators.view()]).map_err(|e| TransformError::InvalidColumn {
        column: "<feature matrix>".to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train_frame() -> DataFrame {
        df!(
            "gender" => &["female", "male", "female", "male"],
            "race_ethnicity" => &["group A", "group B", "group C", "group B"],
            "parental_level_of_education" => &["some college", "high school", "master's degree", "high school"],
            "lunch" => &["standard", "free/reduced", "standard", "standard"],
            "test_preparation_course" => &["none", "completed", "none", "none"],
            "reading_score" => &[70i64, 80, 60, 90],
            "writing_score" => &[68i64, 82, 58, 91],
            "math_score" => &[65i64, 78, 55, 88]
        )
        .unwrap()
    }

    #[test]
    fn test_fit_transform_shape_and_order() {
        let mut transformer = FeatureTransformer::default();
        let (x, y) = transformer.fit_transform(&train_frame()).unwrap();

        // 2 numeric + gender(2) + race(3) + education(3) + lunch(2) + prep(2)
        assert_eq!(x.dim(), (4, 14));
        assert_eq!(transformer.output_width(), 14);
        assert_eq!(y.to_vec(), vec![65.0, 78.0, 55.0, 88.0]);
        assert_eq!(&transformer.feature_names()[..3], &["writing_score", "reading_score", "gender_female"]);
    }

    #[test]
    fn test_numeric_columns_are_standardized() {
        let mut transformer = FeatureTransformer::default();
        let (x, _) = transformer.fit_transform(&train_frame()).unwrap();
        for j in 0..2 {
            let col = x.column(j);
            let mean = col.sum() / 4.0;
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_missing_target() {
        let mut df = train_frame();
        df.with_column(Column::new("math_score".into(), &[Some(1.0), None, Some(2.0), Some(3.0)]))
            .unwrap();
        let mut transformer = FeatureTransformer::default();
        assert_eq!(
            transformer.fit_transform(&df).unwrap_err(),
            TransformError::MissingTarget {
                column: "math_score".to_string(),
                nulls: 1
            }
        );
        assert!(!transformer.is_fitted());
    }

    #[test]
    fn test_empty_table() {
        let df = train_frame().head(Some(0));
        let mut transformer = FeatureTransformer::default();
        assert_eq!(transformer.fit_transform(&df).unwrap_err(), TransformError::EmptyTable);
    }

    #[test]
    fn test_transform_before_fit() {
        let transformer = FeatureTransformer::default();
        assert_eq!(transformer.transform(&train_frame()).unwrap_err(), TransformError::NotFitted);
    }
}
