//! Categorical encoding

use super::categorical_column;
use crate::error::TransformError;
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One-hot encoder with a frozen, sorted vocabulary per column.
///
/// Categories never seen during fit encode as an all-zero block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// (column, sorted categories) in fit order
    categories: Vec<(String, Vec<String>)>,
    is_fitted: bool,
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self {
            categories: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learn the vocabulary of each column. Nulls are not categories.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self, TransformError> {
        let mut categories = Vec::with_capacity(columns.len());
        for name in columns {
            let ca = categorical_column(df, name)?;
            let vocab: BTreeSet<&str> = ca.into_iter().flatten().collect();
            categories.push((name.clone(), vocab.into_iter().map(str::to_string).collect()));
        }

        self.categories = categories;
        self.is_fitted = true;
        Ok(self)
    }

    /// Total number of indicator columns
    pub fn output_width(&self) -> usize {
        self.categories.iter().map(|(_, c)| c.len()).sum()
    }

    /// `<column>_<category>` for every indicator, in output order
    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(|(name, cats)| cats.iter().map(move |c| format!("{}_{}", name, c)))
            .collect()
    }

    /// Whether `value` is in the fitted vocabulary of `column`
    pub fn contains(&self, column: &str, value: &str) -> bool {
        self.categories
            .iter()
            .find(|(name, _)| name == column)
            .map_or(false, |(_, cats)| cats.binary_search_by(|c| c.as_str().cmp(value)).is_ok())
    }

    /// Encode into a dense indicator matrix
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>, TransformError> {
        if !self.is_fitted {
            return Err(TransformError::NotFitted);
        }

        let mut out = Array2::<f64>::zeros((df.height(), self.output_width()));
        let mut offset = 0;
        for (name, cats) in &self.categories {
            let ca = categorical_column(df, name)?;
            for (row, value) in ca.into_iter().enumerate() {
                if let Some(idx) = value.and_then(|v| cats.binary_search_by(|c| c.as_str().cmp(v)).ok()) {
                    out[[row, offset + idx]] = 1.0;
                }
            }
            offset += cats.len();
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn lunch() -> Vec<String> {
        vec!["lunch".to_string()]
    }

    #[test]
    fn test_sorted_vocabulary() {
        let df = df!("lunch" => &["standard", "free/reduced", "standard"]).unwrap();
        let mut encoder = OneHotEncoder::new();
        encoder.fit(&df, &lunch()).unwrap();

        assert_eq!(encoder.feature_names(), vec!["lunch_free/reduced", "lunch_standard"]);
        assert_eq!(
            encoder.transform(&df).unwrap(),
            array![[0.0, 1.0], [1.0, 0.0], [0.0, 1.0]]
        );
    }

    #[test]
    fn test_unseen_category_is_all_zero() {
        let train = df!("lunch" => &["standard", "free/reduced"]).unwrap();
        let test = df!("lunch" => &["catered"]).unwrap();
        let mut encoder = OneHotEncoder::new();
        encoder.fit(&train, &lunch()).unwrap();

        assert_eq!(encoder.transform(&test).unwrap(), array![[0.0, 0.0]]);
    }

    #[test]
    fn test_contains_checks_fitted_vocabulary() {
        let train = df!("lunch" => &["standard", "free/reduced"]).unwrap();
        let mut encoder = OneHotEncoder::new();
        encoder.fit(&train, &lunch()).unwrap();

        assert!(encoder.contains("lunch", "standard"));
        assert!(!encoder.contains("lunch", "Standard"));
        assert!(!encoder.contains("gender", "standard"));
    }

    #[test]
    fn test_missing_column() {
        let df = df!("gender" => &["male"]).unwrap();
        let mut encoder = OneHotEncoder::new();
        assert_eq!(
            encoder.fit(&df, &lunch()).unwrap_err(),
            TransformError::MissingColumn("lunch".to_string())
        );
    }
}
