//! Missing value imputation strategies

use super::{categorical_column, numeric_column};
use crate::error::TransformError;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

type Result<T> = std::result::Result<T, TransformError>;

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with the training median (numeric only)
    Median,
    /// Replace with the most frequent training value; ties go to the smallest value
    MostFrequent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum ImputeValue {
    Numeric(f64),
    String(String),
}

/// Imputer for handling missing values.
///
/// Missing means null, or NaN for numeric columns. Fill values are frozen at
/// fit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: BTreeMap<String, ImputeValue>,
    is_fitted: bool,
}

impl Imputer {
    /// Create a new imputer with the specified strategy
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: BTreeMap::new(),
            is_fitted: false,
        }
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }

    /// Fit the imputer to the given columns
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        let mut fill_values = BTreeMap::new();
        for name in columns {
            let value = match self.strategy {
                ImputeStrategy::Median => {
                    let ca = numeric_column(df, name)?;
                    let observed: Vec<f64> = ca.into_iter().flatten().filter(|v| !v.is_nan()).collect();
                    let median = median(observed).ok_or_else(|| no_observations(name))?;
                    debug!(column = %name, median, "Fitted median imputer");
                    ImputeValue::Numeric(median)
                }
                ImputeStrategy::MostFrequent => {
                    let ca = categorical_column(df, name)?;
                    let mode = most_frequent(ca.into_iter().flatten()).ok_or_else(|| no_observations(name))?;
                    debug!(column = %name, mode = %mode, "Fitted most-frequent imputer");
                    ImputeValue::String(mode)
                }
            };
            fill_values.insert(name.clone(), value);
        }

        self.fill_values = fill_values;
        self.is_fitted = true;
        Ok(self)
    }

    /// Replace missing values in every fitted column.
    ///
    /// Numeric columns come back as `Float64`, categorical columns as `String`,
    /// both without nulls.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(TransformError::NotFitted);
        }

        let mut result = df.clone();
        for (name, fill_value) in &self.fill_values {
            let filled = match fill_value {
                ImputeValue::Numeric(fill) => {
                    let values: Vec<f64> = numeric_column(df, name)?
                        .into_iter()
                        .map(|v| match v {
                            Some(x) if !x.is_nan() => x,
                            _ => *fill,
                        })
                        .collect();
                    Column::new(name.as_str().into(), values)
                }
                ImputeValue::String(fill) => {
                    let values: Vec<String> = categorical_column(df, name)?
                        .into_iter()
                        .map(|v| v.map_or_else(|| fill.clone(), str::to_string))
                        .collect();
                    Column::new(name.as_str().into(), values)
                }
            };

            result
                .with_column(filled)
                .map_err(|e| TransformError::InvalidColumn {
                    column: name.clone(),
                    reason: e.to_string(),
                })?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }
}

fn no_observations(column: &str) -> TransformError {
    TransformError::InvalidColumn {
        column: column.to_string(),
        reason: "no observed values to impute from".to_string(),
    }
}

/// Median with the midpoint convention for even counts
fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Most frequent value, smallest value on ties
fn most_frequent<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_median_imputation() {
        let df = df!("score" => &[Some(10.0), None, Some(30.0), Some(20.0), Some(40.0)]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        let out = imputer.fit_transform(&df, &cols(&["score"])).unwrap();

        let values: Vec<f64> = out.column("score").unwrap().f64().unwrap().into_no_null_iter().collect();
        assert_eq!(values, vec![10.0, 25.0, 30.0, 20.0, 40.0]);
    }

    #[test]
    fn test_median_treats_nan_as_missing() {
        let df = df!("score" => &[1.0, f64::NAN, 3.0]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        let out = imputer.fit_transform(&df, &cols(&["score"])).unwrap();
        let values: Vec<f64> = out.column("score").unwrap().f64().unwrap().into_no_null_iter().collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_most_frequent_tie_goes_to_smallest() {
        let df = df!("lunch" => &[Some("standard"), Some("free/reduced"), None]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::MostFrequent);
        let out = imputer.fit_transform(&df, &cols(&["lunch"])).unwrap();

        let values: Vec<&str> = out.column("lunch").unwrap().str().unwrap().into_no_null_iter().collect();
        assert_eq!(values, vec!["standard", "free/reduced", "free/reduced"]);
    }

    #[test]
    fn test_fill_values_are_frozen() {
        let train = df!("score" => &[Some(1.0), Some(3.0)]).unwrap();
        let test = df!("score" => &[None::<f64>, Some(100.0)]).unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::Median);
        imputer.fit(&train, &cols(&["score"])).unwrap();
        let out = imputer.transform(&test).unwrap();
        let values: Vec<f64> = out.column("score").unwrap().f64().unwrap().into_no_null_iter().collect();
        assert_eq!(values, vec![2.0, 100.0]);
    }

    #[test]
    fn test_transform_before_fit() {
        let df = df!("score" => &[1.0]).unwrap();
        let imputer = Imputer::new(ImputeStrategy::Median);
        assert_eq!(imputer.transform(&df).unwrap_err(), TransformError::NotFitted);
    }

    #[test]
    fn test_all_missing_column_is_rejected() {
        let df = df!("score" => &[None::<f64>, None]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        assert!(matches!(
            imputer.fit(&df, &cols(&["score"])),
            Err(TransformError::InvalidColumn { .. })
        ));
    }
}
