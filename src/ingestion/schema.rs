//! Student-performance table schema

use crate::error::{PipelineError, Result, TransformError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const GENDER: &str = "gender";
pub const RACE_ETHNICITY: &str = "race_ethnicity";
pub const PARENTAL_LEVEL_OF_EDUCATION: &str = "parental_level_of_education";
pub const LUNCH: &str = "lunch";
pub const TEST_PREPARATION_COURSE: &str = "test_preparation_course";
pub const READING_SCORE: &str = "reading_score";
pub const WRITING_SCORE: &str = "writing_score";
pub const MATH_SCORE: &str = "math_score";

/// Numeric feature columns, in output order
pub const NUMERIC_FEATURES: [&str; 2] = [WRITING_SCORE, READING_SCORE];

/// Categorical feature columns, in output order
pub const CATEGORICAL_FEATURES: [&str; 5] = [
    GENDER,
    RACE_ETHNICITY,
    PARENTAL_LEVEL_OF_EDUCATION,
    LUNCH,
    TEST_PREPARATION_COURSE,
];

/// Prediction target
pub const TARGET: &str = MATH_SCORE;

/// Full training schema in table order
pub const COLUMNS: [&str; 8] = [
    GENDER,
    RACE_ETHNICITY,
    PARENTAL_LEVEL_OF_EDUCATION,
    LUNCH,
    TEST_PREPARATION_COURSE,
    READING_SCORE,
    WRITING_SCORE,
    MATH_SCORE,
];

/// Upper bound of the score columns
pub const MAX_SCORE: f64 = 100.0;

/// One inference-time record: every schema column except the target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub gender: String,
    pub race_ethnicity: String,
    pub parental_level_of_education: String,
    pub lunch: String,
    pub test_preparation_course: String,
    pub reading_score: f64,
    pub writing_score: f64,
}

impl StudentRecord {
    /// Trim every category and lowercase the columns whose training values are
    /// all lowercase (gender, parental education, lunch).
    ///
    /// Race/ethnicity keeps its case (`group A`) and the test preparation
    /// values are already lowercase in the source data, so both are only trimmed.
    pub fn normalized(self) -> Self {
        Self {
            gender: self.gender.trim().to_lowercase(),
            race_ethnicity: self.race_ethnicity.trim().to_string(),
            parental_level_of_education: self.parental_level_of_education.trim().to_lowercase(),
            lunch: self.lunch.trim().to_lowercase(),
            test_preparation_course: self.test_preparation_course.trim().to_string(),
            ..self
        }
    }

    /// (column, value) for every categorical feature
    pub fn categories(&self) -> [(&'static str, &str); 5] {
        [
            (GENDER, self.gender.as_str()),
            (RACE_ETHNICITY, self.race_ethnicity.as_str()),
            (PARENTAL_LEVEL_OF_EDUCATION, self.parental_level_of_education.as_str()),
            (LUNCH, self.lunch.as_str()),
            (TEST_PREPARATION_COURSE, self.test_preparation_course.as_str()),
        ]
    }

    /// Reject scores outside the domain range [0, 100]
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            (READING_SCORE, self.reading_score),
            (WRITING_SCORE, self.writing_score),
        ] {
            if !(0.0..=MAX_SCORE).contains(&value) {
                return Err(PipelineError::InvalidInput(format!(
                    "{} must be within [0, {}], got {}",
                    name, MAX_SCORE, value
                )));
            }
        }
        Ok(())
    }

    /// Single-row frame with the feature columns
    pub fn to_frame(&self) -> Result<DataFrame> {
        df!(
            GENDER => &[self.gender.as_str()],
            RACE_ETHNICITY => &[self.race_ethnicity.as_str()],
            PARENTAL_LEVEL_OF_EDUCATION => &[self.parental_level_of_education.as_str()],
            LUNCH => &[self.lunch.as_str()],
            TEST_PREPARATION_COURSE => &[self.test_preparation_course.as_str()],
            READING_SCORE => &[self.reading_score],
            WRITING_SCORE => &[self.writing_score]
        )
        .map_err(|e| PipelineError::InvalidInput(e.to_string()))
    }
}

/// Check that every schema column is present; the first absent one is reported
pub fn validate_columns(df: &DataFrame) -> Result<()> {
    match COLUMNS.iter().find(|name| df.column(name).is_err()) {
        Some(name) => Err(TransformError::MissingColumn(name.to_string()).into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> StudentRecord {
        StudentRecord {
            gender: "female".to_string(),
            race_ethnicity: "group B".to_string(),
            parental_level_of_education: "bachelor's degree".to_string(),
            lunch: "standard".to_string(),
            test_preparation_course: "none".to_string(),
            reading_score: 72.0,
            writing_score: 74.0,
        }
    }

    #[test]
    fn test_record_to_frame() {
        let df = record().to_frame().unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 7);
        assert!(df.column(MATH_SCORE).is_err());
    }

    #[test]
    fn test_normalized_lowercases_form_values() {
        let raw = StudentRecord {
            gender: " Female".to_string(),
            race_ethnicity: "group B ".to_string(),
            parental_level_of_education: "Master's Degree".to_string(),
            lunch: "Free/Reduced".to_string(),
            test_preparation_course: "completed".to_string(),
            ..record()
        };
        let r = raw.normalized();
        assert_eq!(r.gender, "female");
        assert_eq!(r.race_ethnicity, "group B");
        assert_eq!(r.parental_level_of_education, "master's degree");
        assert_eq!(r.lunch, "free/reduced");
        assert_eq!(r.reading_score, 72.0);
    }

    #[test]
    fn test_record_validate_range() {
        let mut r = record();
        assert!(r.validate().is_ok());
        r.reading_score = 101.0;
        assert!(matches!(r.validate(), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_columns_reports_missing() {
        let df = record().to_frame().unwrap();
        assert!(matches!(
            validate_columns(&df),
            Err(PipelineError::Transform(TransformError::MissingColumn(c))) if c == MATH_SCORE
        ));
    }
}
