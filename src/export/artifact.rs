//! Persisted form of the selected model

use crate::error::{PipelineError, Result};
use crate::training::{factory_for, Regressor, ScoreReport, SelectedModel, StateSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Registry display name of the winner
    pub name: String,
    /// Algorithm key used to restore `state`
    pub algorithm: String,
    /// Held-out R² of the winner
    pub score: f64,
    pub trained_at: DateTime<Utc>,
    pub report: ScoreReport,
    pub state: serde_json::Value,
}

impl ModelArtifact {
    pub fn from_selected(selected: &SelectedModel, report: &ScoreReport) -> Result<Self> {
        let state = selected
            .model
            .snapshot()
            .map_err(|e| PipelineError::model_fit(selected.name.clone(), e))?;

        Ok(Self {
            name: selected.name.clone(),
            algorithm: selected.algorithm.to_string(),
            score: selected.score,
            trained_at: Utc::now(),
            report: report.clone(),
            state,
        })
    }

    /// Rebuild the fitted model through its algorithm's factory
    pub fn restore(&self) -> Result<Box<dyn Regressor>> {
        let factory = factory_for(&self.algorithm).ok_or_else(|| {
            PipelineError::InvalidInput(format!("unknown algorithm '{}' in model artifact", self.algorithm))
        })?;
        let model = factory
            .restore(self.state.clone())
            .map_err(|e| PipelineError::model_fit(self.name.clone(), e))?;

        if !model.is_fitted() {
            return Err(PipelineError::InvalidInput(format!(
                "model artifact for '{}' holds an unfitted model",
                self.name
            )));
        }
        Ok(model)
    }
}
