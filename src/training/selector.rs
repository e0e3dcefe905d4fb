//! Pick the winning model from a score report

use super::evaluator::ScoreReport;
use super::models::Regressor;
use super::registry::ModelRegistry;
use crate::error::{PipelineError, Result};
use tracing::info;

/// Minimum held-out R² a winner must reach
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// The fitted winner, moved out of the registry
#[derive(Debug)]
pub struct SelectedModel {
    pub name: String,
    pub algorithm: &'static str,
    pub model: Box<dyn Regressor>,
    pub score: f64,
}

/// Select the highest-scoring model.
///
/// Ties go to the earliest registry entry. Failed models and NaN scores are
/// never selected. A best score strictly below `threshold` is rejected.
pub fn select(report: &ScoreReport, registry: &mut ModelRegistry, threshold: f64) -> Result<SelectedModel> {
    if threshold.is_nan() {
        return Err(PipelineError::Config("selection threshold is NaN".to_string()));
    }

    let Some(best) = report.best() else {
        return Err(PipelineError::NoAcceptableModel { best: None, threshold });
    };
    if best.r2 < threshold {
        return Err(PipelineError::NoAcceptableModel {
            best: Some((best.name.clone(), best.r2)),
            threshold,
        });
    }

    let entry = registry.take(&best.name).ok_or_else(|| {
        PipelineError::InvalidInput(format!("model '{}' is not in the registry", best.name))
    })?;
    let (name, factory, model) = entry.into_parts();

    info!(model = %name, r2 = best.r2, threshold, "Selected model");
    Ok(SelectedModel {
        name,
        algorithm: factory.algorithm(),
        model,
        score: best.r2,
    })
}
