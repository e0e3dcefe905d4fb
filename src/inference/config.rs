//! Inference configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Rows predicted per chunk
    pub batch_size: usize,

    /// Predict chunks on the rayon pool once a frame spans several batches
    pub parallel: bool,

    /// Reject records whose scores fall outside [0, 100]
    pub validate_records: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            batch_size: 1024,
            parallel: true,
            validate_records: true,
        }
    }
}

impl InferenceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate_records = validate;
        self
    }
}
