//! Utility functions and types

pub mod data_loader;

pub use data_loader::{DataLoader, DataSaver};

use std::time::{Duration, Instant};

/// Simple wall-clock timer
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    /// Elapsed time since start
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed seconds since start
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}
