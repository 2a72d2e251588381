//! Aggregation and outlier-filter configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_OUTLIER_Z_THRESHOLD: f64 = 3.0;
pub const DEFAULT_MIN_OUTLIER_SAMPLES: usize = 2;

/// Configuration for the trace-to-profile analysis.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Retain raw per-call samples and drop z-score outliers. Default: true.
    pub remove_outliers: Option<bool>,
    /// Samples with `|z| >= threshold` are discarded. Default: 3.0.
    pub outlier_z_threshold: Option<f64>,
    /// Below this many samples the filter is skipped. Default: 2.
    pub min_outlier_samples: Option<usize>,
}

impl AnalysisConfig {
    pub fn effective_remove_outliers(&self) -> bool {
        self.remove_outliers.unwrap_or(true)
    }

    pub fn effective_outlier_z_threshold(&self) -> f64 {
        self.outlier_z_threshold.unwrap_or(DEFAULT_OUTLIER_Z_THRESHOLD)
    }

    pub fn effective_min_outlier_samples(&self) -> usize {
        self.min_outlier_samples.unwrap_or(DEFAULT_MIN_OUTLIER_SAMPLES)
    }
}
