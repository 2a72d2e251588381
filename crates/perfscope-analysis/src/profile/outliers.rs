//! Z-score outlier filter over per-call duration samples, with iterative
//! masking.
//!
//! Uses the population standard deviation of the samples still in play.
//! Samples with `|z| >= threshold` are masked and the statistics recomputed
//! over the rest, until a pass masks nothing. A pass is skipped below
//! `min_samples` points or when every remaining sample is identical. The
//! result is a fixed point: filtering the survivors again drops nothing.

use perfscope_core::config::analysis_config::{DEFAULT_MIN_OUTLIER_SAMPLES, DEFAULT_OUTLIER_Z_THRESHOLD};
use perfscope_core::config::AnalysisConfig;
use statrs::statistics::Statistics;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierFilter {
    pub threshold: f64,
    pub min_samples: usize,
}

impl Default for OutlierFilter {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_OUTLIER_Z_THRESHOLD,
            min_samples: DEFAULT_MIN_OUTLIER_SAMPLES,
        }
    }
}

impl OutlierFilter {
    pub fn new(threshold: f64, min_samples: usize) -> Self {
        Self {
            threshold,
            min_samples,
        }
    }

    /// `None` when outlier removal is disabled.
    pub fn from_config(config: &AnalysisConfig) -> Option<Self> {
        config.effective_remove_outliers().then(|| {
            Self::new(
                config.effective_outlier_z_threshold(),
                config.effective_min_outlier_samples(),
            )
        })
    }

    /// `true` for every sample that survives.
    pub fn retain_mask(&self, values: &[f64]) -> Vec<bool> {
        let mut keep = vec![true; values.len()];

        // Each productive pass masks at least one sample.
        for _ in 0..values.len() {
            let active: Vec<f64> = values
                .iter()
                .zip(&keep)
                .filter_map(|(v, k)| k.then_some(*v))
                .collect();
            if active.len() < self.min_samples.max(2) {
                break;
            }

            let mean = active.iter().mean();
            let std_dev = active.iter().population_std_dev();
            if !std_dev.is_finite() || std_dev <= 0.0 {
                break;
            }

            let mut masked_any = false;
            for (v, k) in values.iter().zip(keep.iter_mut()) {
                if *k && ((v - mean) / std_dev).abs() >= self.threshold {
                    *k = false;
                    masked_any = true;
                }
            }
            if !masked_any {
                break;
            }
        }
        keep
    }

    pub fn filter(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .zip(self.retain_mask(values))
            .filter_map(|(v, keep)| keep.then_some(*v))
            .collect()
    }
}
