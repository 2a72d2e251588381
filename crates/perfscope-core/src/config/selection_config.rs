//! Benchmark coverage selection configuration.

use serde::{Deserialize, Serialize};

/// A same-coverage alternative replaces the greedy pick when the pick's probe
/// duration exceeds the alternative's by more than this factor.
pub const DEFAULT_SIGNIFICANCE_FACTOR: f64 = 2.0;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SelectionConfig {
    pub significance_factor: Option<f64>,
}

impl SelectionConfig {
    pub fn effective_significance_factor(&self) -> f64 {
        self.significance_factor.unwrap_or(DEFAULT_SIGNIFICANCE_FACTOR)
    }
}
