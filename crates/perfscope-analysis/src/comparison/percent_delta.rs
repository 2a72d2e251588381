//! Relative change of one aggregate metric against a fixed threshold.

use perfscope_core::config::ProfileMetric;
use perfscope_core::types::MethodProfile;

use super::{relative_change, Comparator, MethodComparison, Verdict};
use crate::profile::ProfileReport;

#[derive(Debug, Clone, Copy)]
pub struct PercentDeltaComparator {
    metric: ProfileMetric,
    threshold: f64,
}

impl PercentDeltaComparator {
    /// `threshold` is a fraction: 0.10 flags changes beyond ±10%.
    pub fn new(metric: ProfileMetric, threshold: f64) -> Self {
        Self { metric, threshold }
    }

    fn read(&self, profile: &MethodProfile) -> f64 {
        match self.metric {
            ProfileMetric::SelfTime => profile.self_time as f64,
            ProfileMetric::TotalTime => profile.total_time as f64,
            ProfileMetric::AverageSelfTime => profile.average_self_time,
        }
    }
}

impl Comparator for PercentDeltaComparator {
    fn name(&self) -> &'static str {
        "percent_delta"
    }

    fn compare_method(&self, method: &str, before: &ProfileReport, after: &ProfileReport) -> MethodComparison {
        let (Some(b), Some(a)) = (before.profile(method), after.profile(method)) else {
            return MethodComparison::inconclusive(method);
        };
        if !b.is_reliable() || !a.is_reliable() {
            return MethodComparison::inconclusive(method);
        }
        let Some(magnitude) = relative_change(self.read(b), self.read(a)) else {
            return MethodComparison::inconclusive(method);
        };

        let verdict = if magnitude > self.threshold {
            Verdict::Regressed
        } else if magnitude < -self.threshold {
            Verdict::Improved
        } else {
            Verdict::Unchanged
        };
        MethodComparison {
            method: method.to_string(),
            verdict,
            magnitude,
            p_value: None,
        }
    }
}
