//! Before/after profile comparison behind a pluggable [`Comparator`].

pub mod mann_whitney;
pub mod percent_delta;

use std::collections::BTreeSet;
use std::fmt;

use perfscope_core::config::{ComparisonConfig, ComparisonMethod};
use perfscope_core::events::types::RegressionDetectedEvent;
use perfscope_core::events::EventDispatcher;
use serde::{Deserialize, Serialize};

use crate::profile::ProfileReport;

pub use mann_whitney::MannWhitneyComparator;
pub use percent_delta::PercentDeltaComparator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Regressed,
    Improved,
    Unchanged,
    /// Not enough reliable data on one side to decide.
    Inconclusive,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regressed => "regressed",
            Self::Improved => "improved",
            Self::Unchanged => "unchanged",
            Self::Inconclusive => "inconclusive",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodComparison {
    pub method: String,
    pub verdict: Verdict,
    /// Relative change, `(after - before) / before`. Positive is slower.
    pub magnitude: f64,
    /// Present for statistical comparators.
    pub p_value: Option<f64>,
}

impl MethodComparison {
    pub fn inconclusive(method: &str) -> Self {
        Self {
            method: method.to_string(),
            verdict: Verdict::Inconclusive,
            magnitude: 0.0,
            p_value: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub comparator: String,
    pub methods: Vec<MethodComparison>,
}

impl ComparisonReport {
    pub fn with_verdict(&self, verdict: Verdict) -> impl Iterator<Item = &MethodComparison> {
        self.methods.iter().filter(move |m| m.verdict == verdict)
    }

    pub fn regressions(&self) -> Vec<&MethodComparison> {
        self.with_verdict(Verdict::Regressed).collect()
    }

    pub fn improvements(&self) -> Vec<&MethodComparison> {
        self.with_verdict(Verdict::Improved).collect()
    }

    pub fn get(&self, method: &str) -> Option<&MethodComparison> {
        self.methods.iter().find(|m| m.method == method)
    }
}

/// Decides, per method, whether the "after" run differs from "before".
pub trait Comparator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Compare one method present in both reports.
    fn compare_method(&self, method: &str, before: &ProfileReport, after: &ProfileReport) -> MethodComparison;

    /// Compare every method in either report. Methods seen on only one side
    /// are inconclusive.
    fn compare(&self, before: &ProfileReport, after: &ProfileReport) -> ComparisonReport {
        let methods: BTreeSet<&String> = before.profiles.keys().chain(after.profiles.keys()).collect();
        let methods = methods
            .into_iter()
            .map(|method| {
                if before.profiles.contains_key(method) && after.profiles.contains_key(method) {
                    self.compare_method(method, before, after)
                } else {
                    MethodComparison::inconclusive(method)
                }
            })
            .collect();
        ComparisonReport {
            comparator: self.name().to_string(),
            methods,
        }
    }
}

pub fn comparator_from_config(config: &ComparisonConfig) -> Box<dyn Comparator> {
    match config.effective_method() {
        ComparisonMethod::PercentDelta => Box::new(PercentDeltaComparator::new(
            config.effective_metric(),
            config.effective_relative_threshold(),
        )),
        ComparisonMethod::MannWhitney => Box::new(MannWhitneyComparator::new(config.effective_alpha())),
    }
}

/// Run `comparator` and notify listeners of every regression found.
pub fn compare_and_notify(
    comparator: &dyn Comparator,
    before: &ProfileReport,
    after: &ProfileReport,
    events: &EventDispatcher,
) -> ComparisonReport {
    let report = comparator.compare(before, after);
    for regression in report.regressions() {
        tracing::info!(
            method = %regression.method,
            magnitude = regression.magnitude,
            comparator = comparator.name(),
            "regression detected"
        );
        events.emit_regression_detected(&RegressionDetectedEvent {
            method: regression.method.clone(),
            magnitude: regression.magnitude,
        });
    }
    report
}

/// `(after - before) / |before|`; `None` when `before` is zero and the
/// values differ.
pub(crate) fn relative_change(before: f64, after: f64) -> Option<f64> {
    if before == 0.0 {
        return (after == 0.0).then_some(0.0);
    }
    Some((after - before) / before.abs())
}
