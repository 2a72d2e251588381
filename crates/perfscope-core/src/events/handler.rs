//! Event handler trait.

use super::types::*;

/// Receives analysis lifecycle events. Every method defaults to a no-op, so
/// implementors override only what they care about.
pub trait AnalysisEventHandler: Send + Sync {
    fn on_session_skipped(&self, _event: &SessionSkippedEvent) {}
    fn on_session_assembled(&self, _event: &SessionAssembledEvent) {}
    fn on_analysis_complete(&self, _event: &AnalysisCompleteEvent) {}
    fn on_benchmark_selected(&self, _event: &BenchmarkSelectedEvent) {}
    fn on_coverage_gap(&self, _event: &CoverageGapEvent) {}
    fn on_regression_detected(&self, _event: &RegressionDetectedEvent) {}
    fn on_error(&self, _event: &ErrorEvent) {}
}
