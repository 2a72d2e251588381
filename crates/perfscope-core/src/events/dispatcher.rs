//! Synchronous event dispatch, free when no handler is registered.

use std::sync::Arc;

use super::handler::AnalysisEventHandler;
use super::types::*;

/// Synchronous event dispatcher wrapping a list of handlers.
#[derive(Default, Clone)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn AnalysisEventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn AnalysisEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Emit an event to all registered handlers.
    /// A panicking handler is logged and does not stop later handlers.
    fn emit<F: Fn(&dyn AnalysisEventHandler)>(&self, f: F) {
        for handler in &self.handlers {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                f(handler.as_ref());
            }));
            if result.is_err() {
                tracing::error!("event handler panicked; continuing with remaining handlers");
            }
        }
    }

    // ---- Trace assembly ----
    pub fn emit_session_skipped(&self, event: &SessionSkippedEvent) {
        self.emit(|h| h.on_session_skipped(event));
    }

    pub fn emit_session_assembled(&self, event: &SessionAssembledEvent) {
        self.emit(|h| h.on_session_assembled(event));
    }

    pub fn emit_analysis_complete(&self, event: &AnalysisCompleteEvent) {
        self.emit(|h| h.on_analysis_complete(event));
    }

    // ---- Selection ----
    pub fn emit_benchmark_selected(&self, event: &BenchmarkSelectedEvent) {
        self.emit(|h| h.on_benchmark_selected(event));
    }

    pub fn emit_coverage_gap(&self, event: &CoverageGapEvent) {
        self.emit(|h| h.on_coverage_gap(event));
    }

    // ---- Comparison ----
    pub fn emit_regression_detected(&self, event: &RegressionDetectedEvent) {
        self.emit(|h| h.on_regression_detected(event));
    }

    // ---- Errors ----
    pub fn emit_error(&self, event: &ErrorEvent) {
        self.emit(|h| h.on_error(event));
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
