//! Tests for the event system.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use perfscope_core::events::types::*;
use perfscope_core::events::{AnalysisEventHandler, EventDispatcher};

#[derive(Default)]
struct CountingHandler {
    skipped: AtomicUsize,
    selected: AtomicUsize,
    gaps: AtomicUsize,
}

impl AnalysisEventHandler for CountingHandler {
    fn on_session_skipped(&self, _event: &SessionSkippedEvent) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    fn on_benchmark_selected(&self, _event: &BenchmarkSelectedEvent) {
        self.selected.fetch_add(1, Ordering::Relaxed);
    }

    fn on_coverage_gap(&self, _event: &CoverageGapEvent) {
        self.gaps.fetch_add(1, Ordering::Relaxed);
    }
}

struct PanickingHandler;

impl AnalysisEventHandler for PanickingHandler {
    fn on_session_skipped(&self, _event: &SessionSkippedEvent) {
        panic!("handler bug");
    }
}

fn skipped_event() -> SessionSkippedEvent {
    SessionSkippedEvent {
        session_key: "1700000000".into(),
        log_path: Some(PathBuf::from("/tmp/Bench_1700000000.log")),
        reason: SkipReason::MissingMetadata,
    }
}

#[test]
fn empty_dispatcher_is_a_noop() {
    let dispatcher = EventDispatcher::new();
    assert_eq!(dispatcher.handler_count(), 0);
    dispatcher.emit_session_skipped(&skipped_event());
}

#[test]
fn events_reach_every_handler() {
    let first = Arc::new(CountingHandler::default());
    let second = Arc::new(CountingHandler::default());
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(first.clone());
    dispatcher.register(second.clone());

    dispatcher.emit_session_skipped(&skipped_event());
    dispatcher.emit_benchmark_selected(&BenchmarkSelectedEvent {
        benchmark: "B1".into(),
        newly_covered: 2,
        probe_duration: 1.5,
    });
    dispatcher.emit_coverage_gap(&CoverageGapEvent {
        commit: "c1".into(),
        uncovered: vec!["baz()".into()],
    });

    for handler in [&first, &second] {
        assert_eq!(handler.skipped.load(Ordering::Relaxed), 1);
        assert_eq!(handler.selected.load(Ordering::Relaxed), 1);
        assert_eq!(handler.gaps.load(Ordering::Relaxed), 1);
    }
}

#[test]
fn panicking_handler_does_not_block_others() {
    let counter = Arc::new(CountingHandler::default());
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(Arc::new(PanickingHandler));
    dispatcher.register(counter.clone());

    dispatcher.emit_session_skipped(&skipped_event());
    assert_eq!(counter.skipped.load(Ordering::Relaxed), 1);
}

#[test]
fn skip_reasons_have_stable_names() {
    assert_eq!(SkipReason::MissingMetadata.as_str(), "missing_metadata");
    assert_eq!(SkipReason::EmptyLog.as_str(), "empty_log");
}

#[test]
fn tracing_init_is_idempotent() {
    let _ = perfscope_core::tracing_setup::init_tracing_with_filter("warn");
    // A second install must report failure rather than panic.
    assert!(!perfscope_core::tracing_setup::init_tracing());
}
