//! Event payload types.

use std::path::PathBuf;

/// Why a capture session contributed no events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Log file absent (metadata only).
    MissingLog,
    /// Log file present but empty: aborted or zero-invocation run.
    EmptyLog,
    /// Log file present but its metadata sidecar is absent.
    MissingMetadata,
    /// Metadata sidecar could not be read or parsed.
    InvalidMetadata,
    /// Log file could not be read.
    UnreadableLog,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingLog => "missing_log",
            Self::EmptyLog => "empty_log",
            Self::MissingMetadata => "missing_metadata",
            Self::InvalidMetadata => "invalid_metadata",
            Self::UnreadableLog => "unreadable_log",
        }
    }
}

/// Payload for `on_session_skipped`.
#[derive(Debug, Clone)]
pub struct SessionSkippedEvent {
    pub session_key: String,
    pub log_path: Option<PathBuf>,
    pub reason: SkipReason,
}

/// Payload for `on_session_assembled`.
#[derive(Debug, Clone)]
pub struct SessionAssembledEvent {
    pub session_key: String,
    pub event_count: usize,
    pub malformed_lines: usize,
}

/// Payload for `on_analysis_complete`.
#[derive(Debug, Clone)]
pub struct AnalysisCompleteEvent {
    pub trace_base: PathBuf,
    pub sessions: usize,
    pub methods: usize,
    pub discarded_exits: usize,
    pub duration_ms: u64,
}

/// Payload for `on_benchmark_selected`.
#[derive(Debug, Clone)]
pub struct BenchmarkSelectedEvent {
    pub benchmark: String,
    pub newly_covered: usize,
    pub probe_duration: f64,
}

/// Payload for `on_coverage_gap`: methods no remaining benchmark reaches.
#[derive(Debug, Clone)]
pub struct CoverageGapEvent {
    pub commit: String,
    pub uncovered: Vec<String>,
}

/// Payload for `on_regression_detected`.
#[derive(Debug, Clone)]
pub struct RegressionDetectedEvent {
    pub method: String,
    pub magnitude: f64,
}

/// Payload for `on_error`.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub message: String,
    pub error_code: String,
}
