//! End-to-end profile analysis of one trace base.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use perfscope_core::config::{ComparisonMethod, PerfscopeConfig};
use perfscope_core::errors::{ErrorCode, PipelineError};
use perfscope_core::events::types::{AnalysisCompleteEvent, ErrorEvent};
use perfscope_core::events::EventDispatcher;
use perfscope_core::types::MethodProfile;

use super::aggregator::{AggregationStats, ProfileAccumulator};
use super::format::format_nanos;
use super::outliers::OutlierFilter;
use crate::trace::{AssembledTrace, SkippedSession, TraceAssembler};

/// Profiles for one benchmark run.
#[derive(Debug, Default)]
pub struct ProfileReport {
    pub trace_base: PathBuf,
    pub profiles: BTreeMap<String, MethodProfile>,
    /// Per-call durations behind each profile, when samples were retained.
    pub samples: BTreeMap<String, Vec<i64>>,
    pub stats: AggregationStats,
    pub malformed_lines: usize,
    pub skipped_sessions: Vec<SkippedSession>,
    pub errors: Vec<PipelineError>,
}

impl ProfileReport {
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn profile(&self, method: &str) -> Option<&MethodProfile> {
        self.profiles.get(method)
    }

    /// Methods ordered by descending self time.
    pub fn hottest(&self, limit: usize) -> Vec<(&str, &MethodProfile)> {
        let mut methods: Vec<(&str, &MethodProfile)> =
            self.profiles.iter().map(|(m, p)| (m.as_str(), p)).collect();
        methods.sort_by(|a, b| b.1.self_time.cmp(&a.1.self_time).then_with(|| a.0.cmp(b.0)));
        methods.truncate(limit);
        methods
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileAnalyzer {
    assembler: TraceAssembler,
    filter: Option<OutlierFilter>,
    retain_samples: bool,
    events: EventDispatcher,
}

impl ProfileAnalyzer {
    pub fn new(filter: Option<OutlierFilter>) -> Self {
        Self {
            retain_samples: filter.is_some(),
            filter,
            ..Self::default()
        }
    }

    /// Samples are retained whenever the outlier filter or a rank-based
    /// comparator needs them.
    pub fn from_config(config: &PerfscopeConfig) -> Self {
        let filter = OutlierFilter::from_config(&config.analysis);
        let needs_samples = filter.is_some()
            || config.comparison.effective_method() == ComparisonMethod::MannWhitney;
        Self::new(filter).retain_samples(needs_samples)
    }

    pub fn retain_samples(mut self, retain: bool) -> Self {
        self.retain_samples = retain || self.filter.is_some();
        self
    }

    pub fn with_dispatcher(mut self, events: EventDispatcher) -> Self {
        self.assembler = TraceAssembler::with_dispatcher(events.clone());
        self.events = events;
        self
    }

    pub fn filter(&self) -> Option<&OutlierFilter> {
        self.filter.as_ref()
    }

    /// Assemble and aggregate every session of `base_path`.
    pub fn analyze(&self, base_path: &Path) -> ProfileReport {
        let started = Instant::now();
        let assembled = self.assembler.assemble(base_path);

        let mut report = self.analyze_assembled(&assembled.data);
        report.trace_base = base_path.to_path_buf();
        report.errors = assembled.errors;
        for error in &report.errors {
            self.events.emit_error(&ErrorEvent {
                message: error.to_string(),
                error_code: error.error_code().to_string(),
            });
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            base = %base_path.display(),
            sessions = report.stats.sessions,
            methods = report.profiles.len(),
            discarded_exits = report.stats.discarded_exits,
            malformed = report.malformed_lines,
            duration_ms,
            "trace analysis complete"
        );
        if let Some((method, hottest)) = report.hottest(1).first() {
            tracing::debug!(method, self_time = %format_nanos(hottest.self_time as f64), "hottest method");
        }
        self.events.emit_analysis_complete(&AnalysisCompleteEvent {
            trace_base: report.trace_base.clone(),
            sessions: report.stats.sessions,
            methods: report.profiles.len(),
            discarded_exits: report.stats.discarded_exits,
            duration_ms,
        });
        report
    }

    /// Aggregate already assembled sessions, one fresh stack per session.
    pub fn analyze_assembled(&self, assembled: &AssembledTrace) -> ProfileReport {
        let mut accumulator = ProfileAccumulator::default();
        for session in &assembled.sessions {
            accumulator.merge(ProfileAccumulator::from_session(
                &session.events,
                self.retain_samples,
            ));
        }

        let finalized = accumulator.finalize(self.filter.as_ref());
        ProfileReport {
            trace_base: PathBuf::new(),
            profiles: finalized.profiles,
            samples: finalized.samples,
            stats: accumulator.stats,
            malformed_lines: assembled.malformed_lines(),
            skipped_sessions: assembled.skipped.clone(),
            errors: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use perfscope_core::types::TraceEvent;

    use super::*;
    use crate::trace::SessionTrace;

    fn session(key: &str, events: Vec<TraceEvent>) -> SessionTrace {
        SessionTrace {
            key: key.to_string(),
            events,
            ..SessionTrace::default()
        }
    }

    #[test]
    fn sessions_are_aggregated_independently() {
        let assembled = AssembledTrace {
            sessions: vec![
                session("1", vec![TraceEvent::enter(0, "A")]),
                session("2", vec![TraceEvent::exit(50, "A"), TraceEvent::enter(60, "A"), TraceEvent::exit(70, "A")]),
            ],
            skipped: Vec::new(),
        };
        let report = ProfileAnalyzer::new(None).analyze_assembled(&assembled);
        let a = report.profile("A").unwrap();
        assert_eq!(a.total_time, 10);
        assert_eq!(a.call_count, 2);
        assert_eq!(report.stats.discarded_exits, 1);
        assert_eq!(report.stats.unclosed_frames, 1);
        assert!(report.samples.is_empty());
    }

    #[test]
    fn mann_whitney_config_retains_samples() {
        let mut config = PerfscopeConfig::default();
        config.analysis.remove_outliers = Some(false);
        config.comparison.method = Some(ComparisonMethod::MannWhitney);
        let analyzer = ProfileAnalyzer::from_config(&config);
        assert!(analyzer.filter().is_none());

        let assembled = AssembledTrace {
            sessions: vec![session("", vec![TraceEvent::enter(0, "A"), TraceEvent::exit(5, "A")])],
            skipped: Vec::new(),
        };
        let report = analyzer.analyze_assembled(&assembled);
        assert_eq!(report.samples["A"], vec![5]);
    }

    #[test]
    fn hottest_orders_by_self_time() {
        let assembled = AssembledTrace {
            sessions: vec![session(
                "",
                vec![
                    TraceEvent::enter(0, "A"),
                    TraceEvent::enter(10, "B"),
                    TraceEvent::exit(90, "B"),
                    TraceEvent::exit(100, "A"),
                ],
            )],
            skipped: Vec::new(),
        };
        let report = ProfileAnalyzer::new(None).analyze_assembled(&assembled);
        let hottest: Vec<&str> = report.hottest(5).into_iter().map(|(m, _)| m).collect();
        assert_eq!(hottest, vec!["B", "A"]);
    }
}
