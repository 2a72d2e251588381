//! Call-Stack Aggregator.
//!
//! Matches ENTER/EXIT pairs with an explicit stack per session. A caller's
//! self time is decremented by each completed child's duration as soon as the
//! child exits, so self time never includes time spent in callees.
//!
//! Each capture session gets a fresh aggregator; results are combined with
//! [`ProfileAccumulator::merge`] so frames never leak across a process restart.

use std::collections::BTreeMap;

use perfscope_core::types::collections::{fx_map_with_capacity, FxHashMap};
use perfscope_core::types::{EventKind, MethodProfile, TraceEvent};
use smallvec::SmallVec;

use super::outliers::OutlierFilter;

/// One completed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSample {
    /// `exit - enter`.
    pub duration: i64,
    /// `duration` minus the durations of completed direct callees.
    pub self_duration: i64,
}

/// Running totals for one method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodAccumulator {
    pub total_time: i64,
    pub self_time: i64,
    /// ENTER events seen.
    pub call_count: u64,
    /// Matched EXIT events seen.
    pub completed: u64,
    pub min_time: Option<i64>,
    pub max_time: Option<i64>,
    /// Only populated when samples are retained.
    pub samples: Vec<CallSample>,
}

impl MethodAccumulator {
    fn record_exit(&mut self, duration: i64) {
        self.total_time = self.total_time.saturating_add(duration);
        self.completed += 1;
        self.min_time = Some(self.min_time.map_or(duration, |m| m.min(duration)));
        self.max_time = Some(self.max_time.map_or(duration, |m| m.max(duration)));
    }

    fn merge(&mut self, other: MethodAccumulator) {
        self.total_time = self.total_time.saturating_add(other.total_time);
        self.self_time = self.self_time.saturating_add(other.self_time);
        self.call_count += other.call_count;
        self.completed += other.completed;
        self.min_time = match (self.min_time, other.min_time) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max_time = match (self.max_time, other.max_time) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.samples.extend(other.samples);
    }

    /// Profile from running totals. `None` if no call ever completed.
    fn to_profile(&self) -> Option<MethodProfile> {
        if self.completed == 0 {
            return None;
        }
        Some(MethodProfile {
            total_time: self.total_time,
            self_time: self.self_time,
            average_self_time: self.self_time as f64 / self.call_count.max(1) as f64,
            min_time: self.min_time.unwrap_or_default(),
            max_time: self.max_time.unwrap_or_default(),
            call_count: self.call_count,
        })
    }

    /// Profile from the samples that survive `filter`. Returns the kept
    /// durations alongside.
    fn to_filtered_profile(&self, filter: &OutlierFilter) -> Option<(MethodProfile, Vec<i64>)> {
        if self.completed == 0 {
            return None;
        }
        let durations: Vec<f64> = self.samples.iter().map(|s| s.duration as f64).collect();
        let mask = filter.retain_mask(&durations);
        let kept: Vec<CallSample> = self
            .samples
            .iter()
            .zip(mask)
            .filter_map(|(s, keep)| keep.then_some(*s))
            .collect();

        if kept.is_empty() {
            return Some((MethodProfile::empty(), Vec::new()));
        }

        let total_time = kept.iter().fold(0i64, |acc, s| acc.saturating_add(s.duration));
        let self_time = kept.iter().fold(0i64, |acc, s| acc.saturating_add(s.self_duration));
        let call_count = kept.len() as u64;
        let profile = MethodProfile {
            total_time,
            self_time,
            average_self_time: self_time as f64 / call_count as f64,
            min_time: kept.iter().map(|s| s.duration).min().unwrap_or_default(),
            max_time: kept.iter().map(|s| s.duration).max().unwrap_or_default(),
            call_count,
        };
        Some((profile, kept.iter().map(|s| s.duration).collect()))
    }
}

/// Degraded-data counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationStats {
    pub sessions: usize,
    pub events: usize,
    /// EXIT events whose method was not on top of the stack.
    pub discarded_exits: usize,
    /// Frames still open when a session ended.
    pub unclosed_frames: usize,
}

impl AggregationStats {
    fn merge(&mut self, other: AggregationStats) {
        self.sessions += other.sessions;
        self.events += other.events;
        self.discarded_exits += other.discarded_exits;
        self.unclosed_frames += other.unclosed_frames;
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    method: usize,
    enter_timestamp: i64,
    child_time: i64,
}

/// Aggregates one session's events. Not reusable across sessions.
#[derive(Debug)]
pub struct CallStackAggregator {
    ids: FxHashMap<String, usize>,
    names: Vec<String>,
    methods: Vec<MethodAccumulator>,
    stack: SmallVec<[Frame; 32]>,
    retain_samples: bool,
    stats: AggregationStats,
}

impl CallStackAggregator {
    pub fn new(retain_samples: bool) -> Self {
        Self {
            ids: fx_map_with_capacity(64),
            names: Vec::new(),
            methods: Vec::new(),
            stack: SmallVec::new(),
            retain_samples,
            stats: AggregationStats {
                sessions: 1,
                ..AggregationStats::default()
            },
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push(&mut self, event: &TraceEvent) {
        self.stats.events += 1;
        match event.kind {
            EventKind::Enter => self.enter(&event.method, event.timestamp),
            EventKind::Exit => self.exit(&event.method, event.timestamp),
        }
    }

    pub fn extend<'a>(&mut self, events: impl IntoIterator<Item = &'a TraceEvent>) {
        for event in events {
            self.push(event);
        }
    }

    fn enter(&mut self, method: &str, timestamp: i64) {
        let id = self.intern(method);
        self.methods[id].call_count += 1;
        self.stack.push(Frame {
            method: id,
            enter_timestamp: timestamp,
            child_time: 0,
        });
    }

    fn exit(&mut self, method: &str, timestamp: i64) {
        let matches_top = match (self.ids.get(method), self.stack.last()) {
            (Some(&id), Some(top)) => top.method == id,
            _ => false,
        };
        if !matches_top {
            self.stats.discarded_exits += 1;
            tracing::trace!(method, timestamp, "discarding unmatched exit");
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };

        // Timestamps are non-decreasing within a session; clamp anything else.
        let duration = timestamp.saturating_sub(frame.enter_timestamp).max(0);
        let self_duration = duration.saturating_sub(frame.child_time);
        let acc = &mut self.methods[frame.method];
        acc.record_exit(duration);
        acc.self_time = acc.self_time.saturating_add(self_duration);
        if self.retain_samples {
            acc.samples.push(CallSample { duration, self_duration });
        }

        if let Some(parent) = self.stack.last_mut() {
            parent.child_time = parent.child_time.saturating_add(duration);
        }
    }

    fn intern(&mut self, method: &str) -> usize {
        if let Some(&id) = self.ids.get(method) {
            return id;
        }
        let id = self.names.len();
        self.ids.insert(method.to_string(), id);
        self.names.push(method.to_string());
        self.methods.push(MethodAccumulator::default());
        id
    }

    /// Close the session. Open frames are dropped; their ENTERs still count
    /// toward `call_count`, but they add nothing to total or self time, and
    /// the callees they saw complete are charged only to the callees.
    pub fn finish(self) -> ProfileAccumulator {
        let mut stats = self.stats;
        stats.unclosed_frames = self.stack.len();
        if !self.stack.is_empty() {
            tracing::debug!(open = self.stack.len(), "session ended with open frames");
        }
        ProfileAccumulator {
            methods: self.names.into_iter().zip(self.methods).collect(),
            stats,
        }
    }
}

/// Accumulators for one or more sessions, keyed by method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileAccumulator {
    pub methods: BTreeMap<String, MethodAccumulator>,
    pub stats: AggregationStats,
}

/// Finalized profiles plus the duration samples behind them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinalizedProfiles {
    pub profiles: BTreeMap<String, MethodProfile>,
    pub samples: BTreeMap<String, Vec<i64>>,
}

impl ProfileAccumulator {
    /// Aggregate a single session's events.
    pub fn from_session<'a>(
        events: impl IntoIterator<Item = &'a TraceEvent>,
        retain_samples: bool,
    ) -> Self {
        let mut aggregator = CallStackAggregator::new(retain_samples);
        aggregator.extend(events);
        aggregator.finish()
    }

    pub fn merge(&mut self, other: ProfileAccumulator) {
        for (method, acc) in other.methods {
            self.methods.entry(method).or_default().merge(acc);
        }
        self.stats.merge(other.stats);
    }

    /// Produce a profile for every method with at least one completed call.
    ///
    /// With a filter, statistics are recomputed from the surviving samples and
    /// `call_count` is the number of samples kept; a method whose samples were
    /// all discarded reports [`MethodProfile::empty`].
    pub fn finalize(&self, filter: Option<&OutlierFilter>) -> FinalizedProfiles {
        let mut out = FinalizedProfiles::default();
        for (method, acc) in &self.methods {
            match filter {
                Some(filter) => {
                    if let Some((profile, kept)) = acc.to_filtered_profile(filter) {
                        out.profiles.insert(method.clone(), profile);
                        out.samples.insert(method.clone(), kept);
                    }
                }
                None => {
                    if let Some(profile) = acc.to_profile() {
                        out.profiles.insert(method.clone(), profile);
                        if !acc.samples.is_empty() {
                            out.samples.insert(
                                method.clone(),
                                acc.samples.iter().map(|s| s.duration).collect(),
                            );
                        }
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiles(events: &[TraceEvent]) -> BTreeMap<String, MethodProfile> {
        ProfileAccumulator::from_session(events, false)
            .finalize(None)
            .profiles
    }

    #[test]
    fn single_call() {
        let p = profiles(&[TraceEvent::enter(10, "A"), TraceEvent::exit(35, "A")]);
        let a = &p["A"];
        assert_eq!(a.total_time, 25);
        assert_eq!(a.self_time, 25);
        assert_eq!(a.min_time, 25);
        assert_eq!(a.max_time, 25);
        assert_eq!(a.call_count, 1);
        assert_eq!(a.average_self_time, 25.0);
    }

    #[test]
    fn nested_call_subtracts_child_from_parent() {
        let p = profiles(&[
            TraceEvent::enter(0, "A"),
            TraceEvent::enter(10, "B"),
            TraceEvent::exit(40, "B"),
            TraceEvent::exit(100, "A"),
        ]);
        assert_eq!(p["A"].total_time, 100);
        assert_eq!(p["B"].total_time, 30);
        assert_eq!(p["A"].self_time, p["A"].total_time - p["B"].total_time);
        assert_eq!(p["B"].self_time, p["B"].total_time);
    }

    #[test]
    fn recursion_counts_each_frame() {
        let p = profiles(&[
            TraceEvent::enter(0, "F"),
            TraceEvent::enter(10, "F"),
            TraceEvent::exit(20, "F"),
            TraceEvent::exit(50, "F"),
        ]);
        let f = &p["F"];
        assert_eq!(f.call_count, 2);
        assert_eq!(f.total_time, 60);
        // Inner 10 counted once as self; outer contributes 50 - 10.
        assert_eq!(f.self_time, 50);
        assert_eq!(f.min_time, 10);
        assert_eq!(f.max_time, 50);
    }

    #[test]
    fn unmatched_exit_is_discarded() {
        let acc = ProfileAccumulator::from_session(
            &[
                TraceEvent::enter(0, "A"),
                TraceEvent::exit(5, "B"),
                TraceEvent::exit(9, "A"),
                TraceEvent::exit(12, "A"),
            ],
            false,
        );
        assert_eq!(acc.stats.discarded_exits, 2);
        let p = acc.finalize(None).profiles;
        assert_eq!(p.len(), 1);
        assert_eq!(p["A"].total_time, 9);
    }

    #[test]
    fn methods_without_completed_calls_are_omitted() {
        let acc = ProfileAccumulator::from_session(
            &[
                TraceEvent::enter(0, "Outer"),
                TraceEvent::enter(5, "Inner"),
                TraceEvent::exit(8, "Inner"),
            ],
            false,
        );
        assert_eq!(acc.stats.unclosed_frames, 1);
        let p = acc.finalize(None).profiles;
        assert!(p.contains_key("Inner"));
        assert!(!p.contains_key("Outer"));
    }

    #[test]
    fn merge_combines_sessions_without_crossing_stacks() {
        // Session 1 leaves A open; session 2 starts with an EXIT for A.
        let mut acc = ProfileAccumulator::from_session(
            &[TraceEvent::enter(0, "A"), TraceEvent::enter(1, "B"), TraceEvent::exit(4, "B")],
            false,
        );
        acc.merge(ProfileAccumulator::from_session(
            &[TraceEvent::exit(100, "A"), TraceEvent::enter(0, "B"), TraceEvent::exit(7, "B")],
            false,
        ));
        assert_eq!(acc.stats.sessions, 2);
        assert_eq!(acc.stats.discarded_exits, 1);
        let p = acc.finalize(None).profiles;
        assert!(!p.contains_key("A"));
        assert_eq!(p["B"].call_count, 2);
        assert_eq!(p["B"].total_time, 10);
        assert_eq!(p["B"].min_time, 3);
        assert_eq!(p["B"].max_time, 7);
    }

    #[test]
    fn open_caller_keeps_self_time_within_total() {
        // Session 1 is killed while A waits on a long callee.
        let mut acc = ProfileAccumulator::from_session(
            &[TraceEvent::enter(0, "A"), TraceEvent::enter(0, "B"), TraceEvent::exit(500, "B")],
            true,
        );
        acc.merge(ProfileAccumulator::from_session(
            &[TraceEvent::enter(0, "A"), TraceEvent::exit(100, "A")],
            true,
        ));
        assert_eq!(acc.stats.unclosed_frames, 1);

        let plain = acc.finalize(None).profiles;
        let a = &plain["A"];
        assert_eq!(a.call_count, 2);
        assert_eq!(a.total_time, 100);
        assert_eq!(a.self_time, 100);
        assert!(a.average_self_time >= 0.0);
        assert_eq!(plain["B"].self_time, 500);

        let samples_only = acc.finalize(Some(&OutlierFilter::new(f64::INFINITY, 2))).profiles;
        assert_eq!(samples_only["A"].self_time, a.self_time);
        assert_eq!(samples_only["B"].self_time, plain["B"].self_time);
    }

    #[test]
    fn filtered_profile_uses_kept_samples() {
        let mut events = Vec::new();
        let mut ts = 0;
        for _ in 0..20 {
            events.push(TraceEvent::enter(ts, "M"));
            ts += 100;
            events.push(TraceEvent::exit(ts, "M"));
        }
        events.push(TraceEvent::enter(ts, "M"));
        events.push(TraceEvent::exit(ts + 10_000, "M"));

        let acc = ProfileAccumulator::from_session(&events, true);
        let finalized = acc.finalize(Some(&OutlierFilter::default()));
        let m = &finalized.profiles["M"];
        assert_eq!(m.call_count, 20);
        assert_eq!(m.total_time, 2_000);
        assert_eq!(m.max_time, 100);
        assert_eq!(finalized.samples["M"].len(), 20);
    }
}
