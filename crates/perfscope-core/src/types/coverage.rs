//! Benchmark coverage and selection types.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Commit identifier (hex SHA).
pub type CommitId = String;

/// Fully-qualified method signature as reported by the change miner.
pub type MethodSignature = String;

/// `commit -> benchmark -> methods the benchmark is responsible for covering`.
pub type SelectionResult = BTreeMap<CommitId, BTreeMap<String, BTreeSet<MethodSignature>>>;

/// Which changed methods a benchmark reaches, per commit, and how long its
/// probe run took.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkCoverage {
    pub benchmark_name: String,
    pub targets_by_commit: BTreeMap<CommitId, BTreeSet<MethodSignature>>,
    /// Probe wall-clock duration in seconds.
    pub probe_duration: f64,
}

impl BenchmarkCoverage {
    pub fn new(benchmark_name: impl Into<String>, probe_duration: f64) -> Self {
        Self {
            benchmark_name: benchmark_name.into(),
            targets_by_commit: BTreeMap::new(),
            probe_duration,
        }
    }

    /// Builder-style helper: add the methods reached for one commit.
    pub fn with_targets<I, S>(mut self, commit: impl Into<CommitId>, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<MethodSignature>,
    {
        self.targets_by_commit
            .entry(commit.into())
            .or_default()
            .extend(methods.into_iter().map(Into::into));
        self
    }

    /// Total number of (commit, method) pairs this benchmark reaches.
    pub fn target_count(&self) -> usize {
        self.targets_by_commit.values().map(BTreeSet::len).sum()
    }
}

/// Result of a cheap single-iteration probe run of one benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub benchmark: String,
    /// Observed method names, parameter lists stripped.
    pub methods: BTreeSet<String>,
    /// Probe wall-clock duration in seconds.
    pub duration_secs: f64,
}
