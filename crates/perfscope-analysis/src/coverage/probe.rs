//! Probe runs: a single cheap iteration of a benchmark, analyzed with the
//! regular pipeline, to learn which methods it reaches.

use std::collections::BTreeSet;

use perfscope_core::types::ProbeResult;

use crate::profile::ProfileReport;

/// Method name without its parameter list.
pub fn strip_parameters(signature: &str) -> &str {
    signature
        .split_once('(')
        .map_or(signature, |(name, _)| name)
        .trim()
}

/// Every method that completed at least one call in the probe run.
pub fn observed_methods(report: &ProfileReport) -> BTreeSet<String> {
    report
        .profiles
        .keys()
        .map(|signature| strip_parameters(signature))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn probe_result(benchmark: impl Into<String>, report: &ProfileReport, duration_secs: f64) -> ProbeResult {
    ProbeResult {
        benchmark: benchmark.into(),
        methods: observed_methods(report),
        duration_secs,
    }
}
