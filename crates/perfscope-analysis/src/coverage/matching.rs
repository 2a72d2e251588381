//! Matching changed-method signatures against methods a probe observed.
//!
//! Both sides are reduced to a qualified name: the text before the parameter
//! list, minus modifiers and return type, with `$` nested-class separators
//! turned into dots. A changed method given with a package/class qualifier
//! must match exactly; a bare method name matches any observed method with
//! that simple name.

use std::collections::{BTreeMap, BTreeSet};

use perfscope_core::types::collections::FxHashSet;
use perfscope_core::types::{BenchmarkCoverage, CommitId, MethodSignature, ProbeResult};

use super::probe::strip_parameters;

pub fn qualified_name(signature: &str) -> String {
    strip_parameters(signature)
        .split_whitespace()
        .last()
        .unwrap_or_default()
        .replace('$', ".")
}

pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

struct ObservedIndex {
    qualified: FxHashSet<String>,
    simple: FxHashSet<String>,
}

impl ObservedIndex {
    fn new(observed: &BTreeSet<String>) -> Self {
        let mut qualified = FxHashSet::default();
        let mut simple = FxHashSet::default();
        for method in observed {
            let name = qualified_name(method);
            if name.is_empty() {
                continue;
            }
            simple.insert(simple_name(&name).to_string());
            qualified.insert(name);
        }
        Self { qualified, simple }
    }

    fn reaches(&self, changed: &str) -> bool {
        let name = qualified_name(changed);
        if name.is_empty() {
            return false;
        }
        if name.contains('.') {
            self.qualified.contains(&name)
        } else {
            self.simple.contains(&name)
        }
    }
}

/// Changed methods, per commit, that a benchmark observed. Commits with no
/// reached methods are omitted.
pub fn match_changed_methods(
    changed: &BTreeMap<CommitId, Vec<MethodSignature>>,
    observed: &BTreeSet<String>,
) -> BTreeMap<CommitId, BTreeSet<MethodSignature>> {
    let index = ObservedIndex::new(observed);
    changed
        .iter()
        .filter_map(|(commit, methods)| {
            let reached: BTreeSet<MethodSignature> = methods
                .iter()
                .filter(|m| index.reaches(m))
                .cloned()
                .collect();
            (!reached.is_empty()).then(|| (commit.clone(), reached))
        })
        .collect()
}

/// Coverage for every probed benchmark that reaches at least one changed
/// method in at least one commit.
pub fn build_coverage(
    changed: &BTreeMap<CommitId, Vec<MethodSignature>>,
    probes: &[ProbeResult],
) -> Vec<BenchmarkCoverage> {
    probes
        .iter()
        .filter_map(|probe| {
            let targets_by_commit = match_changed_methods(changed, &probe.methods);
            if targets_by_commit.is_empty() {
                tracing::debug!(benchmark = %probe.benchmark, "benchmark reaches no changed method");
                return None;
            }
            Some(BenchmarkCoverage {
                benchmark_name: probe.benchmark.clone(),
                targets_by_commit,
                probe_duration: probe.duration_secs,
            })
        })
        .collect()
}
