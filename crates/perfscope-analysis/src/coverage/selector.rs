//! Benchmark Coverage Selector: greedy weighted set cover with a duration
//! tie-break and a substitution rule for much slower equal-coverage picks.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use perfscope_core::config::SelectionConfig;
use perfscope_core::events::types::{BenchmarkSelectedEvent, CoverageGapEvent};
use perfscope_core::events::EventDispatcher;
use perfscope_core::types::{BenchmarkCoverage, CommitId, MethodSignature, SelectionResult};

/// One iteration of the greedy loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionStep {
    pub benchmark: String,
    pub newly_covered: usize,
    /// The higher-ranked benchmark this one replaced, if the substitution
    /// rule fired.
    pub substituted_for: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// `commit -> benchmark -> methods that benchmark must cover`.
    pub assignments: SelectionResult,
    /// Targets no candidate benchmark reaches, per commit.
    pub uncovered: BTreeMap<CommitId, BTreeSet<MethodSignature>>,
    pub steps: Vec<SelectionStep>,
}

impl Selection {
    /// Every target of every commit is assigned to some benchmark.
    pub fn is_complete(&self) -> bool {
        self.uncovered.is_empty()
    }

    pub fn iterations(&self) -> usize {
        self.steps.len()
    }

    /// Selected benchmark names, across all commits.
    pub fn benchmarks(&self) -> BTreeSet<&str> {
        self.steps.iter().map(|s| s.benchmark.as_str()).collect()
    }

    pub fn uncovered_count(&self) -> usize {
        self.uncovered.values().map(BTreeSet::len).sum()
    }
}

#[derive(Debug, Clone)]
pub struct CoverageSelector {
    significance_factor: f64,
    events: EventDispatcher,
}

impl Default for CoverageSelector {
    fn default() -> Self {
        Self::from_config(&SelectionConfig::default())
    }
}

impl CoverageSelector {
    /// `significance_factor`: a top-ranked benchmark is swapped for the
    /// fastest equal-coverage alternative when it is more than this many
    /// times slower.
    pub fn new(significance_factor: f64) -> Self {
        Self {
            significance_factor,
            events: EventDispatcher::default(),
        }
    }

    pub fn from_config(config: &SelectionConfig) -> Self {
        Self::new(config.effective_significance_factor())
    }

    pub fn with_dispatcher(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    /// Select benchmarks for changed-method lists as produced by the change
    /// miner.
    pub fn select_for_changes(
        &self,
        changed: &BTreeMap<CommitId, Vec<MethodSignature>>,
        benchmarks: &[BenchmarkCoverage],
    ) -> Selection {
        let targets: BTreeMap<CommitId, BTreeSet<MethodSignature>> = changed
            .iter()
            .map(|(commit, methods)| (commit.clone(), methods.iter().cloned().collect()))
            .collect();
        self.select(&targets, benchmarks)
    }

    /// Run the greedy loop until every target is covered or no remaining
    /// benchmark adds coverage. Terminates after at most `benchmarks.len()`
    /// iterations.
    pub fn select(
        &self,
        targets: &BTreeMap<CommitId, BTreeSet<MethodSignature>>,
        benchmarks: &[BenchmarkCoverage],
    ) -> Selection {
        let mut selection = Selection::default();
        let mut covered: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

        let mut remaining: Vec<&BenchmarkCoverage> = benchmarks.iter().collect();
        remaining.sort_by(|a, b| a.benchmark_name.cmp(&b.benchmark_name));

        while !remaining.is_empty() && !fully_covered(targets, &covered) {
            let counts: Vec<usize> = remaining
                .iter()
                .map(|b| new_coverage(b, targets, &covered).values().map(Vec::len).sum())
                .collect();

            let Some(best) = rank_best(&remaining, &counts) else {
                break;
            };
            let best_count = counts[best];
            if best_count == 0 {
                break;
            }

            let chosen = self.apply_substitution(&remaining, &counts, best);
            let substituted_for =
                (chosen != best).then(|| remaining[best].benchmark_name.clone());
            if let Some(slower) = &substituted_for {
                tracing::debug!(
                    chosen = %remaining[chosen].benchmark_name,
                    replaced = %slower,
                    "substituted significantly faster equal-coverage benchmark"
                );
            }

            let benchmark = remaining.remove(chosen);
            let gained = new_coverage(benchmark, targets, &covered);
            for (commit, methods) in gained {
                let assigned = selection
                    .assignments
                    .entry(commit.to_string())
                    .or_default()
                    .entry(benchmark.benchmark_name.clone())
                    .or_default();
                for method in methods {
                    assigned.insert(method.to_string());
                    covered.entry(commit).or_default().insert(method);
                }
            }

            tracing::debug!(
                benchmark = %benchmark.benchmark_name,
                newly_covered = best_count,
                probe_duration = benchmark.probe_duration,
                "benchmark selected"
            );
            self.events.emit_benchmark_selected(&BenchmarkSelectedEvent {
                benchmark: benchmark.benchmark_name.clone(),
                newly_covered: best_count,
                probe_duration: benchmark.probe_duration,
            });
            selection.steps.push(SelectionStep {
                benchmark: benchmark.benchmark_name.clone(),
                newly_covered: best_count,
                substituted_for,
            });
        }

        for (commit, wanted) in targets {
            let done = covered.get(commit.as_str());
            let residual: BTreeSet<MethodSignature> = wanted
                .iter()
                .filter(|m| !done.is_some_and(|d| d.contains(m.as_str())))
                .cloned()
                .collect();
            if residual.is_empty() {
                continue;
            }
            tracing::warn!(commit = %commit, uncovered = residual.len(), "changed methods not reached by any benchmark");
            self.events.emit_coverage_gap(&CoverageGapEvent {
                commit: commit.clone(),
                uncovered: residual.iter().cloned().collect(),
            });
            selection.uncovered.insert(commit.clone(), residual);
        }

        tracing::info!(
            benchmarks = selection.steps.len(),
            candidates = benchmarks.len(),
            uncovered = selection.uncovered_count(),
            "benchmark selection complete"
        );
        selection
    }

    /// Among benchmarks with the same new-coverage count as `best`, pick the
    /// fastest one if `best` is more than `significance_factor` times slower.
    fn apply_substitution(&self, remaining: &[&BenchmarkCoverage], counts: &[usize], best: usize) -> usize {
        let fastest_alternative = remaining
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != best && counts[i] == counts[best])
            .min_by(|a, b| compare_duration(a.1, b.1));

        match fastest_alternative {
            Some((i, alt)) if remaining[best].probe_duration > alt.probe_duration * self.significance_factor => i,
            _ => best,
        }
    }
}

/// Highest count wins, then lower probe duration, then name.
fn rank_best(remaining: &[&BenchmarkCoverage], counts: &[usize]) -> Option<usize> {
    (0..remaining.len()).min_by(|&a, &b| {
        counts[b]
            .cmp(&counts[a])
            .then_with(|| compare_duration(remaining[a], remaining[b]))
    })
}

fn compare_duration(a: &BenchmarkCoverage, b: &BenchmarkCoverage) -> Ordering {
    a.probe_duration
        .total_cmp(&b.probe_duration)
        .then_with(|| a.benchmark_name.cmp(&b.benchmark_name))
}

/// Targets `benchmark` would newly cover, per commit. Coverage for commits
/// that are not targets is ignored.
fn new_coverage<'a>(
    benchmark: &'a BenchmarkCoverage,
    targets: &'a BTreeMap<CommitId, BTreeSet<MethodSignature>>,
    covered: &BTreeMap<&str, BTreeSet<&str>>,
) -> BTreeMap<&'a str, Vec<&'a str>> {
    let mut gained = BTreeMap::new();
    for (commit, reached) in &benchmark.targets_by_commit {
        let Some((commit_key, wanted)) = targets.get_key_value(commit) else {
            continue;
        };
        let done = covered.get(commit.as_str());
        let fresh: Vec<&str> = reached
            .iter()
            .filter_map(|m| wanted.get(m))
            .map(String::as_str)
            .filter(|m| !done.is_some_and(|d| d.contains(m)))
            .collect();
        if !fresh.is_empty() {
            gained.insert(commit_key.as_str(), fresh);
        }
    }
    gained
}

fn fully_covered(
    targets: &BTreeMap<CommitId, BTreeSet<MethodSignature>>,
    covered: &BTreeMap<&str, BTreeSet<&str>>,
) -> bool {
    targets.iter().all(|(commit, wanted)| {
        let done = covered.get(commit.as_str());
        wanted
            .iter()
            .all(|m| done.is_some_and(|d| d.contains(m.as_str())))
    })
}
