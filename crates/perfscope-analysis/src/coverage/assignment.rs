//! Persisted coverage assignments: one JSON file per
//! (triggering commit, evaluated commit) pair, read by the benchmark runner.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use perfscope_core::errors::StorageError;
use perfscope_core::types::{BenchmarkCoverage, CommitId, MethodSignature};
use serde::{Deserialize, Serialize};

use super::selector::Selection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedBenchmark {
    pub methods: BTreeSet<MethodSignature>,
    pub probe_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageAssignment {
    pub triggering_commit: CommitId,
    pub evaluated_commit: CommitId,
    pub benchmarks: BTreeMap<String, AssignedBenchmark>,
    /// Changed methods of the evaluated commit no benchmark reaches.
    #[serde(default)]
    pub uncovered: BTreeSet<MethodSignature>,
}

/// One assignment per commit that has selected benchmarks or uncovered
/// methods.
pub fn assignments_for(
    triggering_commit: &str,
    selection: &Selection,
    coverage: &[BenchmarkCoverage],
) -> Vec<CoverageAssignment> {
    let durations: BTreeMap<&str, f64> = coverage
        .iter()
        .map(|c| (c.benchmark_name.as_str(), c.probe_duration))
        .collect();

    let commits: BTreeSet<&CommitId> = selection
        .assignments
        .keys()
        .chain(selection.uncovered.keys())
        .collect();

    commits
        .into_iter()
        .map(|commit| {
            let benchmarks = selection
                .assignments
                .get(commit)
                .map(|per_benchmark| {
                    per_benchmark
                        .iter()
                        .map(|(name, methods)| {
                            let assigned = AssignedBenchmark {
                                methods: methods.clone(),
                                probe_duration: durations.get(name.as_str()).copied().unwrap_or_default(),
                            };
                            (name.clone(), assigned)
                        })
                        .collect()
                })
                .unwrap_or_default();
            CoverageAssignment {
                triggering_commit: triggering_commit.to_string(),
                evaluated_commit: commit.clone(),
                benchmarks,
                uncovered: selection.uncovered.get(commit).cloned().unwrap_or_default(),
            }
        })
        .collect()
}

/// Write `dir/<triggering>/<evaluated>.json` for every assignment.
pub fn write_assignments(
    dir: &Path,
    triggering_commit: &str,
    selection: &Selection,
    coverage: &[BenchmarkCoverage],
) -> Result<Vec<PathBuf>, StorageError> {
    let target_dir = dir.join(triggering_commit);
    std::fs::create_dir_all(&target_dir).map_err(|e| StorageError::Io {
        path: target_dir.display().to_string(),
        message: e.to_string(),
    })?;

    let mut written = Vec::new();
    for assignment in assignments_for(triggering_commit, selection, coverage) {
        let path = target_dir.join(format!("{}.json", assignment.evaluated_commit));
        let json = serde_json::to_string_pretty(&assignment)
            .map_err(|e| StorageError::Serialization { message: e.to_string() })?;
        std::fs::write(&path, json).map_err(|e| StorageError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        written.push(path);
    }
    tracing::debug!(dir = %target_dir.display(), files = written.len(), "coverage assignments written");
    Ok(written)
}

pub fn read_assignment(path: &Path) -> Result<CoverageAssignment, StorageError> {
    let content = std::fs::read_to_string(path).map_err(|e| StorageError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| StorageError::Serialization { message: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::CoverageSelector;

    #[test]
    fn writes_one_file_per_evaluated_commit() {
        let coverage = vec![
            BenchmarkCoverage::new("B1", 2.0).with_targets("c1", ["foo()"]).with_targets("c0", ["foo()"]),
            BenchmarkCoverage::new("B2", 1.0).with_targets("c1", ["bar()"]),
        ];
        let changed = BTreeMap::from([
            ("c0".to_string(), vec!["foo()".to_string(), "gone()".to_string()]),
            ("c1".to_string(), vec!["foo()".to_string(), "bar()".to_string()]),
        ]);
        let selection = CoverageSelector::default().select_for_changes(&changed, &coverage);

        let dir = tempfile::tempdir().unwrap();
        let paths = write_assignments(dir.path(), "c1", &selection, &coverage).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("c1/c0.json"));

        let c0 = read_assignment(&paths[0]).unwrap();
        assert_eq!(c0.triggering_commit, "c1");
        assert_eq!(c0.benchmarks["B1"].probe_duration, 2.0);
        assert!(c0.uncovered.contains("gone()"));

        let c1 = read_assignment(&paths[1]).unwrap();
        assert_eq!(c1.benchmarks.len(), 2);
        assert!(c1.uncovered.is_empty());
    }
}
