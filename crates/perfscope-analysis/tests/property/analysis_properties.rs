use std::collections::{BTreeMap, BTreeSet};

use perfscope_analysis::coverage::CoverageSelector;
use perfscope_analysis::profile::{OutlierFilter, ProfileAccumulator};
use perfscope_core::types::{BenchmarkCoverage, TraceEvent};
use proptest::prelude::*;

/// Turn push/pop choices into a balanced, time-ordered event sequence.
fn balanced_events(ops: &[(bool, u8, u16)]) -> Vec<TraceEvent> {
    let mut events = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut ts = 0i64;
    for (push, method, gap) in ops {
        ts += i64::from(*gap);
        if *push || stack.is_empty() {
            let name = format!("m{}", method % 5);
            events.push(TraceEvent::enter(ts, name.clone()));
            stack.push(name);
        } else if let Some(name) = stack.pop() {
            events.push(TraceEvent::exit(ts, name));
        }
    }
    while let Some(name) = stack.pop() {
        ts += 1;
        events.push(TraceEvent::exit(ts, name));
    }
    events
}

/// Durations of calls made at stack depth zero.
fn top_level_time(events: &[TraceEvent]) -> i64 {
    let mut depth = 0usize;
    let mut started = 0i64;
    let mut total = 0i64;
    for event in events {
        match event.kind {
            perfscope_core::types::EventKind::Enter => {
                if depth == 0 {
                    started = event.timestamp;
                }
                depth += 1;
            }
            perfscope_core::types::EventKind::Exit => {
                depth -= 1;
                if depth == 0 {
                    total += event.timestamp - started;
                }
            }
        }
    }
    total
}

fn coverage_case() -> impl Strategy<Value = (BTreeMap<String, BTreeSet<String>>, Vec<BenchmarkCoverage>)> {
    let benchmark = (
        prop::collection::btree_set((0u8..2, 0u8..12), 0..10),
        1u32..1_000,
    );
    prop::collection::vec(benchmark, 0..8).prop_map(|raw| {
        let targets: BTreeMap<String, BTreeSet<String>> = BTreeMap::from([
            ("c0".to_string(), (0..8).map(|m| format!("m{m}")).collect()),
            ("c1".to_string(), (0..6).map(|m| format!("m{m}")).collect()),
        ]);
        let benchmarks: Vec<BenchmarkCoverage> = raw
            .into_iter()
            .enumerate()
            .map(|(i, (reached, duration))| {
                reached.into_iter().fold(
                    BenchmarkCoverage::new(format!("B{i}"), f64::from(duration) / 10.0),
                    |cov, (commit, method)| cov.with_targets(format!("c{commit}"), [format!("m{method}")]),
                )
            })
            .collect();
        (targets, benchmarks)
    })
}

/// Population mean and deviation, or `None` when the deviation is too small
/// to compare z-scores reliably.
fn population_stats(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sd = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    (sd > 1e-6 * mean.abs().max(1.0)).then_some((mean, sd))
}

proptest! {
    #[test]
    fn flat_calls_have_equal_total_and_self(durations in prop::collection::vec(0i64..10_000, 1..50)) {
        let mut events = Vec::new();
        let mut ts = 0;
        for d in &durations {
            events.push(TraceEvent::enter(ts, "A"));
            ts += d;
            events.push(TraceEvent::exit(ts, "A"));
            ts += 3;
        }
        let profiles = ProfileAccumulator::from_session(&events, false).finalize(None).profiles;
        let a = &profiles["A"];
        prop_assert_eq!(a.total_time, durations.iter().sum::<i64>());
        prop_assert_eq!(a.self_time, a.total_time);
        prop_assert_eq!(a.call_count, durations.len() as u64);
        prop_assert_eq!(a.min_time, *durations.iter().min().unwrap());
        prop_assert_eq!(a.max_time, *durations.iter().max().unwrap());
    }

    #[test]
    fn self_time_is_conserved(ops in prop::collection::vec((any::<bool>(), any::<u8>(), 0u16..1_000), 0..200)) {
        let events = balanced_events(&ops);
        let acc = ProfileAccumulator::from_session(&events, false);
        prop_assert_eq!(acc.stats.discarded_exits, 0);
        prop_assert_eq!(acc.stats.unclosed_frames, 0);

        let profiles = acc.finalize(None).profiles;
        let self_sum: i64 = profiles.values().map(|p| p.self_time).sum();
        prop_assert_eq!(self_sum, top_level_time(&events));
        for p in profiles.values() {
            prop_assert!(p.self_time >= 0);
            prop_assert!(p.self_time <= p.total_time);
        }
    }

    #[test]
    fn retained_samples_agree_with_running_totals(ops in prop::collection::vec((any::<bool>(), any::<u8>(), 0u16..1_000), 0..200)) {
        let events = balanced_events(&ops);
        let plain = ProfileAccumulator::from_session(&events, false).finalize(None).profiles;
        // A threshold no sample can reach keeps everything.
        let keep_all = OutlierFilter::new(f64::INFINITY, 2);
        let filtered = ProfileAccumulator::from_session(&events, true).finalize(Some(&keep_all)).profiles;
        prop_assert_eq!(plain, filtered);
    }

    #[test]
    fn small_samples_are_never_filtered(values in prop::collection::vec(-1e9f64..1e9, 0..10)) {
        // Population |z| is bounded by sqrt(n - 1) < 3 for n <= 9.
        prop_assert_eq!(OutlierFilter::default().filter(&values), values);
    }

    #[test]
    fn filtered_samples_are_within_threshold(values in prop::collection::vec(0f64..1e6, 0..200)) {
        let filter = OutlierFilter::default();
        let mask = filter.retain_mask(&values);
        prop_assert_eq!(mask.len(), values.len());

        // Whatever the first pass would drop stays dropped.
        if let Some((mean, sd)) = population_stats(&values) {
            for (v, keep) in values.iter().zip(&mask) {
                if ((v - mean) / sd).abs() > 3.0 + 1e-9 {
                    prop_assert!(!*keep);
                }
            }
        }

        // Survivors are all within the threshold of their own statistics.
        let kept: Vec<f64> = values.iter().zip(&mask).filter_map(|(v, k)| k.then_some(*v)).collect();
        if let Some((mean, sd)) = population_stats(&kept) {
            for v in &kept {
                prop_assert!(((v - mean) / sd).abs() < 3.0 + 1e-9);
            }
        }
    }

    #[test]
    fn outlier_removal_is_idempotent(
        base in prop::collection::vec(0f64..1e3, 0..150),
        spikes in prop::collection::vec(1e4f64..1e7, 0..6),
    ) {
        let values: Vec<f64> = base.into_iter().chain(spikes).collect();
        let filter = OutlierFilter::default();
        let once = filter.filter(&values);
        prop_assert_eq!(filter.filter(&once), once);
    }

    #[test]
    fn selection_is_monotonic_and_partitions_targets((targets, benchmarks) in coverage_case()) {
        let selection = CoverageSelector::default().select(&targets, &benchmarks);
        prop_assert!(selection.iterations() <= benchmarks.len());
        prop_assert!(selection.steps.iter().all(|s| s.newly_covered > 0));

        for (commit, wanted) in &targets {
            let mut seen = BTreeSet::new();
            if let Some(per_benchmark) = selection.assignments.get(commit) {
                for (name, methods) in per_benchmark {
                    let benchmark = benchmarks.iter().find(|b| &b.benchmark_name == name).unwrap();
                    for m in methods {
                        prop_assert!(benchmark.targets_by_commit[commit].contains(m));
                        // Each method is assigned to exactly one benchmark.
                        prop_assert!(seen.insert(m.clone()));
                    }
                }
            }
            if let Some(residual) = selection.uncovered.get(commit) {
                for m in residual {
                    prop_assert!(seen.insert(m.clone()));
                }
            }
            prop_assert_eq!(&seen, wanted);
        }
    }

    #[test]
    fn single_full_benchmark_wins_in_one_iteration((targets, mut benchmarks) in coverage_case()) {
        let mut full = BenchmarkCoverage::new("Full", 5_000.0);
        for (commit, methods) in &targets {
            full = full.with_targets(commit.clone(), methods.iter().cloned());
        }
        // Make every other candidate strictly partial.
        for b in &mut benchmarks {
            if let Some(methods) = b.targets_by_commit.get_mut("c0") {
                methods.remove("m0");
            }
        }
        benchmarks.push(full);

        let selection = CoverageSelector::default().select(&targets, &benchmarks);
        prop_assert_eq!(selection.iterations(), 1);
        prop_assert_eq!(selection.steps[0].benchmark.as_str(), "Full");
        prop_assert!(selection.is_complete());
    }
}
