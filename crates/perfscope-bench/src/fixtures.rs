//! Fixture generators. Deterministic: same seed, same output.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use perfscope_core::types::{BenchmarkCoverage, CommitId, MethodSignature};

/// Fixture size presets.
#[derive(Debug, Clone, Copy)]
pub enum FixtureSize {
    /// 2 sessions, ~200 calls each.
    Micro,
    /// 4 sessions, ~5K calls each.
    Small,
    /// 8 sessions, ~100K calls each.
    Medium,
}

impl FixtureSize {
    pub fn session_count(&self) -> usize {
        match self {
            Self::Micro => 2,
            Self::Small => 4,
            Self::Medium => 8,
        }
    }

    pub fn calls_per_session(&self) -> usize {
        match self {
            Self::Micro => 200,
            Self::Small => 5_000,
            Self::Medium => 100_000,
        }
    }
}

const METHOD_POOL: usize = 48;
const MAX_DEPTH: usize = 12;

/// One generated `<benchmark>_<key>.log` / `.json` pair.
#[derive(Debug, Clone)]
pub struct FixtureSession {
    pub key: String,
    pub log_path: PathBuf,
    pub metadata_path: PathBuf,
    pub events: usize,
}

/// A generated capture-session family.
#[derive(Debug, Clone)]
pub struct TraceFixture {
    /// Pass this to the assembler/analyzer.
    pub base_path: PathBuf,
    pub sessions: Vec<FixtureSession>,
    /// ENTER events per full method signature, across all sessions.
    pub call_counts: BTreeMap<String, u64>,
}

impl TraceFixture {
    pub fn total_events(&self) -> usize {
        self.sessions.iter().map(|s| s.events).sum()
    }
}

pub fn method_signature(index: usize) -> String {
    format!(
        "public void com.fixture.module{}.Service{}.operation{}(int)",
        index % 4,
        index % 7,
        index
    )
}

/// Write a family of balanced, nested call traces under `dir`, compacted
/// with short tokens and a per-session time offset.
pub fn generate_trace_family(dir: &Path, benchmark: &str, size: FixtureSize, seed: u64) -> TraceFixture {
    let _ = std::fs::create_dir_all(dir);
    let mut rng = SimpleRng::new(seed);
    let mut sessions = Vec::with_capacity(size.session_count());
    let mut call_counts: BTreeMap<String, u64> = BTreeMap::new();

    let dictionary: BTreeMap<String, String> = (0..METHOD_POOL)
        .map(|i| (method_signature(i), format!("{i:x}")))
        .collect();

    for s in 0..size.session_count() {
        let key = format!("{}", 1_700_000_000_000u64 + s as u64 * 1_000);
        let offset = (rng.next_u64() % 1_000_000_000) as i64;
        let mut log = String::with_capacity(size.calls_per_session() * 24);
        let mut stack: Vec<usize> = Vec::with_capacity(MAX_DEPTH);
        let mut ts: u64 = rng.next_u64() % 1_000;
        let mut enters = 0;
        let mut events = 0;

        while enters < size.calls_per_session() || !stack.is_empty() {
            ts += 1 + rng.next_u64() % 500;
            let can_enter = enters < size.calls_per_session() && stack.len() < MAX_DEPTH;
            let enter = can_enter && (stack.is_empty() || rng.next_u64() % 3 != 0);
            if enter {
                let method = (rng.next_u64() as usize) % METHOD_POOL;
                log.push_str(&format!("[{ts}] S {method:x}\n"));
                *call_counts.entry(method_signature(method)).or_default() += 1;
                stack.push(method);
                enters += 1;
            } else if let Some(method) = stack.pop() {
                log.push_str(&format!("[{ts}] E {method:x}\n"));
            }
            events += 1;
        }

        let log_path = dir.join(format!("{benchmark}_{key}.log"));
        let metadata_path = dir.join(format!("{benchmark}_{key}.json"));
        let metadata = serde_json::json!({
            "log_time_difference": offset,
            "method_signature_hash": dictionary,
        });
        let _ = std::fs::write(&log_path, &log);
        let _ = std::fs::write(&metadata_path, metadata.to_string());

        sessions.push(FixtureSession {
            key,
            log_path,
            metadata_path,
            events,
        });
    }

    TraceFixture {
        base_path: dir.join(format!("{benchmark}.log")),
        sessions,
        call_counts,
    }
}

/// Changed methods per commit plus candidate benchmarks reaching random
/// subsets of them.
#[derive(Debug, Clone)]
pub struct CoverageFixture {
    pub targets: BTreeMap<CommitId, BTreeSet<MethodSignature>>,
    pub benchmarks: Vec<BenchmarkCoverage>,
}

pub fn generate_coverage(
    commits: usize,
    methods_per_commit: usize,
    benchmarks: usize,
    seed: u64,
) -> CoverageFixture {
    let mut rng = SimpleRng::new(seed);
    let targets: BTreeMap<CommitId, BTreeSet<MethodSignature>> = (0..commits)
        .map(|c| {
            let methods = (0..methods_per_commit)
                .map(|m| format!("com.fixture.C{c}.m{m}()"))
                .collect();
            (format!("commit{c:04}"), methods)
        })
        .collect();

    let benchmarks = (0..benchmarks)
        .map(|b| {
            let duration = 1.0 + (rng.next_u64() % 10_000) as f64 / 100.0;
            let mut coverage = BenchmarkCoverage::new(format!("Bench{b:04}"), duration);
            for (commit, methods) in &targets {
                let reached: Vec<&MethodSignature> =
                    methods.iter().filter(|_| rng.next_u64() % 5 == 0).collect();
                if !reached.is_empty() {
                    coverage = coverage.with_targets(commit.clone(), reached.into_iter().cloned());
                }
            }
            coverage
        })
        .collect();

    CoverageFixture { targets, benchmarks }
}

/// xorshift64.
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }
}
