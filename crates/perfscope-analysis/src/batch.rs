//! Parallel analysis of independent benchmarks.
//!
//! Each job reads whole log files into memory, so the pool size bounds both
//! open files and peak memory. Jobs share nothing but the read-only analyzer.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use perfscope_core::config::WorkerConfig;
use perfscope_core::errors::PipelineError;
use perfscope_core::traits::{Cancellable, CancellationToken};
use rayon::prelude::*;

use crate::profile::{ProfileAnalyzer, ProfileReport};

/// One benchmark's trace base, e.g. `results/<commit>/ust/<benchmark>.log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisJob {
    pub name: String,
    pub trace_base: PathBuf,
}

impl AnalysisJob {
    pub fn new(name: impl Into<String>, trace_base: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            trace_base: trace_base.into(),
        }
    }
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub name: String,
    /// `Err(PipelineError::Cancelled)` for jobs not started before
    /// cancellation.
    pub result: Result<ProfileReport, PipelineError>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    pub completed: usize,
    pub cancelled: usize,
    pub duration_ms: u64,
}

#[derive(Debug)]
pub struct BatchAnalyzer {
    analyzer: ProfileAnalyzer,
    threads: Option<usize>,
}

impl BatchAnalyzer {
    pub fn new(analyzer: ProfileAnalyzer, workers: &WorkerConfig) -> Self {
        Self {
            analyzer,
            threads: workers.effective_threads(),
        }
    }

    /// Analyze every job; outcomes are in job order.
    pub fn run(&self, jobs: &[AnalysisJob], cancel: &CancellationToken) -> (Vec<BatchOutcome>, BatchStats) {
        let started = Instant::now();
        let completed = AtomicUsize::new(0);
        let cancelled = AtomicUsize::new(0);

        let work = || -> Vec<BatchOutcome> {
            jobs.par_iter()
                .map(|job| {
                    if cancel.is_cancelled() {
                        cancelled.fetch_add(1, Ordering::Relaxed);
                        return BatchOutcome {
                            name: job.name.clone(),
                            result: Err(PipelineError::Cancelled),
                        };
                    }
                    let report = self.analyzer.analyze(&job.trace_base);
                    completed.fetch_add(1, Ordering::Relaxed);
                    BatchOutcome {
                        name: job.name.clone(),
                        result: Ok(report),
                    }
                })
                .collect()
        };

        let outcomes = match self.build_pool() {
            Some(pool) => pool.install(work),
            None => work(),
        };

        let stats = BatchStats {
            completed: completed.load(Ordering::Relaxed),
            cancelled: cancelled.load(Ordering::Relaxed),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        tracing::info!(
            jobs = jobs.len(),
            completed = stats.completed,
            cancelled = stats.cancelled,
            duration_ms = stats.duration_ms,
            "batch analysis finished"
        );
        (outcomes, stats)
    }

    fn build_pool(&self) -> Option<rayon::ThreadPool> {
        let threads = self.threads?;
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                tracing::warn!(threads, error = %e, "falling back to the global rayon pool");
                None
            }
        }
    }
}
