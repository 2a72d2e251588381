//! Data model shared by the analysis engine and the storage layer.

pub mod collections;
pub mod coverage;
pub mod profile;
pub mod trace;

pub use coverage::{BenchmarkCoverage, CommitId, MethodSignature, ProbeResult, SelectionResult};
pub use profile::MethodProfile;
pub use trace::{EventKind, TraceEvent};
