//! # perfscope-analysis
//!
//! Turns raw call-trace captures into per-method timing profiles and decides
//! which benchmarks are worth running at full fidelity.
//!
//! - [`trace`]: discovers capture sessions and assembles de-hashed, offset
//!   corrected event sequences.
//! - [`profile`]: stack-based aggregation into [`MethodProfile`]s with
//!   optional z-score outlier removal.
//! - [`coverage`]: probe matching and greedy benchmark selection.
//! - [`comparison`]: pluggable before/after comparators.
//! - [`batch`]: bounded worker pool over independent benchmarks.
//!
//! [`MethodProfile`]: perfscope_core::types::MethodProfile

pub mod agent_config;
pub mod batch;
pub mod comparison;
pub mod coverage;
pub mod history;
pub mod profile;
pub mod trace;

pub use batch::{AnalysisJob, BatchAnalyzer, BatchOutcome};
pub use comparison::{Comparator, ComparisonReport, Verdict};
pub use coverage::{CoverageSelector, Selection};
pub use profile::{ProfileAnalyzer, ProfileReport};
pub use trace::{AssembledTrace, TraceAssembler};
