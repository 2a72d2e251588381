//! Benchmark coverage: which benchmarks reach which changed methods, and the
//! smallest, fastest set of benchmarks that reaches all of them.

pub mod assignment;
pub mod matching;
pub mod probe;
pub mod selector;

pub use assignment::{write_assignments, CoverageAssignment};
pub use matching::{build_coverage, match_changed_methods};
pub use probe::{observed_methods, probe_result};
pub use selector::{CoverageSelector, Selection, SelectionStep};
