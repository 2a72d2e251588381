//! # perfscope-bench
//!
//! Deterministic fixture generators shared by the criterion benchmarks and
//! integration tests: capture-session families on disk and synthetic
//! coverage matrices for the selector.

pub mod fixtures;
