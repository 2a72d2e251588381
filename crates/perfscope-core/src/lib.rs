//! # perfscope-core
//!
//! Shared foundation for the perfscope workspace: the trace/profile/coverage
//! data model, one error enum per subsystem, layered TOML configuration,
//! synchronous event dispatch, tracing setup, and the traits that form the
//! seams between analysis and storage.

pub mod config;
pub mod errors;
pub mod events;
pub mod tracing_setup;
pub mod traits;
pub mod types;
