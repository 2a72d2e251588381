//! Per-method timing profiles from assembled traces.

pub mod aggregator;
pub mod analyzer;
pub mod format;
pub mod outliers;

pub use aggregator::{
    AggregationStats, CallSample, CallStackAggregator, FinalizedProfiles, MethodAccumulator,
    ProfileAccumulator,
};
pub use analyzer::{ProfileAnalyzer, ProfileReport};
pub use format::format_nanos;
pub use outliers::OutlierFilter;
