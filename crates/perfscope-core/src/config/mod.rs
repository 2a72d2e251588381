//! Configuration system for perfscope.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod analysis_config;
pub mod comparison_config;
pub mod perfscope_config;
pub mod selection_config;
pub mod storage_config;
pub mod worker_config;

pub use analysis_config::AnalysisConfig;
pub use comparison_config::{ComparisonConfig, ComparisonMethod, ProfileMetric};
pub use perfscope_config::{CliOverrides, PerfscopeConfig};
pub use selection_config::SelectionConfig;
pub use storage_config::{StorageBackend, StorageConfig};
pub use worker_config::WorkerConfig;
