//! Error handling for perfscope.
//! One error enum per subsystem, `thiserror` only.

pub mod agent_config_error;
pub mod config_error;
pub mod error_code;
pub mod pipeline_error;
pub mod storage_error;
pub mod trace_error;

pub use agent_config_error::AgentConfigError;
pub use config_error::ConfigError;
pub use error_code::ErrorCode;
pub use pipeline_error::{PipelineError, PipelineResult};
pub use storage_error::StorageError;
pub use trace_error::TraceError;
