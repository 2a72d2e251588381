//! Stable error codes surfaced to callers and logs.

pub const TRACE_IO_ERROR: &str = "TRACE_IO_ERROR";
pub const TRACE_METADATA_ERROR: &str = "TRACE_METADATA_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const AGENT_CONFIG_ERROR: &str = "AGENT_CONFIG_ERROR";
pub const CANCELLED: &str = "CANCELLED";

/// Maps an error to a stable, machine-readable code.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;
}
