//! Instrumentation agent config errors.

use super::error_code::{self, ErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum AgentConfigError {
    #[error("Failed to serialize agent config: {0}")]
    Serialize(String),

    #[error("Failed to write agent config to {path}: {message}")]
    Write { path: String, message: String },
}

impl ErrorCode for AgentConfigError {
    fn error_code(&self) -> &'static str {
        error_code::AGENT_CONFIG_ERROR
    }
}
