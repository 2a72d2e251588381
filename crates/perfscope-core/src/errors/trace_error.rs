//! Capture-file errors.

use super::error_code::{self, ErrorCode};

/// Errors raised while reading capture sessions. The assembler never aborts on
/// these; they are collected as non-fatal diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid metadata in {path}: {message}")]
    InvalidMetadata { path: String, message: String },
}

impl ErrorCode for TraceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => error_code::TRACE_IO_ERROR,
            Self::InvalidMetadata { .. } => error_code::TRACE_METADATA_ERROR,
        }
    }
}
