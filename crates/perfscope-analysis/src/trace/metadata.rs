//! Capture-session metadata sidecar.

use std::collections::BTreeMap;
use std::path::Path;

use perfscope_core::errors::TraceError;
use perfscope_core::types::collections::{fx_map_with_capacity, FxHashMap};
use serde::{Deserialize, Serialize};

/// JSON sidecar written next to each compacted log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Added to every compacted timestamp to put it on an absolute scale.
    #[serde(rename = "log_time_difference")]
    pub log_time_offset: i64,
    /// Full signature -> short token. May be partial.
    #[serde(default)]
    pub method_signature_hash: BTreeMap<String, String>,
}

impl SessionMetadata {
    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let content = std::fs::read_to_string(path).map_err(|e| TraceError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| TraceError::InvalidMetadata {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Invert the signature map into token -> signature.
    pub fn token_dictionary(&self) -> FxHashMap<String, String> {
        let mut dictionary = fx_map_with_capacity(self.method_signature_hash.len());
        for (signature, token) in &self.method_signature_hash {
            dictionary.insert(token.clone(), signature.clone());
        }
        dictionary
    }
}
