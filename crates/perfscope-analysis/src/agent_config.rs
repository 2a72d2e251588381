//! YAML configuration for the instrumentation agent.
//!
//! A probe run records every visited method of the target package; a
//! measurement run instruments only the methods a benchmark was assigned.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use perfscope_core::errors::AgentConfigError;
use perfscope_core::types::MethodSignature;
use serde::{Deserialize, Serialize};

/// Agent log verbosity used for every capture.
pub const AGENT_LOG_LEVEL: &str = "fine";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub logging: LoggingSection,
    pub instrumentation: InstrumentationSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSection {
    pub level: String,
    pub file: PathBuf,
    /// Suffix each log with the process start time, one file per session.
    pub add_timestamp_to_file_names: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentationSection {
    pub target_package: String,
    pub target_methods: TargetMethods,
    pub only_check_visited: bool,
    pub instrument_main_method: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetMethods {
    pub instrument: Vec<String>,
    pub ignore: Vec<String>,
}

impl AgentConfig {
    pub fn probe(log_file: impl Into<PathBuf>, target_package: impl Into<String>) -> Self {
        Self::build(log_file.into(), target_package.into(), Vec::new(), true)
    }

    pub fn measurement<I, S>(log_file: impl Into<PathBuf>, target_package: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let methods = methods.into_iter().map(Into::into).collect();
        Self::build(log_file.into(), target_package.into(), methods, false)
    }

    fn build(file: PathBuf, target_package: String, instrument: Vec<String>, only_check_visited: bool) -> Self {
        Self {
            logging: LoggingSection {
                level: AGENT_LOG_LEVEL.to_string(),
                file,
                add_timestamp_to_file_names: true,
            },
            instrumentation: InstrumentationSection {
                target_package,
                target_methods: TargetMethods {
                    instrument,
                    ignore: Vec::new(),
                },
                only_check_visited,
                instrument_main_method: false,
            },
        }
    }

    pub fn to_yaml(&self) -> Result<String, AgentConfigError> {
        serde_yaml::to_string(self).map_err(|e| AgentConfigError::Serialize(e.to_string()))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, AgentConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| AgentConfigError::Serialize(e.to_string()))
    }

    /// Write the YAML to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<(), AgentConfigError> {
        let write_err = |e: std::io::Error| AgentConfigError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, self.to_yaml()?).map_err(write_err)
    }
}

/// Write `<dir>/<benchmark>.yaml` for each assigned benchmark, logging to
/// `<dir>/ust/<benchmark>.log`. Returns the written config paths.
pub fn write_measurement_configs(
    dir: &Path,
    target_package: &str,
    assignments: &BTreeMap<String, BTreeSet<MethodSignature>>,
) -> Result<Vec<PathBuf>, AgentConfigError> {
    let mut written = Vec::with_capacity(assignments.len());
    for (benchmark, methods) in assignments {
        let log_file = dir.join("ust").join(format!("{benchmark}.log"));
        let config = AgentConfig::measurement(log_file, target_package, methods.iter().cloned());
        let path = dir.join(format!("{benchmark}.yaml"));
        config.write_to(&path)?;
        tracing::debug!(benchmark = %benchmark, methods = methods.len(), "measurement config written");
        written.push(path);
    }
    Ok(written)
}
