//! Top-level perfscope configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{
    AnalysisConfig, ComparisonConfig, ComparisonMethod, SelectionConfig, StorageConfig,
    WorkerConfig,
};
use crate::errors::ConfigError;

/// Project config file name, looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = "perfscope.toml";

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`PERFSCOPE_*`)
/// 3. Project config (`perfscope.toml` in project root)
/// 4. User config (`~/.perfscope/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PerfscopeConfig {
    pub analysis: AnalysisConfig,
    pub selection: SelectionConfig,
    pub comparison: ComparisonConfig,
    pub workers: WorkerConfig,
    pub storage: StorageConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub threads: Option<usize>,
    pub remove_outliers: Option<bool>,
    pub comparison_method: Option<ComparisonMethod>,
    pub storage_path: Option<PathBuf>,
}

impl PerfscopeConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Lowest priority: user config. Only a parse error is fatal here.
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(err @ ConfigError::ParseError { .. }) => return Err(err),
                    Err(err) => {
                        tracing::warn!(error = %err, "ignoring unreadable user config");
                    }
                }
            }
        }

        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &PerfscopeConfig) -> Result<(), ConfigError> {
        if let Some(threshold) = config.analysis.outlier_z_threshold {
            if !(threshold.is_finite() && threshold > 0.0) {
                return Err(ConfigError::ValidationFailed {
                    field: "analysis.outlier_z_threshold".to_string(),
                    message: "must be a positive number".to_string(),
                });
            }
        }
        if let Some(factor) = config.selection.significance_factor {
            if !(factor.is_finite() && factor >= 1.0) {
                return Err(ConfigError::ValidationFailed {
                    field: "selection.significance_factor".to_string(),
                    message: "must be at least 1.0".to_string(),
                });
            }
        }
        if let Some(alpha) = config.comparison.alpha {
            if !(alpha > 0.0 && alpha < 1.0) {
                return Err(ConfigError::ValidationFailed {
                    field: "comparison.alpha".to_string(),
                    message: "must be between 0.0 and 1.0 (exclusive)".to_string(),
                });
            }
        }
        if let Some(threshold) = config.comparison.relative_threshold {
            if !(threshold.is_finite() && threshold >= 0.0) {
                return Err(ConfigError::ValidationFailed {
                    field: "comparison.relative_threshold".to_string(),
                    message: "must be a non-negative number".to_string(),
                });
            }
        }
        Ok(())
    }

    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".perfscope").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored.
    fn merge_toml_file(config: &mut PerfscopeConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: PerfscopeConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; only `Some` values in `other` win.
    fn merge(base: &mut PerfscopeConfig, other: &PerfscopeConfig) {
        // Analysis
        if other.analysis.remove_outliers.is_some() {
            base.analysis.remove_outliers = other.analysis.remove_outliers;
        }
        if other.analysis.outlier_z_threshold.is_some() {
            base.analysis.outlier_z_threshold = other.analysis.outlier_z_threshold;
        }
        if other.analysis.min_outlier_samples.is_some() {
            base.analysis.min_outlier_samples = other.analysis.min_outlier_samples;
        }

        // Selection
        if other.selection.significance_factor.is_some() {
            base.selection.significance_factor = other.selection.significance_factor;
        }

        // Comparison
        if other.comparison.method.is_some() {
            base.comparison.method = other.comparison.method;
        }
        if other.comparison.metric.is_some() {
            base.comparison.metric = other.comparison.metric;
        }
        if other.comparison.relative_threshold.is_some() {
            base.comparison.relative_threshold = other.comparison.relative_threshold;
        }
        if other.comparison.alpha.is_some() {
            base.comparison.alpha = other.comparison.alpha;
        }

        // Workers
        if other.workers.threads.is_some() {
            base.workers.threads = other.workers.threads;
        }

        // Storage
        if other.storage.backend.is_some() {
            base.storage.backend = other.storage.backend;
        }
        if other.storage.path.is_some() {
            base.storage.path = other.storage.path.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `PERFSCOPE_<SECTION>_<FIELD>`. Unparsable values are ignored.
    fn apply_env_overrides(config: &mut PerfscopeConfig) {
        if let Some(v) = env_parse::<bool>("PERFSCOPE_ANALYSIS_REMOVE_OUTLIERS") {
            config.analysis.remove_outliers = Some(v);
        }
        if let Some(v) = env_parse::<f64>("PERFSCOPE_ANALYSIS_OUTLIER_Z_THRESHOLD") {
            config.analysis.outlier_z_threshold = Some(v);
        }
        if let Some(v) = env_parse::<f64>("PERFSCOPE_SELECTION_SIGNIFICANCE_FACTOR") {
            config.selection.significance_factor = Some(v);
        }
        if let Some(v) = env_parse("PERFSCOPE_COMPARISON_METHOD") {
            config.comparison.method = Some(v);
        }
        if let Some(v) = env_parse::<f64>("PERFSCOPE_COMPARISON_ALPHA") {
            config.comparison.alpha = Some(v);
        }
        if let Some(v) = env_parse::<usize>("PERFSCOPE_WORKERS_THREADS") {
            config.workers.threads = Some(v);
        }
        if let Some(v) = env_parse("PERFSCOPE_STORAGE_BACKEND") {
            config.storage.backend = Some(v);
        }
        if let Ok(val) = std::env::var("PERFSCOPE_STORAGE_PATH") {
            config.storage.path = Some(PathBuf::from(val));
        }
    }

    fn apply_cli_overrides(config: &mut PerfscopeConfig, cli: &CliOverrides) {
        if let Some(v) = cli.threads {
            config.workers.threads = Some(v);
        }
        if let Some(v) = cli.remove_outliers {
            config.analysis.remove_outliers = Some(v);
        }
        if let Some(v) = cli.comparison_method {
            config.comparison.method = Some(v);
        }
        if let Some(ref v) = cli.storage_path {
            config.storage.path = Some(v.clone());
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
