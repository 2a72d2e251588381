//! Differential comparison configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Statistic used to compare a "before" and an "after" profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMethod {
    /// Relative change of one aggregate metric against a threshold.
    PercentDelta,
    /// Two-sided Mann-Whitney U test over per-call duration samples.
    MannWhitney,
}

impl FromStr for ComparisonMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percent_delta" => Ok(Self::PercentDelta),
            "mann_whitney" => Ok(Self::MannWhitney),
            other => Err(format!("unknown comparison method '{other}'")),
        }
    }
}

impl fmt::Display for ComparisonMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PercentDelta => "percent_delta",
            Self::MannWhitney => "mann_whitney",
        })
    }
}

/// Which aggregate of a `MethodProfile` a percent-delta comparison reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileMetric {
    SelfTime,
    TotalTime,
    AverageSelfTime,
}

impl FromStr for ProfileMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "self_time" => Ok(Self::SelfTime),
            "total_time" => Ok(Self::TotalTime),
            "average_self_time" => Ok(Self::AverageSelfTime),
            other => Err(format!("unknown profile metric '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Default: percent_delta.
    pub method: Option<ComparisonMethod>,
    /// Default: self_time.
    pub metric: Option<ProfileMetric>,
    /// Relative change that counts as a regression/improvement. Default: 0.10.
    pub relative_threshold: Option<f64>,
    /// Significance level for the Mann-Whitney test. Default: 0.05.
    pub alpha: Option<f64>,
}

impl ComparisonConfig {
    pub fn effective_method(&self) -> ComparisonMethod {
        self.method.unwrap_or(ComparisonMethod::PercentDelta)
    }

    pub fn effective_metric(&self) -> ProfileMetric {
        self.metric.unwrap_or(ProfileMetric::SelfTime)
    }

    pub fn effective_relative_threshold(&self) -> f64 {
        self.relative_threshold.unwrap_or(0.10)
    }

    pub fn effective_alpha(&self) -> f64 {
        self.alpha.unwrap_or(0.05)
    }
}
