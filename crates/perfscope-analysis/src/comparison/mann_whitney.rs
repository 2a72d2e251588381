//! Two-sided Mann-Whitney U test over per-call duration samples, normal
//! approximation with tie correction and continuity correction.

use statrs::distribution::{ContinuousCDF, Normal};

use super::{relative_change, Comparator, MethodComparison, Verdict};
use crate::profile::ProfileReport;

/// Result of one U test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UTest {
    /// U statistic of the first sample.
    pub u: f64,
    pub z: f64,
    pub p_value: f64,
}

/// Run the test. `None` with fewer than two samples on either side.
pub fn mann_whitney_u(first: &[f64], second: &[f64]) -> Option<UTest> {
    let (n1, n2) = (first.len(), second.len());
    if n1 < 2 || n2 < 2 {
        return None;
    }

    let mut pooled: Vec<(f64, bool)> = first
        .iter()
        .map(|v| (*v, true))
        .chain(second.iter().map(|v| (*v, false)))
        .collect();
    pooled.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Average ranks over tie groups.
    let n = pooled.len();
    let mut rank_sum_first = 0.0;
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && pooled[j].0 == pooled[i].0 {
            j += 1;
        }
        let group = (j - i) as f64;
        let average_rank = (i + j + 1) as f64 / 2.0;
        rank_sum_first += pooled[i..j].iter().filter(|(_, first)| *first).count() as f64 * average_rank;
        tie_term += group.powi(3) - group;
        i = j;
    }

    let (n1f, n2f, nf) = (n1 as f64, n2 as f64, n as f64);
    let u = rank_sum_first - n1f * (n1f + 1.0) / 2.0;
    let mean = n1f * n2f / 2.0;
    let variance = n1f * n2f / 12.0 * ((nf + 1.0) - tie_term / (nf * (nf - 1.0)));
    if !variance.is_finite() || variance <= 0.0 {
        // Every observation identical.
        return Some(UTest {
            u,
            z: 0.0,
            p_value: 1.0,
        });
    }

    let deviation = u - mean;
    let corrected = (deviation.abs() - 0.5).max(0.0).copysign(deviation);
    let z = corrected / variance.sqrt();
    let normal = Normal::new(0.0, 1.0).ok()?;
    let p_value = (2.0 * (1.0 - normal.cdf(z.abs()))).clamp(0.0, 1.0);
    Some(UTest { u, z, p_value })
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MannWhitneyComparator {
    alpha: f64,
}

impl MannWhitneyComparator {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }
}

impl Comparator for MannWhitneyComparator {
    fn name(&self) -> &'static str {
        "mann_whitney"
    }

    fn compare_method(&self, method: &str, before: &ProfileReport, after: &ProfileReport) -> MethodComparison {
        let (Some(b), Some(a)) = (before.samples.get(method), after.samples.get(method)) else {
            return MethodComparison::inconclusive(method);
        };
        let b: Vec<f64> = b.iter().map(|v| *v as f64).collect();
        let a: Vec<f64> = a.iter().map(|v| *v as f64).collect();
        let Some(test) = mann_whitney_u(&b, &a) else {
            return MethodComparison::inconclusive(method);
        };
        let magnitude = relative_change(median(&b), median(&a)).unwrap_or(0.0);

        // U of "before" below its mean means "after" tends to be larger.
        let verdict = if test.p_value >= self.alpha {
            Verdict::Unchanged
        } else if test.z < 0.0 {
            Verdict::Regressed
        } else {
            Verdict::Improved
        };
        MethodComparison {
            method: method.to_string(),
            verdict,
            magnitude,
            p_value: Some(test.p_value),
        }
    }
}
