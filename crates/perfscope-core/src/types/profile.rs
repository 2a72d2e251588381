//! Per-method timing profile.

use serde::{Deserialize, Serialize};

/// Aggregate timing statistics for one method within one analysis run.
///
/// All times are nanoseconds. `call_count == 0` means "no reliable data"
/// (every sample was discarded as an outlier), not "method not exercised".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodProfile {
    pub total_time: i64,
    pub self_time: i64,
    pub average_self_time: f64,
    pub min_time: i64,
    pub max_time: i64,
    pub call_count: u64,
}

impl MethodProfile {
    /// The all-zero profile reported when no reliable samples remain.
    pub fn empty() -> Self {
        Self {
            total_time: 0,
            self_time: 0,
            average_self_time: 0.0,
            min_time: 0,
            max_time: 0,
            call_count: 0,
        }
    }

    pub fn is_reliable(&self) -> bool {
        self.call_count > 0
    }
}

impl Default for MethodProfile {
    fn default() -> Self {
        Self::empty()
    }
}
