//! Batch worker pool configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WorkerConfig {
    /// Worker threads for batch analysis. `None` or 0 lets rayon decide.
    /// Each in-flight job holds whole log files in memory, so this also
    /// bounds open files and peak memory.
    pub threads: Option<usize>,
}

impl WorkerConfig {
    pub fn effective_threads(&self) -> Option<usize> {
        self.threads.filter(|&n| n > 0)
    }
}
