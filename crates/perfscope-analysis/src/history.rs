//! Benchmark history: probe results keyed by a fingerprint of the benchmark
//! sources, so unchanged benchmarks are not probed again.

use std::path::Path;

use ignore::WalkBuilder;
use perfscope_core::errors::StorageError;
use perfscope_core::traits::{KeyValueStore, KeyValueStoreExt};
use perfscope_core::types::ProbeResult;
use xxhash_rust::xxh3::{xxh3_128, xxh3_64};

pub const HISTORY_NAMESPACE: &str = "benchmark_history";

/// Content hash of every file under `dir`, independent of walk order and of
/// the absolute location of `dir`.
pub fn source_fingerprint(dir: &Path) -> Result<String, StorageError> {
    let io_err = |path: &Path, message: String| StorageError::Io {
        path: path.display().to_string(),
        message,
    };

    let mut entries: Vec<(String, u64)> = Vec::new();
    for entry in WalkBuilder::new(dir).standard_filters(false).build() {
        let entry = entry.map_err(|e| io_err(dir, e.to_string()))?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let relative = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let content = std::fs::read(path).map_err(|e| io_err(path, e.to_string()))?;
        entries.push((relative, xxh3_64(&content)));
    }
    entries.sort();

    let mut manifest = String::new();
    for (path, hash) in &entries {
        manifest.push_str(path);
        manifest.push('\0');
        manifest.push_str(&format!("{hash:016x}\n"));
    }
    Ok(format!("{:032x}", xxh3_128(manifest.as_bytes())))
}

pub struct BenchmarkHistory<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> BenchmarkHistory<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Recorded probes for `fingerprint`. An empty record counts as absent.
    pub fn lookup(&self, fingerprint: &str) -> Result<Option<Vec<ProbeResult>>, StorageError> {
        let probes: Option<Vec<ProbeResult>> = self.store.get_as(HISTORY_NAMESPACE, fingerprint)?;
        Ok(probes.filter(|p| !p.is_empty()))
    }

    pub fn record(&self, fingerprint: &str, probes: &[ProbeResult]) -> Result<(), StorageError> {
        tracing::debug!(fingerprint, benchmarks = probes.len(), "recording benchmark history");
        self.store.put_as(HISTORY_NAMESPACE, fingerprint, &probes)
    }

    pub fn fingerprints(&self) -> Result<Vec<String>, StorageError> {
        self.store.keys(HISTORY_NAMESPACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_tracks_content_not_location() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        for dir in [a.path(), b.path()] {
            std::fs::create_dir_all(dir.join("src/bench")).unwrap();
            std::fs::write(dir.join("src/bench/Bench.java"), "class Bench {}").unwrap();
            std::fs::write(dir.join("pom.xml"), "<project/>").unwrap();
        }
        let fa = source_fingerprint(a.path()).unwrap();
        assert_eq!(fa, source_fingerprint(b.path()).unwrap());
        assert_eq!(fa.len(), 32);

        std::fs::write(b.path().join("src/bench/Bench.java"), "class Bench { int x; }").unwrap();
        assert_ne!(fa, source_fingerprint(b.path()).unwrap());
    }
}
