//! Capture-session discovery.
//!
//! A benchmark run may restart its process several times; each restart writes
//! `<base>_<key>.log` plus `<base>_<key>.json`. A bare `<base>.log` is the
//! session with an empty key.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use perfscope_core::errors::TraceError;

/// One process lifetime's worth of capture files. Either file may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSession {
    pub key: String,
    pub log_path: Option<PathBuf>,
    pub metadata_path: Option<PathBuf>,
}

/// Find every capture session belonging to `base_path`
/// (e.g. `results/ust/MyBench.log`), ordered by session key.
///
/// A missing directory means the benchmark never ran and yields no sessions.
pub fn discover_sessions(base_path: &Path) -> Result<Vec<CaptureSession>, TraceError> {
    let dir = match base_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let Some(stem) = base_stem(base_path) else {
        return Ok(Vec::new());
    };

    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(TraceError::Io {
                path: dir.display().to_string(),
                message: e.to_string(),
            })
        }
    };

    let mut sessions: BTreeMap<String, CaptureSession> = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|e| TraceError::Io {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some((key, is_log)) = classify(file_name, &stem) else {
            continue;
        };
        let session = sessions.entry(key.to_string()).or_insert_with(|| CaptureSession {
            key: key.to_string(),
            ..CaptureSession::default()
        });
        if is_log {
            session.log_path = Some(path);
        } else {
            session.metadata_path = Some(path);
        }
    }

    let mut sessions: Vec<CaptureSession> = sessions.into_values().collect();
    sessions.sort_by(|a, b| compare_keys(&a.key, &b.key));
    Ok(sessions)
}

fn base_stem(base_path: &Path) -> Option<String> {
    let name = base_path.file_name()?.to_str()?;
    let stem = name.strip_suffix(".log").unwrap_or(name);
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Returns `(session_key, is_log)` when `file_name` belongs to `stem`.
fn classify<'a>(file_name: &'a str, stem: &str) -> Option<(&'a str, bool)> {
    let (name, is_log) = if let Some(name) = file_name.strip_suffix(".log") {
        (name, true)
    } else if let Some(name) = file_name.strip_suffix(".json") {
        (name, false)
    } else {
        return None;
    };

    if name == stem {
        return Some(("", is_log));
    }
    // Split on the last underscore so `Bench_fast_1` never lands in `Bench`.
    let (prefix, key) = name.rsplit_once('_')?;
    (prefix == stem && !key.is_empty()).then_some((key, is_log))
}

/// Numeric keys (timestamps) order numerically; anything else lexically.
fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<u128>(), b.parse::<u128>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), "").unwrap();
    }

    #[test]
    fn groups_log_and_metadata_by_key() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Bench_100.log");
        touch(dir.path(), "Bench_100.json");
        touch(dir.path(), "Bench_99.json");
        touch(dir.path(), "Bench.log");
        touch(dir.path(), "Bench_fast_1.log");
        touch(dir.path(), "OtherBench_1.log");
        touch(dir.path(), "Bench_7.yaml");

        let sessions = discover_sessions(&dir.path().join("Bench.log")).unwrap();
        let keys: Vec<&str> = sessions.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["", "99", "100"]);

        assert!(sessions[0].log_path.is_some());
        assert!(sessions[0].metadata_path.is_none());
        assert!(sessions[1].log_path.is_none());
        assert!(sessions[2].log_path.is_some() && sessions[2].metadata_path.is_some());
    }

    #[test]
    fn missing_directory_yields_no_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("never-ran").join("Bench.log");
        assert!(discover_sessions(&base).unwrap().is_empty());
    }

    #[test]
    fn numeric_keys_sort_numerically() {
        assert_eq!(compare_keys("99", "100"), Ordering::Less);
        assert_eq!(compare_keys("b", "a"), Ordering::Greater);
    }
}
