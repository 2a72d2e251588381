//! Store behavior through `open_store`, across process-style reopen cycles.

use perfscope_core::config::{StorageBackend, StorageConfig};
use perfscope_core::errors::StorageError;
use perfscope_core::traits::{KeyValueStore, KeyValueStoreExt};
use perfscope_storage::{open_store, CachedStore, JsonFileBackend, SqliteBackend};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BuildRecord {
    commit: String,
    succeeded: bool,
    duration_secs: f64,
}

fn config(backend: StorageBackend, path: Option<std::path::PathBuf>) -> StorageConfig {
    StorageConfig {
        backend: Some(backend),
        path,
    }
}

fn exercise(store: &dyn KeyValueStore) {
    let record = BuildRecord {
        commit: "abc123".into(),
        succeeded: true,
        duration_secs: 42.5,
    };
    store.put_as("builds", "abc123", &record).unwrap();
    store.put("probes", "fp-1", json!([{"benchmark": "B"}])).unwrap();

    let back: Option<BuildRecord> = store.get_as("builds", "abc123").unwrap();
    assert_eq!(back, Some(record));
    assert_eq!(store.keys("probes").unwrap(), vec!["fp-1".to_string()]);
}

#[test]
fn memory_store_roundtrip() {
    let store = open_store(&StorageConfig::default()).unwrap();
    exercise(store.as_ref());
    let missing: Option<BuildRecord> = store.get_as("builds", "nope").unwrap();
    assert!(missing.is_none());
}

#[test]
fn json_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("perfscope.json");
    {
        let store = open_store(&config(StorageBackend::Json, Some(path.clone()))).unwrap();
        exercise(store.as_ref());
        store.put("probes", "fp-2", json!(null)).unwrap();
        assert!(store.remove("probes", "fp-2").unwrap());
    }
    let reopened = CachedStore::open(JsonFileBackend::new(&path)).unwrap();
    assert_eq!(reopened.keys("builds").unwrap(), vec!["abc123".to_string()]);
    assert_eq!(reopened.keys("probes").unwrap(), vec!["fp-1".to_string()]);
}

#[test]
fn concurrent_json_stores_do_not_drop_each_others_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("perfscope.json");
    let first = CachedStore::open(JsonFileBackend::new(&path)).unwrap();
    let second = CachedStore::open(JsonFileBackend::new(&path)).unwrap();

    first.put("probes", "fp-a", json!(["A"])).unwrap();
    second.put("probes", "fp-b", json!(["B"])).unwrap();
    first.put("probes", "fp-c", json!(["C"])).unwrap();

    let reopened = CachedStore::open(JsonFileBackend::new(&path)).unwrap();
    assert_eq!(
        reopened.keys("probes").unwrap(),
        vec!["fp-a".to_string(), "fp-b".to_string(), "fp-c".to_string()]
    );
}

#[test]
fn sqlite_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("perfscope.db");
    {
        let store = open_store(&config(StorageBackend::Sqlite, Some(path.clone()))).unwrap();
        exercise(store.as_ref());
    }
    let reopened = CachedStore::open(SqliteBackend::open(&path).unwrap()).unwrap();
    let record: Option<BuildRecord> = reopened.get_as("builds", "abc123").unwrap();
    assert_eq!(record.map(|r| r.duration_secs), Some(42.5));
}

#[test]
fn file_backends_require_a_path() {
    for backend in [StorageBackend::Json, StorageBackend::Sqlite] {
        let err = open_store(&config(backend, None)).err().unwrap();
        assert!(matches!(err, StorageError::Io { .. }));
    }
}

#[test]
fn typed_read_of_mismatched_value_is_a_serialization_error() {
    let store = open_store(&StorageConfig::default()).unwrap();
    store.put("builds", "bad", json!("not a record")).unwrap();
    let result: Result<Option<BuildRecord>, _> = store.get_as("builds", "bad");
    assert!(matches!(result, Err(StorageError::Serialization { .. })));
}
