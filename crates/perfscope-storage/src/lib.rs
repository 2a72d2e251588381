//! # perfscope-storage
//!
//! Key-value persistence behind [`perfscope_core::traits::KeyValueStore`]:
//! an in-memory [`CachedStore`] with write-through to a pluggable
//! [`PersistenceBackend`] (nothing, a JSON file, or SQLite).

pub mod backend;
pub mod cached;
pub mod json_file;
pub mod sqlite;

use std::path::PathBuf;
use std::sync::Arc;

use perfscope_core::config::{StorageBackend, StorageConfig};
use perfscope_core::errors::StorageError;
use perfscope_core::traits::KeyValueStore;

pub use backend::{Entries, NullBackend, PersistenceBackend};
pub use cached::CachedStore;
pub use json_file::JsonFileBackend;
pub use sqlite::SqliteBackend;

/// Build the store described by `config`.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    let backend = config.effective_backend();
    let store: Arc<dyn KeyValueStore> = match backend {
        StorageBackend::Memory => Arc::new(CachedStore::open(NullBackend)?),
        StorageBackend::Json => Arc::new(CachedStore::open(JsonFileBackend::new(require_path(config)?))?),
        StorageBackend::Sqlite => Arc::new(CachedStore::open(SqliteBackend::open(&require_path(config)?)?)?),
    };
    tracing::debug!(backend = ?backend, path = ?config.path, "key-value store opened");
    Ok(store)
}

fn require_path(config: &StorageConfig) -> Result<PathBuf, StorageError> {
    config.path.clone().ok_or_else(|| StorageError::Io {
        path: "<unset>".to_string(),
        message: "storage.path is required for file-backed stores".to_string(),
    })
}
