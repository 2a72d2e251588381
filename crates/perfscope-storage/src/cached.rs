//! In-memory key-value map with write-through persistence.

use std::sync::RwLock;

use perfscope_core::errors::StorageError;
use perfscope_core::traits::KeyValueStore;
use serde_json::Value;

use crate::backend::{Entries, PersistenceBackend};

/// Reads are served from memory; every mutation is written through to the
/// backend before it becomes visible. A failed write leaves memory unchanged.
#[derive(Debug)]
pub struct CachedStore<B: PersistenceBackend> {
    entries: RwLock<Entries>,
    backend: B,
}

impl<B: PersistenceBackend> CachedStore<B> {
    pub fn open(backend: B) -> Result<Self, StorageError> {
        let entries = backend.load()?;
        tracing::debug!(
            backend = backend.name(),
            namespaces = entries.len(),
            "store loaded"
        );
        Ok(Self {
            entries: RwLock::new(entries),
            backend,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn poisoned(&self) -> StorageError {
        StorageError::LockPoisoned(self.backend.name().to_string())
    }
}

impl<B: PersistenceBackend> KeyValueStore for CachedStore<B> {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, StorageError> {
        let entries = self.entries.read().map_err(|_| self.poisoned())?;
        Ok(entries.get(namespace).and_then(|ns| ns.get(key)).cloned())
    }

    fn put(&self, namespace: &str, key: &str, value: Value) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| self.poisoned())?;
        let previous = entries
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value.clone());

        if let Err(err) = self.backend.write(namespace, key, Some(&value), &entries) {
            restore(&mut entries, namespace, key, previous);
            return Err(err);
        }
        Ok(())
    }

    fn remove(&self, namespace: &str, key: &str) -> Result<bool, StorageError> {
        let mut entries = self.entries.write().map_err(|_| self.poisoned())?;
        let Some(previous) = entries.get_mut(namespace).and_then(|ns| ns.remove(key)) else {
            return Ok(false);
        };
        if entries.get(namespace).is_some_and(|ns| ns.is_empty()) {
            entries.remove(namespace);
        }

        if let Err(err) = self.backend.write(namespace, key, None, &entries) {
            restore(&mut entries, namespace, key, Some(previous));
            return Err(err);
        }
        Ok(true)
    }

    fn keys(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| self.poisoned())?;
        Ok(entries
            .get(namespace)
            .map(|ns| ns.keys().cloned().collect())
            .unwrap_or_default())
    }
}

fn restore(entries: &mut Entries, namespace: &str, key: &str, previous: Option<Value>) {
    match previous {
        Some(value) => {
            entries
                .entry(namespace.to_string())
                .or_default()
                .insert(key.to_string(), value);
        }
        None => {
            if let Some(ns) = entries.get_mut(namespace) {
                ns.remove(key);
                if ns.is_empty() {
                    entries.remove(namespace);
                }
            }
        }
    }
}
