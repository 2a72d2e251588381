//! Persistence backends for [`CachedStore`](crate::CachedStore).

use std::collections::BTreeMap;

use perfscope_core::errors::StorageError;
use serde_json::Value;

/// `namespace -> key -> value`.
pub type Entries = BTreeMap<String, BTreeMap<String, Value>>;

/// Durable side of a cached store.
///
/// `write` is called after every mutation with the changed entry and the full
/// post-mutation snapshot; backends persist whichever they need.
pub trait PersistenceBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Everything persisted so far.
    fn load(&self) -> Result<Entries, StorageError>;

    /// `value == None` means the key was removed.
    fn write(&self, namespace: &str, key: &str, value: Option<&Value>, snapshot: &Entries) -> Result<(), StorageError>;
}

/// Keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

impl PersistenceBackend for NullBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn load(&self) -> Result<Entries, StorageError> {
        Ok(Entries::new())
    }

    fn write(&self, _namespace: &str, _key: &str, _value: Option<&Value>, _snapshot: &Entries) -> Result<(), StorageError> {
        Ok(())
    }
}
