//! Namespaced key-value store used for build/benchmark history and other
//! intermediate results that outlive one analysis.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::StorageError;

/// Object-safe key-value store. Values are JSON documents.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, StorageError>;

    fn put(&self, namespace: &str, key: &str, value: Value) -> Result<(), StorageError>;

    /// Returns whether the key existed.
    fn remove(&self, namespace: &str, key: &str) -> Result<bool, StorageError>;

    /// Keys in `namespace`, sorted.
    fn keys(&self, namespace: &str) -> Result<Vec<String>, StorageError>;
}

/// Typed helpers over any `KeyValueStore`.
pub trait KeyValueStoreExt: KeyValueStore {
    fn get_as<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(namespace, key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StorageError::Serialization { message: e.to_string() }),
            None => Ok(None),
        }
    }

    fn put_as<T: Serialize>(&self, namespace: &str, key: &str, value: &T) -> Result<(), StorageError> {
        let value = serde_json::to_value(value)
            .map_err(|e| StorageError::Serialization { message: e.to_string() })?;
        self.put(namespace, key, value)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}
