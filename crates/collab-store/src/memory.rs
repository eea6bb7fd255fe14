use std::collections::BTreeMap;

use thiserror::Error;

use crate::traits::StateStore;

/// In-memory storage backend.
///
/// Everything lives in a `BTreeMap`; nothing touches disk.
///
/// # Example
///
/// ```
/// use collab_store::{MemoryStore, StateStore};
///
/// let mut store = MemoryStore::new();
/// store.put("sessions", "s1", b"state").unwrap();
///
/// assert_eq!(store.get("sessions", "s1").unwrap().as_deref(), Some(b"state".as_slice()));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    namespaces: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
}

/// Error type for the in-memory backend.
///
/// The backend itself never fails; the trait requires an error type.
#[derive(Debug, Clone, Error)]
#[error("memory store error: {0}")]
pub struct MemoryError(String);

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries across all namespaces.
    pub fn len(&self) -> usize {
        self.namespaces.values().map(BTreeMap::len).sum()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StateStore for MemoryStore {
    type Error = MemoryError;

    fn put(&mut self, namespace: &str, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self
            .namespaces
            .get(namespace)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), Self::Error> {
        if let Some(entries) = self.namespaces.get_mut(namespace) {
            entries.remove(key);
            if entries.is_empty() {
                self.namespaces.remove(namespace);
            }
        }
        Ok(())
    }

    fn list_keys(&self, namespace: &str) -> Result<Vec<String>, Self::Error> {
        Ok(self
            .namespaces
            .get(namespace)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn exists(&self, namespace: &str, key: &str) -> Result<bool, Self::Error> {
        Ok(self
            .namespaces
            .get(namespace)
            .is_some_and(|entries| entries.contains_key(key)))
    }
}
