use std::fmt;

/// Key-value persistence for snapshots.
///
/// Keys are scoped by a namespace (analogous to a table). Values are opaque
/// bytes; the store never interprets the document structure.
pub trait StateStore {
    /// Error type for this backend.
    type Error: fmt::Debug + fmt::Display;

    /// Store `value` under `(namespace, key)`, replacing any previous value.
    fn put(&mut self, namespace: &str, key: &str, value: &[u8]) -> Result<(), Self::Error>;

    /// Fetch the value under `(namespace, key)`.
    fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Remove the value under `(namespace, key)`. Missing keys are not an error.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), Self::Error>;

    /// All keys in `namespace`, in ascending order.
    fn list_keys(&self, namespace: &str) -> Result<Vec<String>, Self::Error>;

    /// Whether `(namespace, key)` holds a value.
    fn exists(&self, namespace: &str, key: &str) -> Result<bool, Self::Error> {
        Ok(self.get(namespace, key)?.is_some())
    }
}
