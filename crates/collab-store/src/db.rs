//! Typed snapshot database.
//!
//! [`SnapshotDb`] wraps a [`StateStore`] backend and stores values as
//! postcard payloads inside a versioned [`Envelope`]. Loading a snapshot
//! written under a different schema version fails loudly instead of
//! misinterpreting the bytes.

use std::fmt;

use log::debug;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::envelope::{Envelope, EnvelopeError};
use crate::traits::StateStore;

const DEFAULT_NAMESPACE: &str = "snapshots";

/// Types that carry a snapshot schema version.
pub trait Versioned {
    /// Version written into the envelope of every saved value.
    const SCHEMA_VERSION: u8;
}

/// Error type for [`SnapshotDb`] operations.
#[derive(Debug, Error)]
pub enum StoreError<E: fmt::Debug + fmt::Display> {
    /// The storage backend failed.
    #[error("store error: {0}")]
    Backend(E),
    /// Encoding the value failed.
    #[error("serialization error: {0}")]
    Serialize(#[source] postcard::Error),
    /// Decoding the stored payload failed.
    #[error("deserialization error: {0}")]
    Deserialize(#[source] postcard::Error),
    /// The stored bytes are not a snapshot envelope.
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),
    /// The snapshot was written under another schema version.
    #[error("snapshot has schema version {found}, expected {expected}")]
    VersionMismatch {
        /// Version found in the envelope.
        found: u8,
        /// Version this build reads.
        expected: u8,
    },
}

/// Snapshot database over a [`StateStore`] backend.
pub struct SnapshotDb<S: StateStore> {
    store: S,
    namespace: String,
}

impl<S: StateStore> SnapshotDb<S> {
    /// Wrap `store`, keeping snapshots in the default namespace.
    pub fn new(store: S) -> Self {
        Self::with_namespace(store, DEFAULT_NAMESPACE)
    }

    /// Wrap `store`, keeping snapshots in `namespace`.
    pub fn with_namespace(store: S, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// Underlying backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Namespace this database writes to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Persist `value` under `key`, replacing any earlier snapshot.
    pub fn save<T: Serialize + Versioned>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError<S::Error>> {
        let payload = postcard::to_allocvec(value).map_err(StoreError::Serialize)?;
        let bytes = Envelope::new(T::SCHEMA_VERSION, payload).to_bytes();
        debug!("saving snapshot {key} ({} bytes)", bytes.len());
        self.store
            .put(&self.namespace, key, &bytes)
            .map_err(StoreError::Backend)
    }

    /// Load the snapshot stored under `key`, if any.
    pub fn load<T: DeserializeOwned + Versioned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StoreError<S::Error>> {
        let Some(bytes) = self
            .store
            .get(&self.namespace, key)
            .map_err(StoreError::Backend)?
        else {
            return Ok(None);
        };

        let envelope = Envelope::from_bytes(&bytes)?;
        if envelope.version != T::SCHEMA_VERSION {
            return Err(StoreError::VersionMismatch {
                found: envelope.version,
                expected: T::SCHEMA_VERSION,
            });
        }
        postcard::from_bytes(&envelope.payload)
            .map(Some)
            .map_err(StoreError::Deserialize)
    }

    /// Whether a snapshot exists under `key`.
    pub fn contains(&self, key: &str) -> Result<bool, StoreError<S::Error>> {
        self.store
            .exists(&self.namespace, key)
            .map_err(StoreError::Backend)
    }

    /// Keys of all stored snapshots.
    pub fn keys(&self) -> Result<Vec<String>, StoreError<S::Error>> {
        self.store
            .list_keys(&self.namespace)
            .map_err(StoreError::Backend)
    }

    /// Drop the snapshot under `key`.
    pub fn remove(&mut self, key: &str) -> Result<(), StoreError<S::Error>> {
        self.store
            .delete(&self.namespace, key)
            .map_err(StoreError::Backend)
    }
}
