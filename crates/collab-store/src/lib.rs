//! # collab-store
//!
//! Snapshot persistence for shared documents.
//!
//! A document service keeps the latest merged state of every session as an
//! opaque snapshot. Snapshots are serialized with postcard and wrapped in a
//! small versioned envelope before they reach a [`StateStore`] backend.
//!
//! ## Quick Start
//!
//! ```
//! use collab_store::{MemoryStore, SnapshotDb, Versioned};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Doc { dice: i64 }
//!
//! impl Versioned for Doc {
//!     const SCHEMA_VERSION: u8 = 1;
//! }
//!
//! let mut db = SnapshotDb::new(MemoryStore::new());
//! db.save("session-1", &Doc { dice: 4 }).unwrap();
//!
//! let loaded: Option<Doc> = db.load("session-1").unwrap();
//! assert_eq!(loaded, Some(Doc { dice: 4 }));
//! ```

#![warn(missing_docs)]

mod db;
mod envelope;
mod memory;
mod traits;

pub use db::{SnapshotDb, StoreError, Versioned};
pub use envelope::{Envelope, EnvelopeError, ENVELOPE_HEADER_SIZE, MAGIC_BYTE};
pub use memory::{MemoryError, MemoryStore};
pub use traits::StateStore;
