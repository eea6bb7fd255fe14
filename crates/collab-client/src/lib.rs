//! # collab-client
//!
//! Shared-document containers.
//!
//! A [`Container`] holds the named shared objects declared by a
//! [`ContainerSchema`]: last-writer-wins [`SharedMap`]s and collaboratively
//! editable [`SharedString`]s. A container starts out detached; attaching it
//! to a [`LocalService`] makes it joinable under an opaque [`ContainerId`].
//! From then on every local write is relayed to all other containers attached
//! to the same document.
//!
//! All objects live on one thread. Local writes notify listeners immediately
//! (with `local == true`); remote writes are applied and announced when the
//! owning container drains its inbox with [`Container::process_incoming`] or
//! [`Container::next_remote`].
//!
//! ## Quick Start
//!
//! ```
//! use collab_client::{ContainerSchema, LocalService, ServiceConfig};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let service = LocalService::new(ServiceConfig::default());
//! let schema = ContainerSchema::new().map("scores");
//!
//! let host = service.create_container(&schema).await.unwrap();
//! host.map("scores").unwrap().set("alice", 3);
//! let id = host.attach().await.unwrap();
//!
//! let guest = service.get_container(&id, &schema).await.unwrap();
//! assert_eq!(guest.map("scores").unwrap().get_int("alice"), Some(3));
//!
//! host.map("scores").unwrap().set("alice", 4);
//! guest.process_incoming();
//! assert_eq!(guest.map("scores").unwrap().get_int("alice"), Some(4));
//! # });
//! ```

#![warn(missing_docs)]

mod container;
mod document;
mod error;
mod map;
mod schema;
mod service;
mod string;
mod value;

pub use collab_kit::events::SubscriptionId;
pub use container::{ClientId, Container, ContainerId};
pub use document::{Delta, DocumentState, ObjectChange, ObjectState};
pub use error::ClientError;
pub use map::{SharedMap, ValueChanged};
pub use schema::{ContainerSchema, ObjectKind};
pub use service::{LocalService, ServiceConfig};
pub use string::{SequenceDelta, SharedString};
pub use value::Value;
