//! In-process document service.
//!
//! [`LocalService`] plays the part of the ordering/relay server: it keeps
//! the merged snapshot of every attached document in a [`SnapshotDb`] and
//! forwards each submitted delta to every other participant of the same
//! document. Delivery is asynchronous from the receiver's point of view:
//! deltas wait in the receiving container's inbox until it processes them.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use collab_store::{MemoryStore, SnapshotDb};
use log::{debug, error, info};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::container::{ClientId, Container, ContainerId};
use crate::document::{Delta, DocumentState};
use crate::error::ClientError;
use crate::schema::ContainerSchema;

/// Tuning for [`LocalService`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Simulated round-trip time for creating, attaching and joining.
    pub connect_latency: Duration,
}

/// Handle to an in-process document service. Clones share the service.
#[derive(Clone)]
pub struct LocalService {
    inner: Rc<ServiceInner>,
}

struct ServiceInner {
    config: ServiceConfig,
    next_client: Cell<u16>,
    snapshots: RefCell<SnapshotDb<MemoryStore>>,
    peers: RefCell<HashMap<ContainerId, Vec<Peer>>>,
}

struct Peer {
    client_id: ClientId,
    outbox: UnboundedSender<Delta>,
}

impl LocalService {
    /// Start an empty service.
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            inner: Rc::new(ServiceInner {
                config,
                next_client: Cell::new(1),
                snapshots: RefCell::new(SnapshotDb::with_namespace(MemoryStore::new(), "documents")),
                peers: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Configuration this service was started with.
    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    /// Create a detached container with the objects `schema` declares.
    ///
    /// Nothing is shared until [`Container::attach`] is called.
    pub async fn create_container(&self, schema: &ContainerSchema) -> Result<Container, ClientError> {
        schema.validate()?;
        self.round_trip().await;
        let client_id = self.next_client_id();
        debug!("created detached container for {client_id}");
        Ok(Container::detached(self.clone(), client_id, schema))
    }

    /// Join the document stored under `id`.
    ///
    /// The returned container is attached and holds the document's current
    /// state. Joining writes nothing to the document.
    pub async fn get_container(
        &self,
        id: &ContainerId,
        schema: &ContainerSchema,
    ) -> Result<Container, ClientError> {
        schema.validate()?;
        self.round_trip().await;

        let document: DocumentState = self
            .inner
            .snapshots
            .borrow()
            .load(id.as_str())?
            .ok_or_else(|| ClientError::NotFound(id.clone()))?;
        document.check_schema(schema)?;

        let client_id = self.next_client_id();
        let inbox = self.register(id, client_id);
        info!("{client_id} joined document {id}");
        Ok(Container::joined(self.clone(), client_id, id.clone(), &document, inbox))
    }

    /// Ids of every attached document.
    pub fn documents(&self) -> Vec<ContainerId> {
        match self.inner.snapshots.borrow().keys() {
            Ok(keys) => keys.into_iter().map(ContainerId::new).collect(),
            Err(err) => {
                error!("listing documents failed: {err}");
                Vec::new()
            }
        }
    }

    /// Merged state of the document stored under `id`.
    pub fn document(&self, id: &ContainerId) -> Result<DocumentState, ClientError> {
        self.inner
            .snapshots
            .borrow()
            .load(id.as_str())?
            .ok_or_else(|| ClientError::NotFound(id.clone()))
    }

    /// Number of containers currently connected to `id`.
    pub fn participant_count(&self, id: &ContainerId) -> usize {
        self.inner.peers.borrow().get(id).map_or(0, Vec::len)
    }

    pub(crate) async fn attach(
        &self,
        client_id: ClientId,
        document: &DocumentState,
    ) -> Result<(ContainerId, UnboundedReceiver<Delta>), ClientError> {
        self.round_trip().await;
        let id = ContainerId::new(Uuid::new_v4().to_string());
        self.inner
            .snapshots
            .borrow_mut()
            .save(id.as_str(), document)?;
        let inbox = self.register(&id, client_id);
        Ok((id, inbox))
    }

    /// Merge `delta` into the stored document and relay it to every other
    /// participant.
    pub(crate) fn submit(&self, id: &ContainerId, from: ClientId, delta: Delta) {
        if let Err(err) = self.persist(id, &delta) {
            error!("dropping delta from {from} for document {id}: {err}");
            return;
        }

        let mut registry = self.inner.peers.borrow_mut();
        let Some(peers) = registry.get_mut(id) else {
            return;
        };
        peers.retain(|peer| {
            if peer.client_id == from {
                return true;
            }
            // A closed inbox means the container was dropped without leaving.
            peer.outbox.send(delta.clone()).is_ok()
        });
        debug!(
            "relayed {:?} from {from} to {} peer(s)",
            delta.object,
            peers.len().saturating_sub(1)
        );
    }

    pub(crate) fn leave(&self, id: &ContainerId, client_id: ClientId) {
        if let Some(peers) = self.inner.peers.borrow_mut().get_mut(id) {
            peers.retain(|peer| peer.client_id != client_id);
        }
    }

    fn persist(&self, id: &ContainerId, delta: &Delta) -> Result<(), ClientError> {
        let mut snapshots = self.inner.snapshots.borrow_mut();
        let mut document: DocumentState = snapshots
            .load(id.as_str())?
            .ok_or_else(|| ClientError::NotFound(id.clone()))?;
        if document.apply(delta) {
            snapshots.save(id.as_str(), &document)?;
        }
        Ok(())
    }

    fn register(&self, id: &ContainerId, client_id: ClientId) -> UnboundedReceiver<Delta> {
        let (outbox, inbox) = mpsc::unbounded_channel();
        self.inner
            .peers
            .borrow_mut()
            .entry(id.clone())
            .or_default()
            .push(Peer { client_id, outbox });
        inbox
    }

    fn next_client_id(&self) -> ClientId {
        let id = self.inner.next_client.get();
        self.inner.next_client.set(id.wrapping_add(1).max(1));
        ClientId(id)
    }

    async fn round_trip(&self) {
        let latency = self.inner.config.connect_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}
