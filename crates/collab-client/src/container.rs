use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use collab_kit::clock::{HybridClock, HybridTimestamp};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;

use crate::document::{Delta, DocumentState, ObjectChange, ObjectState};
use crate::error::ClientError;
use crate::map::SharedMap;
use crate::schema::{ContainerSchema, ObjectKind};
use crate::service::LocalService;
use crate::string::SharedString;

/// Opaque identifier of an attached document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Wrap an identifier received from elsewhere (for example a URL fragment).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-container participant number assigned by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u16);

impl ClientId {
    /// Actor name stamped on this participant's text inserts.
    pub fn actor(&self) -> String {
        format!("client-{}", self.0)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// State shared by a container and all of its object handles.
pub(crate) struct Replica {
    client_id: ClientId,
    clock: RefCell<HybridClock>,
    service: LocalService,
    id: RefCell<Option<ContainerId>>,
    connected: Cell<bool>,
    submitted: Cell<u64>,
}

impl Replica {
    fn new(client_id: ClientId, service: LocalService) -> Self {
        Self {
            client_id,
            clock: RefCell::new(HybridClock::new(client_id.0)),
            service,
            id: RefCell::new(None),
            connected: Cell::new(false),
            submitted: Cell::new(0),
        }
    }

    pub(crate) fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Timestamp for a local write.
    pub(crate) fn tick(&self) -> HybridTimestamp {
        self.clock.borrow_mut().now()
    }

    pub(crate) fn observe(&self, remote: HybridTimestamp) {
        self.clock.borrow_mut().receive(&remote);
    }

    /// Relay a local change; detached or disconnected replicas keep it local.
    pub(crate) fn submit(&self, delta: Delta) {
        if !self.connected.get() {
            return;
        }
        if let Some(id) = self.id.borrow().as_ref() {
            self.submitted.set(self.submitted.get() + 1);
            self.service.submit(id, self.client_id, delta);
        }
    }
}

enum SharedObject {
    Map(SharedMap),
    Text(SharedString),
}

/// A participant's replica of a shared document.
///
/// Created detached by [`LocalService::create_container`] or attached by
/// [`LocalService::get_container`].
pub struct Container {
    replica: Rc<Replica>,
    objects: BTreeMap<String, SharedObject>,
    inbox: Mutex<Option<UnboundedReceiver<Delta>>>,
}

impl Container {
    pub(crate) fn detached(
        service: LocalService,
        client_id: ClientId,
        schema: &ContainerSchema,
    ) -> Self {
        let document = DocumentState::from_schema(schema, &client_id.actor());
        Self::from_document(service, client_id, &document)
    }

    pub(crate) fn joined(
        service: LocalService,
        client_id: ClientId,
        id: ContainerId,
        document: &DocumentState,
        inbox: UnboundedReceiver<Delta>,
    ) -> Self {
        let mut container = Self::from_document(service, client_id, document);
        *container.replica.id.borrow_mut() = Some(id);
        container.replica.connected.set(true);
        container.inbox = Mutex::new(Some(inbox));
        container
    }

    fn from_document(service: LocalService, client_id: ClientId, document: &DocumentState) -> Self {
        let replica = Rc::new(Replica::new(client_id, service));
        let actor = client_id.actor();

        let objects = document
            .objects()
            .map(|(name, state)| {
                let object = match state {
                    ObjectState::Map(entries) => {
                        for entry in entries.values() {
                            replica.observe(entry.timestamp());
                        }
                        SharedObject::Map(SharedMap::new(name, entries.clone(), Rc::clone(&replica)))
                    }
                    ObjectState::Text(text) => SharedObject::Text(SharedString::new(
                        name,
                        text.fork(actor.as_str()),
                        Rc::clone(&replica),
                    )),
                };
                (name.to_string(), object)
            })
            .collect();

        Self {
            replica,
            objects,
            inbox: Mutex::new(None),
        }
    }

    /// Id under which the document is joinable, once attached.
    pub fn id(&self) -> Option<ContainerId> {
        self.replica.id.borrow().clone()
    }

    /// Whether this container has been attached or was joined.
    pub fn is_attached(&self) -> bool {
        self.replica.id.borrow().is_some()
    }

    /// Whether local writes are currently relayed to the service.
    pub fn is_connected(&self) -> bool {
        self.replica.connected.get()
    }

    /// This participant's id.
    pub fn client_id(&self) -> ClientId {
        self.replica.client_id()
    }

    /// Number of local changes relayed to the service so far.
    pub fn submitted_count(&self) -> u64 {
        self.replica.submitted.get()
    }

    /// The shared map named `name`.
    pub fn map(&self, name: &str) -> Result<SharedMap, ClientError> {
        match self.objects.get(name) {
            Some(SharedObject::Map(map)) => Ok(map.clone()),
            Some(SharedObject::Text(_)) => Err(ClientError::WrongKind {
                name: name.to_string(),
                expected: ObjectKind::Map,
            }),
            None => Err(ClientError::UnknownObject(name.to_string())),
        }
    }

    /// The shared string named `name`.
    pub fn text(&self, name: &str) -> Result<SharedString, ClientError> {
        match self.objects.get(name) {
            Some(SharedObject::Text(text)) => Ok(text.clone()),
            Some(SharedObject::Map(_)) => Err(ClientError::WrongKind {
                name: name.to_string(),
                expected: ObjectKind::Text,
            }),
            None => Err(ClientError::UnknownObject(name.to_string())),
        }
    }

    /// Current local state of every object.
    pub fn snapshot(&self) -> DocumentState {
        DocumentState::from_objects(self.objects.iter().map(|(name, object)| {
            let state = match object {
                SharedObject::Map(map) => map.snapshot(),
                SharedObject::Text(text) => text.snapshot(),
            };
            (name.clone(), state)
        }))
    }

    /// Publish the container so other participants can join it.
    ///
    /// Everything written while detached becomes the document's initial
    /// state.
    pub async fn attach(&self) -> Result<ContainerId, ClientError> {
        if let Some(id) = self.id() {
            return Err(ClientError::AlreadyAttached(id));
        }

        let (id, inbox) = self
            .replica
            .service
            .attach(self.replica.client_id, &self.snapshot())
            .await?;

        *self.inbox.lock().await = Some(inbox);
        *self.replica.id.borrow_mut() = Some(id.clone());
        self.replica.connected.set(true);
        info!("{} attached document {id}", self.replica.client_id);
        Ok(id)
    }

    /// Apply every remote change that has already arrived.
    ///
    /// Returns the number of deltas applied. Never blocks.
    pub fn process_incoming(&self) -> usize {
        let Ok(mut guard) = self.inbox.try_lock() else {
            return 0;
        };
        let Some(inbox) = guard.as_mut() else {
            return 0;
        };

        let mut pending = Vec::new();
        while let Ok(delta) = inbox.try_recv() {
            pending.push(delta);
        }
        drop(guard);

        for delta in &pending {
            self.apply_remote(delta);
        }
        pending.len()
    }

    /// Wait for the next remote change and apply it.
    ///
    /// Returns `false` once the container is detached or disconnected.
    pub async fn next_remote(&self) -> bool {
        let delta = {
            let mut guard = self.inbox.lock().await;
            match guard.as_mut() {
                Some(inbox) => inbox.recv().await,
                None => None,
            }
        };

        match delta {
            Some(delta) => {
                self.apply_remote(&delta);
                true
            }
            None => false,
        }
    }

    /// Stop relaying changes in either direction.
    ///
    /// Local objects stay readable and writable; their writes no longer leave
    /// this participant.
    pub fn disconnect(&self) {
        if !self.replica.connected.replace(false) {
            return;
        }
        if let Some(id) = self.id() {
            self.replica.service.leave(&id, self.replica.client_id);
            info!("{} left document {id}", self.replica.client_id);
        }
        if let Ok(mut guard) = self.inbox.try_lock() {
            *guard = None;
        }
    }

    fn apply_remote(&self, delta: &Delta) {
        match (self.objects.get(&delta.object), &delta.change) {
            (Some(SharedObject::Map(map)), ObjectChange::MapEntry { key, entry }) => {
                self.replica.observe(entry.timestamp());
                map.apply_remote(key, entry);
            }
            (Some(SharedObject::Text(text)), ObjectChange::Text(patch)) => {
                text.apply_remote(patch);
            }
            _ => {
                warn!(
                    "{} dropped delta for unknown or mismatched object {:?}",
                    self.replica.client_id, delta.object
                );
                return;
            }
        }
        debug!("{} applied remote delta to {:?}", self.replica.client_id, delta.object);
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("client_id", &self.replica.client_id)
            .field("id", &self.id())
            .field("connected", &self.is_connected())
            .field("objects", &self.objects.keys().collect::<Vec<_>>())
            .finish()
    }
}
