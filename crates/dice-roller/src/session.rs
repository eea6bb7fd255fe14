//! Session bootstrap: create a new shared document or join an existing one.
//!
//! The session address is a page URL. A URL without a fragment starts a new
//! session; `…#<id>` joins the document stored under `<id>`.

use std::fmt;

use collab_client::{
    ClientError, Container, ContainerId, ContainerSchema, LocalService, SharedMap, SharedString,
};
use log::{info, warn};

/// Name of the map holding the dice value.
pub const DICE_MAP: &str = "diceMap";
/// Name of the free text string.
pub const FREE_TEXT: &str = "freeText";
/// Name of the map holding the cube rotation.
pub const ROTATION_MAP: &str = "rotation";

/// Key of the dice value inside [`DICE_MAP`].
pub const DICE_VALUE_KEY: &str = "dice-value-key";
/// Key of the x rotation inside [`ROTATION_MAP`].
pub const ROTATION_X_KEY: &str = "rotation-x-key";
/// Key of the y rotation inside [`ROTATION_MAP`].
pub const ROTATION_Y_KEY: &str = "rotation-y-key";

/// Objects every session document holds.
pub fn schema() -> ContainerSchema {
    ContainerSchema::new()
        .map(DICE_MAP)
        .text(FREE_TEXT)
        .map(ROTATION_MAP)
}

/// Whether this participant created the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Created the document; owns the animation.
    Originator,
    /// Joined an existing document; mirrors the animation.
    Joiner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Originator => f.write_str("originator"),
            Role::Joiner => f.write_str("joiner"),
        }
    }
}

/// A page URL split at its fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAddress {
    base: String,
    fragment: Option<String>,
}

impl SessionAddress {
    /// Split `url` at the first `#`. An empty fragment counts as none.
    pub fn parse(url: &str) -> Self {
        match url.split_once('#') {
            Some((base, fragment)) if !fragment.trim().is_empty() => Self {
                base: base.to_string(),
                fragment: Some(fragment.trim().to_string()),
            },
            Some((base, _)) => Self {
                base: base.to_string(),
                fragment: None,
            },
            None => Self {
                base: url.to_string(),
                fragment: None,
            },
        }
    }

    /// Address part before the fragment.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The fragment, if any.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Document to join, if the address names one.
    pub fn join_id(&self) -> Option<ContainerId> {
        self.fragment.as_deref().map(ContainerId::new)
    }

    /// The same base with `id` as fragment.
    pub fn with_fragment(&self, id: &ContainerId) -> Self {
        Self {
            base: self.base.clone(),
            fragment: Some(id.as_str().to_string()),
        }
    }
}

impl fmt::Display for SessionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fragment {
            Some(fragment) => write!(f, "{}#{}", self.base, fragment),
            None => f.write_str(&self.base),
        }
    }
}

/// Why a session could not be started. Startup is not retried.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The new document could not be created.
    #[error("failed to create session document: {0}")]
    Create(#[source] ClientError),
    /// The new document could not be published to the service.
    #[error("failed to attach session document: {0}")]
    Attach(#[source] ClientError),
    /// The document named by the address could not be joined.
    #[error("failed to join session {id}: {source}")]
    Join {
        /// Requested document.
        id: ContainerId,
        /// Underlying failure.
        #[source]
        source: ClientError,
    },
    /// The document does not hold the expected objects.
    #[error("session document is missing an object: {0}")]
    Objects(#[source] ClientError),
}

/// A started session: the container, its shared objects and the address
/// other participants use to join.
pub struct Session {
    container: Container,
    role: Role,
    address: SessionAddress,
    dice: SharedMap,
    text: SharedString,
    rotation: SharedMap,
}

impl Session {
    /// Create or join depending on `address`.
    ///
    /// Without a fragment a new document is created, seeded, attached and
    /// the returned session's address carries its id. With a fragment the
    /// named document is joined; nothing is written to it.
    pub async fn bootstrap(
        service: &LocalService,
        address: &SessionAddress,
    ) -> Result<Self, StartupError> {
        let schema = schema();
        match address.join_id() {
            None => {
                let container = service
                    .create_container(&schema)
                    .await
                    .map_err(StartupError::Create)?;
                let objects = SessionObjects::resolve(&container)?;
                objects.seed();
                let id = container.attach().await.map_err(StartupError::Attach)?;
                let address = address.with_fragment(&id);
                info!("started new session at {address}");
                Ok(Self::new(container, Role::Originator, address, objects))
            }
            Some(id) => {
                let container = service.get_container(&id, &schema).await.map_err(|source| {
                    warn!("could not join session {id}: {source}");
                    StartupError::Join {
                        id: id.clone(),
                        source,
                    }
                })?;
                let objects = SessionObjects::resolve(&container)?;
                info!("joined session at {address}");
                Ok(Self::new(container, Role::Joiner, address.clone(), objects))
            }
        }
    }

    fn new(container: Container, role: Role, address: SessionAddress, objects: SessionObjects) -> Self {
        Self {
            container,
            role,
            address,
            dice: objects.dice,
            text: objects.text,
            rotation: objects.rotation,
        }
    }

    /// The underlying container.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Whether this participant created the session.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Address with the document id as fragment.
    pub fn address(&self) -> &SessionAddress {
        &self.address
    }

    /// The dice map.
    pub fn dice(&self) -> &SharedMap {
        &self.dice
    }

    /// The free text string.
    pub fn text(&self) -> &SharedString {
        &self.text
    }

    /// The rotation map.
    pub fn rotation(&self) -> &SharedMap {
        &self.rotation
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role)
            .field("address", &self.address.to_string())
            .finish()
    }
}

struct SessionObjects {
    dice: SharedMap,
    text: SharedString,
    rotation: SharedMap,
}

impl SessionObjects {
    fn resolve(container: &Container) -> Result<Self, StartupError> {
        Ok(Self {
            dice: container.map(DICE_MAP).map_err(StartupError::Objects)?,
            text: container.text(FREE_TEXT).map_err(StartupError::Objects)?,
            rotation: container.map(ROTATION_MAP).map_err(StartupError::Objects)?,
        })
    }

    /// Initial values, written while the container is still detached.
    fn seed(&self) {
        self.dice.set(DICE_VALUE_KEY, 1);
        self.rotation.set(ROTATION_X_KEY, 0.0);
        self.rotation.set(ROTATION_Y_KEY, 0.0);
    }
}
