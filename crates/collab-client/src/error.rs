use collab_kit::TextError;
use collab_store::{MemoryError, StoreError};
use thiserror::Error;

use crate::container::ContainerId;
use crate::schema::ObjectKind;

/// Errors surfaced by containers and the document service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No document is stored under the requested id.
    #[error("container {0} not found")]
    NotFound(ContainerId),
    /// `attach` was called on a container that already has an id.
    #[error("container is already attached as {0}")]
    AlreadyAttached(ContainerId),
    /// A schema declares the same object name twice.
    #[error("object {0:?} declared more than once")]
    DuplicateObject(String),
    /// The stored document lacks an object the schema declares, or holds it
    /// with a different kind.
    #[error("document does not match schema: object {name:?} should be a {expected}")]
    SchemaMismatch {
        /// Object name from the schema.
        name: String,
        /// Kind the schema declares.
        expected: ObjectKind,
    },
    /// No object with this name exists in the container.
    #[error("no shared object named {0:?}")]
    UnknownObject(String),
    /// The object exists but is of another kind.
    #[error("object {name:?} is not a {expected}")]
    WrongKind {
        /// Object name.
        name: String,
        /// Kind the caller asked for.
        expected: ObjectKind,
    },
    /// A text edit addressed positions outside the current text.
    #[error(transparent)]
    Range(#[from] TextError),
    /// Snapshot persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError<MemoryError>),
}
