use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Kind of a shared object declared in a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Key-value map of last-writer-wins scalars.
    Map,
    /// Collaboratively editable text.
    Text,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map => write!(f, "SharedMap"),
            Self::Text => write!(f, "SharedString"),
        }
    }
}

/// The named shared objects every container of a document starts with.
///
/// ```
/// use collab_client::{ContainerSchema, ObjectKind};
///
/// let schema = ContainerSchema::new().map("diceMap").text("freeText");
/// assert_eq!(schema.kind_of("freeText"), Some(ObjectKind::Text));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSchema {
    objects: Vec<(String, ObjectKind)>,
}

impl ContainerSchema {
    /// An empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a [`SharedMap`](crate::SharedMap) named `name`.
    pub fn map(self, name: impl Into<String>) -> Self {
        self.with(name, ObjectKind::Map)
    }

    /// Declare a [`SharedString`](crate::SharedString) named `name`.
    pub fn text(self, name: impl Into<String>) -> Self {
        self.with(name, ObjectKind::Text)
    }

    /// Declare an object of `kind` named `name`.
    pub fn with(mut self, name: impl Into<String>, kind: ObjectKind) -> Self {
        self.objects.push((name.into(), kind));
        self
    }

    /// Declared objects in declaration order.
    pub fn objects(&self) -> impl Iterator<Item = (&str, ObjectKind)> {
        self.objects.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    /// Kind of the object named `name`.
    pub fn kind_of(&self, name: &str) -> Option<ObjectKind> {
        self.objects
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, kind)| *kind)
    }

    /// Reject schemas that declare the same name twice.
    pub fn validate(&self) -> Result<(), ClientError> {
        let mut seen = BTreeSet::new();
        for (name, _) in &self.objects {
            if !seen.insert(name.as_str()) {
                return Err(ClientError::DuplicateObject(name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_declaration_order() {
        let schema = ContainerSchema::new().map("a").text("b").map("c");
        let names: Vec<_> = schema.objects().map(|(n, _)| n).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let schema = ContainerSchema::new().map("a").text("a");
        assert!(matches!(
            schema.validate(),
            Err(ClientError::DuplicateObject(name)) if name == "a"
        ));
    }
}
