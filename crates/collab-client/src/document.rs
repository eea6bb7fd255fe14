//! Serializable document state and the deltas exchanged between replicas.

use std::collections::BTreeMap;

use collab_kit::{Crdt, LwwRegister, TextCrdt, TextPatch};
use collab_store::Versioned;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::schema::{ContainerSchema, ObjectKind};
use crate::value::Value;

/// Replicated state of one shared object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectState {
    /// Entries of a shared map.
    Map(BTreeMap<String, LwwRegister<Value>>),
    /// Content of a shared string.
    Text(TextCrdt),
}

impl ObjectState {
    /// Empty state for an object of `kind`; text inserts are attributed to `actor`.
    pub fn empty(kind: ObjectKind, actor: &str) -> Self {
        match kind {
            ObjectKind::Map => Self::Map(BTreeMap::new()),
            ObjectKind::Text => Self::Text(TextCrdt::new(actor)),
        }
    }

    /// Kind of this object.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Map(_) => ObjectKind::Map,
            Self::Text(_) => ObjectKind::Text,
        }
    }
}

/// A single change submitted by one replica for all others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectChange {
    /// One map entry as written by the sender.
    MapEntry {
        /// Map key.
        key: String,
        /// The sender's register for that key.
        entry: LwwRegister<Value>,
    },
    /// Characters the sender inserted and removed.
    Text(TextPatch),
}

/// A change addressed to a named object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    /// Name of the target object.
    pub object: String,
    /// What changed.
    pub change: ObjectChange,
}

/// Merged state of a whole document, as persisted by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentState {
    objects: BTreeMap<String, ObjectState>,
}

impl Versioned for DocumentState {
    const SCHEMA_VERSION: u8 = 1;
}

impl DocumentState {
    /// Empty document with every object `schema` declares.
    pub fn from_schema(schema: &ContainerSchema, actor: &str) -> Self {
        let objects = schema
            .objects()
            .map(|(name, kind)| (name.to_string(), ObjectState::empty(kind, actor)))
            .collect();
        Self { objects }
    }

    /// Build a document from already populated object states.
    pub fn from_objects(objects: impl IntoIterator<Item = (String, ObjectState)>) -> Self {
        Self {
            objects: objects.into_iter().collect(),
        }
    }

    /// State of the object named `name`.
    pub fn object(&self, name: &str) -> Option<&ObjectState> {
        self.objects.get(name)
    }

    /// All objects by name.
    pub fn objects(&self) -> impl Iterator<Item = (&str, &ObjectState)> {
        self.objects.iter().map(|(name, state)| (name.as_str(), state))
    }

    /// Check that every object `schema` declares is present with the right kind.
    pub fn check_schema(&self, schema: &ContainerSchema) -> Result<(), ClientError> {
        for (name, expected) in schema.objects() {
            match self.objects.get(name) {
                Some(state) if state.kind() == expected => {}
                _ => {
                    return Err(ClientError::SchemaMismatch {
                        name: name.to_string(),
                        expected,
                    })
                }
            }
        }
        Ok(())
    }

    /// Merge `delta` into the document.
    ///
    /// Returns `false` if the delta addresses an unknown object, an object
    /// of another kind, or text characters the document has never seen; such
    /// deltas are ignored.
    pub fn apply(&mut self, delta: &Delta) -> bool {
        match (self.objects.get_mut(&delta.object), &delta.change) {
            (Some(ObjectState::Map(entries)), ObjectChange::MapEntry { key, entry }) => {
                merge_entry(entries, key, entry);
                true
            }
            (Some(ObjectState::Text(text)), ObjectChange::Text(patch)) => {
                text.apply_patch(patch).is_ok()
            }
            _ => false,
        }
    }
}

/// Merge one remote map entry; returns `true` if the remote write won.
pub(crate) fn merge_entry(
    entries: &mut BTreeMap<String, LwwRegister<Value>>,
    key: &str,
    incoming: &LwwRegister<Value>,
) -> bool {
    match entries.get_mut(key) {
        Some(existing) => {
            let before = existing.timestamp();
            existing.merge(incoming);
            existing.timestamp() != before
        }
        None => {
            entries.insert(key.to_string(), incoming.clone());
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collab_kit::clock::HybridTimestamp;

    fn ts(physical: u64, node_id: u16) -> HybridTimestamp {
        HybridTimestamp {
            physical,
            logical: 0,
            node_id,
        }
    }

    fn schema() -> ContainerSchema {
        ContainerSchema::new().map("dice").text("notes")
    }

    #[test]
    fn from_schema_creates_empty_objects() {
        let doc = DocumentState::from_schema(&schema(), "client-1");
        assert_eq!(doc.object("dice").map(ObjectState::kind), Some(ObjectKind::Map));
        assert_eq!(doc.object("notes").map(ObjectState::kind), Some(ObjectKind::Text));
        assert!(doc.check_schema(&schema()).is_ok());
    }

    #[test]
    fn schema_mismatch_is_detected() {
        let doc = DocumentState::from_schema(&schema(), "client-1");
        let other = ContainerSchema::new().text("dice");
        assert!(matches!(
            doc.check_schema(&other),
            Err(ClientError::SchemaMismatch { name, expected: ObjectKind::Text }) if name == "dice"
        ));
        let missing = ContainerSchema::new().map("rotation");
        assert!(doc.check_schema(&missing).is_err());
    }

    #[test]
    fn later_map_entry_wins() {
        let mut doc = DocumentState::from_schema(&schema(), "client-1");
        let first = Delta {
            object: "dice".into(),
            change: ObjectChange::MapEntry {
                key: "value".into(),
                entry: LwwRegister::new(Value::Int(2), ts(2, 1)),
            },
        };
        let stale = Delta {
            object: "dice".into(),
            change: ObjectChange::MapEntry {
                key: "value".into(),
                entry: LwwRegister::new(Value::Int(5), ts(1, 2)),
            },
        };
        assert!(doc.apply(&first));
        assert!(doc.apply(&stale));

        let Some(ObjectState::Map(entries)) = doc.object("dice") else {
            panic!("dice should be a map");
        };
        assert_eq!(entries["value"].value(), &Value::Int(2));
    }

    #[test]
    fn mismatched_delta_is_ignored() {
        let mut doc = DocumentState::from_schema(&schema(), "client-1");
        let delta = Delta {
            object: "notes".into(),
            change: ObjectChange::MapEntry {
                key: "k".into(),
                entry: LwwRegister::new(Value::Int(1), ts(1, 1)),
            },
        };
        assert!(!doc.apply(&delta));

        let unknown = Delta {
            object: "nope".into(),
            change: ObjectChange::Text(TextPatch::default()),
        };
        assert!(!doc.apply(&unknown));
    }

    #[test]
    fn text_patches_are_applied_in_order() {
        let mut doc = DocumentState::from_schema(&schema(), "service");
        let mut writer = TextCrdt::new("client-2");
        let first = writer.insert_str(0, "roll").unwrap();
        let second = writer.insert_str(4, "ed").unwrap();

        let delta = |patch: TextPatch| Delta {
            object: "notes".into(),
            change: ObjectChange::Text(patch),
        };
        // Out of order: the second patch hangs off characters not yet seen.
        assert!(!doc.apply(&delta(second.clone())));
        assert!(doc.apply(&delta(first)));
        assert!(doc.apply(&delta(second)));

        let Some(ObjectState::Text(text)) = doc.object("notes") else {
            panic!("notes should be text");
        };
        assert_eq!(text.to_string(), "rolled");
    }

    #[test]
    fn merge_entry_reports_winner() {
        let mut entries = BTreeMap::new();
        assert!(merge_entry(&mut entries, "k", &LwwRegister::new(Value::Int(1), ts(5, 1))));
        assert!(!merge_entry(&mut entries, "k", &LwwRegister::new(Value::Int(2), ts(4, 1))));
        assert!(merge_entry(&mut entries, "k", &LwwRegister::new(Value::Int(3), ts(6, 2))));
        assert_eq!(entries["k"].value(), &Value::Int(3));
    }
}
