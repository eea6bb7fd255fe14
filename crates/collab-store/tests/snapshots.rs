//! Shared-document state round-trips through the snapshot database.

use collab_kit::prelude::*;
use collab_store::{MemoryStore, SnapshotDb, Versioned};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Document {
    dice: LwwRegister<i64>,
    text: TextCrdt,
}

impl Versioned for Document {
    const SCHEMA_VERSION: u8 = 1;
}

fn fixed() -> u64 {
    7
}

#[test]
fn document_snapshots_restore_merged_state() {
    let mut clock = HybridClock::with_time_source(1, fixed);
    let mut doc = Document {
        dice: LwwRegister::new(1, clock.now()),
        text: TextCrdt::new("client-1"),
    };
    doc.dice.set(5, clock.now());
    doc.text.insert_str(0, "hello").unwrap();

    let mut db = SnapshotDb::new(MemoryStore::new());
    db.save("session", &doc).unwrap();

    let mut restored: Document = db.load("session").unwrap().unwrap();
    assert_eq!(restored, doc);

    // A restored replica keeps merging with live ones.
    let mut live = doc.text.fork("client-2");
    live.insert_str(5, ", world").unwrap();
    restored.text.merge(&live);
    assert_eq!(restored.text.to_string(), "hello, world");
}

#[test]
fn later_saves_replace_earlier_snapshots() {
    let mut clock = HybridClock::with_time_source(1, fixed);
    let mut db = SnapshotDb::new(MemoryStore::new());

    let mut doc = Document {
        dice: LwwRegister::new(1, clock.now()),
        text: TextCrdt::new("client-1"),
    };
    db.save("session", &doc).unwrap();

    doc.dice.set(2, clock.now());
    db.save("session", &doc).unwrap();

    let loaded: Document = db.load("session").unwrap().unwrap();
    assert_eq!(*loaded.dice.value(), 2);
    assert_eq!(db.store().len(), 1);
}
