use std::collections::HashSet;
use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Crdt;

/// Errors from position-based text edits and remote patches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    /// An insert position lies past the end of the text.
    #[error("position {pos} out of bounds for text of length {len}")]
    Position {
        /// Requested position.
        pos: usize,
        /// Visible length at the time of the edit.
        len: usize,
    },
    /// A removal or replacement range is reversed or runs past the end.
    #[error("range {start}..{end} out of bounds for text of length {len}")]
    Range {
        /// Start of the requested range.
        start: usize,
        /// End of the requested range (exclusive).
        end: usize,
        /// Visible length at the time of the edit.
        len: usize,
    },
    /// A patch refers to a character this replica has never seen.
    #[error("unknown character {seq}@{actor}")]
    UnknownCharacter {
        /// Sequence number of the missing character.
        seq: u64,
        /// Actor that inserted it.
        actor: String,
    },
}

/// A collaboratively editable character sequence (RGA-style).
///
/// Each character carries a unique `(seq, actor)` id and remembers the id of
/// its left neighbour at the time it was inserted. Removal leaves a tombstone
/// in place so that edits made concurrently on other replicas still find
/// their neighbours. Concurrent inserts after the same neighbour are ordered
/// by `(seq, actor)`, larger first.
///
/// Local edits return a [`TextPatch`] holding only what they changed; other
/// replicas catch up with [`TextCrdt::apply_patch`]. Whole replicas can
/// still be combined with [`Crdt::merge`].
///
/// Positions and lengths count `char`s, not bytes.
///
/// # Example
///
/// ```
/// use collab_kit::prelude::*;
///
/// let mut t1 = TextCrdt::new("alice");
/// t1.insert_str(0, "hello").unwrap();
///
/// let mut t2 = t1.fork("bob");
/// let patch = t2.replace_range(0, 5, "howdy").unwrap();
///
/// assert!(t1.apply_patch(&patch).unwrap());
/// assert_eq!(t1.to_string(), "howdy");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextCrdt {
    actor: String,
    seq: u64,
    slots: Vec<Slot>,
}

/// Identity of one inserted character.
///
/// Ordered by `seq` first so that later inserts sort ahead of earlier ones
/// at the same anchor; `actor` breaks ties between replicas.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
struct CharId {
    seq: u64,
    actor: String,
}

impl CharId {
    fn unknown(&self) -> TextError {
        TextError::UnknownCharacter {
            seq: self.seq,
            actor: self.actor.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Slot {
    id: CharId,
    /// Left neighbour when inserted; `None` for the start of the text.
    origin: Option<CharId>,
    ch: char,
    tombstone: bool,
}

/// The characters one local edit inserted and removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPatch {
    inserted: Vec<Slot>,
    removed: Vec<CharId>,
}

impl TextPatch {
    /// Whether the edit changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.removed.is_empty()
    }

    /// Number of characters inserted.
    #[must_use]
    pub fn inserted(&self) -> usize {
        self.inserted.len()
    }

    /// Number of characters removed.
    #[must_use]
    pub fn removed(&self) -> usize {
        self.removed.len()
    }
}

impl TextCrdt {
    /// Create an empty text replica owned by `actor`.
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            seq: 0,
            slots: Vec::new(),
        }
    }

    /// Copy this replica's content under a different actor id.
    ///
    /// Subsequent inserts on the fork get ids that cannot collide with ids
    /// minted by the source replica.
    pub fn fork(&self, actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            ..self.clone()
        }
    }

    /// Insert `s` so that it starts at visible position `pos`.
    pub fn insert_str(&mut self, pos: usize, s: &str) -> Result<TextPatch, TextError> {
        let len = self.len();
        if pos > len {
            return Err(TextError::Position { pos, len });
        }
        let at = self.raw_index_for_insert(pos);
        let mut origin = at.checked_sub(1).map(|raw| self.slots[raw].id.clone());

        let mut run = Vec::new();
        for ch in s.chars() {
            self.seq += 1;
            let id = CharId {
                seq: self.seq,
                actor: self.actor.clone(),
            };
            run.push(Slot {
                origin: origin.replace(id.clone()),
                id,
                ch,
                tombstone: false,
            });
        }
        let tail = self.slots.split_off(at);
        self.slots.extend(run.iter().cloned());
        self.slots.extend(tail);
        Ok(TextPatch {
            inserted: run,
            removed: Vec::new(),
        })
    }

    /// Tombstone the characters in `start..end`.
    pub fn remove_range(&mut self, start: usize, end: usize) -> Result<TextPatch, TextError> {
        self.check_range(start, end)?;
        let removed = self
            .slots
            .iter_mut()
            .filter(|slot| !slot.tombstone)
            .skip(start)
            .take(end - start)
            .map(|slot| {
                slot.tombstone = true;
                slot.id.clone()
            })
            .collect();
        Ok(TextPatch {
            inserted: Vec::new(),
            removed,
        })
    }

    /// Replace the characters in `start..end` with `text`.
    ///
    /// Characters that the old and new content share at either end are
    /// kept, so rewriting a whole field after one keystroke touches only
    /// that keystroke.
    pub fn replace_range(
        &mut self,
        start: usize,
        end: usize,
        text: &str,
    ) -> Result<TextPatch, TextError> {
        self.check_range(start, end)?;
        let old: Vec<char> = self
            .visible()
            .skip(start)
            .take(end - start)
            .map(|slot| slot.ch)
            .collect();
        let new: Vec<char> = text.chars().collect();

        let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
        let suffix = old[prefix..]
            .iter()
            .rev()
            .zip(new[prefix..].iter().rev())
            .take_while(|(a, b)| a == b)
            .count();

        let mut patch = self.remove_range(start + prefix, end - suffix)?;
        let middle: String = new[prefix..new.len() - suffix].iter().collect();
        patch.inserted = self.insert_str(start + prefix, &middle)?.inserted;
        Ok(patch)
    }

    /// Apply the patch of an edit made on another replica.
    ///
    /// A patch must arrive after every patch whose characters it refers to;
    /// otherwise it is rejected whole with [`TextError::UnknownCharacter`].
    /// Applying a patch twice has no further effect. Returns whether the
    /// visible text changed.
    pub fn apply_patch(&mut self, patch: &TextPatch) -> Result<bool, TextError> {
        let fresh: Vec<&Slot> = {
            let mut known: HashSet<&CharId> = self.slots.iter().map(|slot| &slot.id).collect();
            let mut fresh = Vec::new();
            for slot in &patch.inserted {
                if known.contains(&slot.id) {
                    continue;
                }
                if let Some(origin) = slot.origin.as_ref().filter(|o| !known.contains(o)) {
                    return Err(origin.unknown());
                }
                known.insert(&slot.id);
                fresh.push(slot);
            }
            if let Some(id) = patch.removed.iter().find(|id| !known.contains(id)) {
                return Err(id.unknown());
            }
            fresh
        };

        let mut changed = false;
        let mut hint = None;
        for slot in fresh {
            changed |= !slot.tombstone;
            hint = Some(self.integrate(slot.clone(), hint)?);
        }

        let removed: HashSet<&CharId> = patch.removed.iter().collect();
        for slot in self
            .slots
            .iter_mut()
            .filter(|slot| !slot.tombstone && removed.contains(&slot.id))
        {
            slot.tombstone = true;
            changed = true;
        }

        self.observe_seq(patch.inserted.iter().map(|slot| slot.id.seq).max());
        Ok(changed)
    }

    /// Number of visible characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.visible().count()
    }

    /// Whether no visible characters remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visible().next().is_none()
    }

    /// Characters held, tombstones included.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Actor id used for local inserts.
    #[must_use]
    pub fn actor(&self) -> &str {
        &self.actor
    }

    fn visible(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(|slot| !slot.tombstone)
    }

    fn check_range(&self, start: usize, end: usize) -> Result<(), TextError> {
        let len = self.len();
        if start > end || end > len {
            return Err(TextError::Range { start, end, len });
        }
        Ok(())
    }

    /// Appends land after trailing tombstones; everything else lands just
    /// before the character currently at `pos`.
    fn raw_index_for_insert(&self, pos: usize) -> usize {
        if pos == 0 {
            return 0;
        }
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.tombstone)
            .nth(pos)
            .map_or(self.slots.len(), |(raw, _)| raw)
    }

    fn index_of(&self, id: &CharId) -> Option<usize> {
        self.slots.iter().position(|slot| &slot.id == id)
    }

    /// Place a slot unknown to `self` after its origin, past every sibling
    /// with a greater id. `hint` is the raw index of the previously placed
    /// slot, which is usually the origin of the next one in a run.
    fn integrate(&mut self, slot: Slot, hint: Option<usize>) -> Result<usize, TextError> {
        let from = match &slot.origin {
            None => 0,
            Some(origin) => {
                let raw = hint
                    .filter(|&raw| self.slots.get(raw).is_some_and(|s| &s.id == origin))
                    .or_else(|| self.index_of(origin))
                    .ok_or_else(|| origin.unknown())?;
                raw + 1
            }
        };
        let at = self.slots[from..]
            .iter()
            .position(|s| s.id < slot.id)
            .map_or(self.slots.len(), |offset| from + offset);
        self.slots.insert(at, slot);
        Ok(at)
    }

    fn observe_seq(&mut self, seen: Option<u64>) {
        self.seq = self.seq.max(seen.unwrap_or(0));
    }
}

impl Crdt for TextCrdt {
    fn merge(&mut self, other: &Self) {
        // Tombstones win.
        let removed: HashSet<&CharId> = other
            .slots
            .iter()
            .filter(|slot| slot.tombstone)
            .map(|slot| &slot.id)
            .collect();
        for slot in &mut self.slots {
            slot.tombstone |= removed.contains(&slot.id);
        }

        // Every origin precedes its character in `other`, so it is already
        // known here by the time that character is placed.
        let known: HashSet<CharId> = self.slots.iter().map(|slot| slot.id.clone()).collect();
        let mut hint = None;
        for slot in other.slots.iter().filter(|slot| !known.contains(&slot.id)) {
            if let Ok(at) = self.integrate(slot.clone(), hint) {
                hint = Some(at);
            }
        }
        self.observe_seq(Some(other.seq));
    }
}

impl fmt::Display for TextCrdt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.visible().try_for_each(|slot| f.write_char(slot.ch))
    }
}
