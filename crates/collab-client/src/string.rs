use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use collab_kit::events::{Listeners, SubscriptionId};
use collab_kit::{TextCrdt, TextError, TextPatch};
use log::warn;

use crate::container::Replica;
use crate::document::{Delta, ObjectChange, ObjectState};
use crate::error::ClientError;

/// Notification that the content of a [`SharedString`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceDelta {
    /// `true` when the change was made through this replica.
    pub local: bool,
    /// Length in characters after the change.
    pub length: usize,
}

/// A shared, collaboratively editable string.
///
/// Positions count characters. Handles are cheap to clone.
#[derive(Clone)]
pub struct SharedString {
    inner: Rc<StringInner>,
}

struct StringInner {
    name: String,
    text: RefCell<TextCrdt>,
    listeners: Listeners<SequenceDelta>,
    replica: Rc<Replica>,
}

impl SharedString {
    pub(crate) fn new(name: &str, text: TextCrdt, replica: Rc<Replica>) -> Self {
        Self {
            inner: Rc::new(StringInner {
                name: name.to_string(),
                text: RefCell::new(text),
                listeners: Listeners::new(),
                replica,
            }),
        }
    }

    /// Name of this object within its container.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Length in characters.
    pub fn get_length(&self) -> usize {
        self.inner.text.borrow().len()
    }

    /// Full current text.
    pub fn get_text(&self) -> String {
        self.inner.text.borrow().to_string()
    }

    /// Insert `text` at character position `pos`.
    pub fn insert_text(&self, pos: usize, text: &str) -> Result<(), ClientError> {
        self.edit(|t| t.insert_str(pos, text))
    }

    /// Remove the characters in `start..end`.
    pub fn remove_text(&self, start: usize, end: usize) -> Result<(), ClientError> {
        self.edit(|t| t.remove_range(start, end))
    }

    /// Replace the characters in `start..end` with `text`.
    pub fn replace_text(&self, start: usize, end: usize, text: &str) -> Result<(), ClientError> {
        self.edit(|t| t.replace_range(start, end, text))
    }

    /// Call `listener` after every content change.
    pub fn on_sequence_delta(
        &self,
        listener: impl Fn(&SequenceDelta) + 'static,
    ) -> SubscriptionId {
        self.inner.listeners.subscribe(listener)
    }

    /// Remove a listener registered with [`SharedString::on_sequence_delta`].
    pub fn off(&self, id: SubscriptionId) -> bool {
        self.inner.listeners.unsubscribe(id)
    }

    fn edit(
        &self,
        op: impl FnOnce(&mut TextCrdt) -> Result<TextPatch, TextError>,
    ) -> Result<(), ClientError> {
        let (patch, length) = {
            let mut text = self.inner.text.borrow_mut();
            let patch = op(&mut *text)?;
            (patch, text.len())
        };
        if patch.is_empty() {
            return Ok(());
        }

        self.inner.listeners.emit(&SequenceDelta {
            local: true,
            length,
        });
        self.inner.replica.submit(Delta {
            object: self.inner.name.clone(),
            change: ObjectChange::Text(patch),
        });
        Ok(())
    }

    pub(crate) fn apply_remote(&self, patch: &TextPatch) {
        let applied = {
            let mut text = self.inner.text.borrow_mut();
            text.apply_patch(patch).map(|changed| (changed, text.len()))
        };

        match applied {
            Ok((true, length)) => self.inner.listeners.emit(&SequenceDelta {
                local: false,
                length,
            }),
            Ok((false, _)) => {}
            Err(err) => warn!("{} ignored a text patch: {err}", self.inner.name),
        }
    }

    pub(crate) fn snapshot(&self) -> ObjectState {
        ObjectState::Text(self.inner.text.borrow().clone())
    }
}

impl fmt::Debug for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedString")
            .field("name", &self.inner.name)
            .field("length", &self.get_length())
            .finish()
    }
}
