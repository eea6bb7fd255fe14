use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use collab_kit::events::{Listeners, SubscriptionId};
use collab_kit::LwwRegister;

use crate::container::Replica;
use crate::document::{merge_entry, Delta, ObjectChange, ObjectState};
use crate::value::Value;

/// Notification that one key of a [`SharedMap`] changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChanged {
    /// The key that changed.
    pub key: String,
    /// Value before the change, if the key existed.
    pub previous: Option<Value>,
    /// `true` when the change was made through this replica.
    pub local: bool,
}

/// A shared key-value map of last-writer-wins scalars.
///
/// Handles are cheap to clone; all clones refer to the same replica object.
#[derive(Clone)]
pub struct SharedMap {
    inner: Rc<MapInner>,
}

struct MapInner {
    name: String,
    entries: RefCell<BTreeMap<String, LwwRegister<Value>>>,
    listeners: Listeners<ValueChanged>,
    replica: Rc<Replica>,
}

impl SharedMap {
    pub(crate) fn new(
        name: &str,
        entries: BTreeMap<String, LwwRegister<Value>>,
        replica: Rc<Replica>,
    ) -> Self {
        Self {
            inner: Rc::new(MapInner {
                name: name.to_string(),
                entries: RefCell::new(entries),
                listeners: Listeners::new(),
                replica,
            }),
        }
    }

    /// Name of this object within its container.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Current value under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner
            .entries
            .borrow()
            .get(key)
            .map(|entry| entry.value().clone())
    }

    /// Current value under `key` if it is an integer.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_int())
    }

    /// Current value under `key` as a float.
    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_float())
    }

    /// Whether `key` holds a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.entries.borrow().contains_key(key)
    }

    /// All keys, in ascending order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.entries.borrow().keys().cloned().collect()
    }

    /// Write `value` under `key`.
    ///
    /// Listeners see the change immediately with `local == true`; other
    /// participants see it once the service has relayed it.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let entry = LwwRegister::new(value, self.inner.replica.tick());

        let previous = self
            .inner
            .entries
            .borrow_mut()
            .insert(key.to_string(), entry.clone())
            .map(|old| old.value().clone());

        self.inner.listeners.emit(&ValueChanged {
            key: key.to_string(),
            previous,
            local: true,
        });
        self.inner.replica.submit(Delta {
            object: self.inner.name.clone(),
            change: ObjectChange::MapEntry {
                key: key.to_string(),
                entry,
            },
        });
    }

    /// Call `listener` after every change of any key.
    pub fn on_value_changed(&self, listener: impl Fn(&ValueChanged) + 'static) -> SubscriptionId {
        self.inner.listeners.subscribe(listener)
    }

    /// Remove a listener registered with [`SharedMap::on_value_changed`].
    pub fn off(&self, id: SubscriptionId) -> bool {
        self.inner.listeners.unsubscribe(id)
    }

    pub(crate) fn apply_remote(&self, key: &str, entry: &LwwRegister<Value>) {
        let previous = self.get(key);
        let won = merge_entry(&mut *self.inner.entries.borrow_mut(), key, entry);
        if won {
            self.inner.listeners.emit(&ValueChanged {
                key: key.to_string(),
                previous,
                local: false,
            });
        }
    }

    pub(crate) fn snapshot(&self) -> ObjectState {
        ObjectState::Map(self.inner.entries.borrow().clone())
    }
}

impl fmt::Debug for SharedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedMap")
            .field("name", &self.inner.name)
            .field("entries", &self.inner.entries.borrow().len())
            .finish()
    }
}
