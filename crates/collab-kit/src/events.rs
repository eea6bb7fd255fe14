//! Typed change notifications.
//!
//! Shared objects announce every visible change to their listeners. A
//! listener is registered once, receives each event by reference, and is
//! removed again with the [`SubscriptionId`] returned at registration.
//!
//! Notifications are dispatched synchronously on the caller's thread. The
//! registry is snapshotted before dispatch, so a listener may read the object
//! that emitted the event, register further listeners or unsubscribe itself
//! without tripping a borrow conflict; such changes take effect from the next
//! event on.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use collab_kit::events::Listeners;
//!
//! let seen = Rc::new(Cell::new(0));
//! let listeners: Listeners<u32> = Listeners::new();
//!
//! let sink = Rc::clone(&seen);
//! let id = listeners.subscribe(move |v: &u32| sink.set(*v));
//!
//! listeners.emit(&7);
//! assert_eq!(seen.get(), 7);
//!
//! assert!(listeners.unsubscribe(id));
//! listeners.emit(&9);
//! assert_eq!(seen.get(), 7);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle identifying one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

type Listener<E> = Rc<dyn Fn(&E)>;

/// Registry of listeners for events of type `E`.
pub struct Listeners<E> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(SubscriptionId, Listener<E>)>>,
}

impl<E> Listeners<E> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Register `listener` and return its handle.
    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Remove the listener registered under `id`.
    ///
    /// Returns `false` if no such listener exists.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    /// Deliver `event` to every listener in registration order.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let listeners = Listeners::<String>::new();

        for tag in ["first", "second"] {
            let log = Rc::clone(&log);
            listeners.subscribe(move |e: &String| log.borrow_mut().push(format!("{tag}:{e}")));
        }
        listeners.emit(&"ping".to_string());

        assert_eq!(*log.borrow(), vec!["first:ping", "second:ping"]);
    }

    #[test]
    fn unsubscribe_unknown_id_is_false() {
        let listeners = Listeners::<()>::new();
        let id = listeners.subscribe(|_| {});
        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        assert!(listeners.is_empty());
    }

    #[test]
    fn listener_may_unsubscribe_itself_during_emit() {
        let listeners = Rc::new(Listeners::<u8>::new());
        let hits = Rc::new(Cell::new(0));
        let own_id = Rc::new(Cell::new(None));

        let registry = Rc::clone(&listeners);
        let counter = Rc::clone(&hits);
        let slot = Rc::clone(&own_id);
        let id = listeners.subscribe(move |_| {
            counter.set(counter.get() + 1);
            if let Some(id) = slot.get() {
                registry.unsubscribe(id);
            }
        });
        own_id.set(Some(id));

        listeners.emit(&1);
        listeners.emit(&2);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn ids_are_unique() {
        let listeners = Listeners::<()>::new();
        let a = listeners.subscribe(|_| {});
        let b = listeners.subscribe(|_| {});
        assert_ne!(a, b);
        assert_eq!(listeners.len(), 2);
    }
}
