use serde::{Deserialize, Serialize};

use crate::clock::HybridTimestamp;
use crate::Crdt;

/// A last-writer-wins register.
///
/// Concurrent writes are resolved by keeping the value carrying the greatest
/// [`HybridTimestamp`]. Because timestamps embed the writer's node id, two
/// distinct writers never tie.
///
/// # Example
///
/// ```
/// use collab_kit::prelude::*;
///
/// let ts = |physical, node_id| HybridTimestamp { physical, logical: 0, node_id };
///
/// let mut r1 = LwwRegister::new("one", ts(10, 1));
/// let r2 = LwwRegister::new("two", ts(20, 2));
///
/// r1.merge(&r2);
/// assert_eq!(*r1.value(), "two");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LwwRegister<T> {
    value: T,
    timestamp: HybridTimestamp,
}

impl<T: Clone> LwwRegister<T> {
    /// Create a register holding `value` written at `timestamp`.
    pub fn new(value: T, timestamp: HybridTimestamp) -> Self {
        Self { value, timestamp }
    }

    /// Write `value` at `timestamp`.
    ///
    /// Returns `false` and leaves the register untouched when `timestamp` is
    /// older than the current one.
    pub fn set(&mut self, value: T, timestamp: HybridTimestamp) -> bool {
        if timestamp >= self.timestamp {
            self.value = value;
            self.timestamp = timestamp;
            true
        } else {
            false
        }
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Timestamp of the write that produced the current value.
    #[must_use]
    pub fn timestamp(&self) -> HybridTimestamp {
        self.timestamp
    }

    /// Node id of the participant that wrote the current value.
    #[must_use]
    pub fn writer(&self) -> u16 {
        self.timestamp.node_id
    }
}

impl<T: Clone> Crdt for LwwRegister<T> {
    fn merge(&mut self, other: &Self) {
        if other.timestamp > self.timestamp {
            self.value = other.value.clone();
            self.timestamp = other.timestamp;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ts(physical: u64, node_id: u16) -> HybridTimestamp {
        HybridTimestamp {
            physical,
            logical: 0,
            node_id,
        }
    }

    #[test]
    fn set_ignores_stale_writes() {
        let mut r = LwwRegister::new(1, ts(5, 1));
        assert!(!r.set(2, ts(4, 1)));
        assert_eq!(*r.value(), 1);

        assert!(r.set(3, ts(6, 2)));
        assert_eq!(*r.value(), 3);
        assert_eq!(r.writer(), 2);
    }

    #[test]
    fn merge_keeps_later_write() {
        let mut r1 = LwwRegister::new("old", ts(1, 1));
        let r2 = LwwRegister::new("new", ts(2, 2));

        r1.merge(&r2);
        assert_eq!(*r1.value(), "new");

        let mut r3 = LwwRegister::new("newest", ts(3, 1));
        r3.merge(&r2);
        assert_eq!(*r3.value(), "newest");
    }

    #[test]
    fn same_millisecond_resolved_by_node_id() {
        let mut r1 = LwwRegister::new("first", ts(1, 1));
        let r2 = LwwRegister::new("second", ts(1, 2));

        r1.merge(&r2);
        assert_eq!(*r1.value(), "second");
    }

    fn register() -> impl Strategy<Value = LwwRegister<i64>> {
        (any::<i64>(), 0u64..100, 0u16..4, 0u16..4).prop_map(|(v, p, l, n)| {
            LwwRegister::new(
                v,
                HybridTimestamp {
                    physical: p,
                    logical: l,
                    node_id: n,
                },
            )
        })
    }

    proptest! {
        #[test]
        fn merge_is_commutative(a in register(), b in register()) {
            prop_assume!(a.timestamp() != b.timestamp() || a.value() == b.value());
            let mut ab = a.clone();
            ab.merge(&b);
            let mut ba = b.clone();
            ba.merge(&a);
            prop_assert_eq!(ab, ba);
        }

        #[test]
        fn merge_is_idempotent(a in register(), b in register()) {
            let mut once = a.clone();
            once.merge(&b);
            let mut twice = once.clone();
            twice.merge(&b);
            prop_assert_eq!(once, twice);
        }
    }
}
