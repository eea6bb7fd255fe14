//! Hybrid logical clock used to order writes across participants.
//!
//! A timestamp pairs wall-clock milliseconds with a logical counter, so a
//! participant's own writes are strictly increasing even when its physical
//! clock stalls or goes backward, and a write made after observing a remote
//! write always sorts after it.
//!
//! # Example
//!
//! ```
//! use collab_kit::clock::{HybridClock, HybridTimestamp};
//!
//! let mut clock = HybridClock::new(1);
//!
//! let ts1 = clock.now();
//! let ts2 = clock.now();
//! assert!(ts2 > ts1);
//!
//! let remote = HybridTimestamp { physical: ts2.physical + 1000, logical: 0, node_id: 2 };
//! let ts3 = clock.receive(&remote);
//! assert!(ts3 > remote);
//! ```

use std::cmp::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A point in hybrid logical time.
///
/// Ordered by `physical`, then `logical`, then `node_id`, which makes the
/// order total across participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HybridTimestamp {
    /// Wall-clock component in milliseconds.
    pub physical: u64,
    /// Counter for events within the same millisecond.
    pub logical: u16,
    /// Participant that produced the timestamp.
    pub node_id: u16,
}

impl HybridTimestamp {
    /// The timestamp that sorts before every timestamp a clock can produce.
    pub const ZERO: Self = Self {
        physical: 0,
        logical: 0,
        node_id: 0,
    };
}

impl Default for HybridTimestamp {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Ord for HybridTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.physical, self.logical, self.node_id).cmp(&(
            other.physical,
            other.logical,
            other.node_id,
        ))
    }
}

impl PartialOrd for HybridTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-participant hybrid logical clock.
#[derive(Debug, Clone)]
pub struct HybridClock {
    node: u16,
    latest: HybridTimestamp,
    wall_clock: fn() -> u64,
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

impl HybridClock {
    /// Create a clock for `node_id` reading physical time from `SystemTime`.
    pub fn new(node_id: u16) -> Self {
        Self::with_time_source(node_id, unix_millis)
    }

    /// Create a clock with a custom millisecond time source.
    pub fn with_time_source(node_id: u16, wall_clock: fn() -> u64) -> Self {
        Self {
            node: node_id,
            latest: HybridTimestamp::ZERO,
            wall_clock,
        }
    }

    /// Timestamp a local event.
    pub fn now(&mut self) -> HybridTimestamp {
        let wall = (self.wall_clock)();
        let prev = self.latest;
        if wall > prev.physical {
            self.advance_to(wall, 0)
        } else {
            self.advance_past(prev.physical, prev.logical)
        }
    }

    /// Fold a remote timestamp into the clock.
    ///
    /// The returned timestamp is strictly greater than both the previous local
    /// timestamp and `remote`.
    pub fn receive(&mut self, remote: &HybridTimestamp) -> HybridTimestamp {
        let wall = (self.wall_clock)();
        let prev = self.latest;
        let physical = wall.max(prev.physical).max(remote.physical);

        match (physical == prev.physical, physical == remote.physical) {
            (true, true) => self.advance_past(physical, prev.logical.max(remote.logical)),
            (true, false) => self.advance_past(physical, prev.logical),
            (false, true) => self.advance_past(physical, remote.logical),
            (false, false) => self.advance_to(physical, 0),
        }
    }

    /// Step just past `(physical, logical)`. An exhausted counter carries
    /// into the next millisecond.
    fn advance_past(&mut self, physical: u64, logical: u16) -> HybridTimestamp {
        match logical.checked_add(1) {
            Some(next) => self.advance_to(physical, next),
            None => self.advance_to(physical.saturating_add(1), 0),
        }
    }

    fn advance_to(&mut self, physical: u64, logical: u16) -> HybridTimestamp {
        self.latest = HybridTimestamp {
            physical,
            logical,
            node_id: self.node,
        };
        self.latest
    }

    /// Participant id stamped into every timestamp.
    pub fn node_id(&self) -> u16 {
        self.node
    }

    /// Most recent timestamp produced by this clock.
    pub fn last_timestamp(&self) -> HybridTimestamp {
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frozen() -> u64 {
        5_000
    }

    fn ancient() -> u64 {
        1
    }

    #[test]
    fn local_timestamps_increase_within_one_millisecond() {
        let mut clock = HybridClock::with_time_source(1, frozen);

        let ts1 = clock.now();
        let ts2 = clock.now();
        let ts3 = clock.now();

        assert!(ts1 < ts2 && ts2 < ts3);
        assert_eq!(ts1.physical, 5_000);
        assert_eq!((ts1.logical, ts2.logical, ts3.logical), (0, 1, 2));
    }

    #[test]
    fn receive_jumps_past_a_remote_clock_that_runs_ahead() {
        let mut clock = HybridClock::with_time_source(1, ancient);
        let remote = HybridTimestamp {
            physical: 9_000,
            logical: 3,
            node_id: 2,
        };

        let ts = clock.receive(&remote);
        assert!(ts > remote);
        assert_eq!(ts.physical, 9_000);
        assert_eq!(ts.logical, 4);

        // Later local events keep sorting after the remote write.
        assert!(clock.now() > remote);
    }

    #[test]
    fn receive_with_equal_physical_time_takes_max_logical() {
        let mut clock = HybridClock::with_time_source(1, frozen);
        clock.now();

        let remote = HybridTimestamp {
            physical: 5_000,
            logical: 5,
            node_id: 2,
        };
        let ts = clock.receive(&remote);
        assert_eq!(ts.logical, 6);
        assert_eq!(ts.node_id, 1);
    }

    #[test]
    fn exhausted_counter_carries_into_physical() {
        let mut clock = HybridClock::with_time_source(1, frozen);
        let mut prev = clock.now();
        for _ in 0..=u32::from(u16::MAX) {
            let next = clock.now();
            assert!(next > prev);
            prev = next;
        }
        assert_eq!(prev.physical, 5_001);
        assert_eq!(prev.logical, 0);

        // Back on the frozen wall clock, stamps keep rising.
        assert!(clock.now() > prev);
    }

    #[test]
    fn receive_carries_past_a_saturated_remote() {
        let mut clock = HybridClock::with_time_source(1, frozen);
        let remote = HybridTimestamp {
            physical: 5_000,
            logical: u16::MAX,
            node_id: 2,
        };
        let ts = clock.receive(&remote);
        assert!(ts > remote);
        assert_eq!((ts.physical, ts.logical), (5_001, 0));
    }

    #[test]
    fn node_id_breaks_ties() {
        let a = HybridTimestamp {
            physical: 1_000,
            logical: 0,
            node_id: 1,
        };
        let b = HybridTimestamp { node_id: 2, ..a };
        let c = HybridTimestamp { logical: 1, ..a };

        assert!(a < b);
        assert!(b < c);
        assert!(HybridTimestamp::ZERO < a);
    }
}
