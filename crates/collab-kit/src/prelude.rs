//! Convenient re-exports for common usage.
//!
//! ```
//! use collab_kit::prelude::*;
//! ```

pub use crate::clock::{HybridClock, HybridTimestamp};
pub use crate::events::{Listeners, SubscriptionId};
pub use crate::Crdt;
pub use crate::LwwRegister;
pub use crate::{TextCrdt, TextPatch};
