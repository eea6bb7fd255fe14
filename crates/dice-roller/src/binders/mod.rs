//! Field binders: keep a shared object and a piece of UI in step.
//!
//! Each binding subscribes to its shared object when attached and keeps the
//! [`SubscriptionId`](collab_client::SubscriptionId) so it can be detached
//! again.

mod dice;
mod rotation;
mod text;

pub use dice::{DiceBinding, DiceFace};
pub use rotation::{Rotation, RotationField, RotationMirror, RotationSink};
pub use text::TextBinding;
