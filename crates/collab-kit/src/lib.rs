//! # collab-kit
//!
//! Replicated building blocks for shared documents.
//!
//! Every participant of a shared document holds its own replica. Replicas are
//! updated independently and exchange state; merging is commutative,
//! associative and idempotent, so all participants converge once they have
//! seen the same writes.
//!
//! ## Quick Start
//!
//! ```
//! use collab_kit::prelude::*;
//!
//! let mut clock_a = HybridClock::with_time_source(1, || 1_000);
//! let mut clock_b = HybridClock::with_time_source(2, || 1_000);
//!
//! let mut a = LwwRegister::new(1_i64, clock_a.now());
//! let mut b = a.clone();
//! b.set(6, clock_b.now());
//!
//! a.merge(&b);
//! assert_eq!(*a.value(), 6);
//! ```
//!
//! ## Contents
//!
//! - [`HybridClock`](clock::HybridClock) - monotonic timestamps for ordering writes
//! - [`LwwRegister`] - last-writer-wins scalar
//! - [`TextCrdt`] - collaboratively editable character sequence, edited
//!   locally and shipped as [`TextPatch`]es
//! - [`Listeners`](events::Listeners) - typed change-notification registry

#![warn(missing_docs)]

mod crdt;
mod register;
mod text;

pub mod clock;
pub mod events;
pub mod prelude;

pub use crdt::Crdt;
pub use register::LwwRegister;
pub use text::{TextCrdt, TextError, TextPatch};
