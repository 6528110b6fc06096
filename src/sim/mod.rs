// src/sim/mod.rs

//! Simulated targets for running plans without real hardware.
//!
//! - [`behavior`] is the target side: reaction lookup and the
//!   one-active-command-per-type rule.
//! - [`channel`] is a `CommandChannel` that routes commands to those
//!   behaviors and posts their reports back to the runtime.

pub mod behavior;
pub mod channel;

pub use behavior::{Delivery, EntityBehavior, Reaction, ReactionOutcome, ReactionRegistry};
pub use channel::SimChannel;
