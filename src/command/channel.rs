// src/command/channel.rs

//! Pluggable command channel abstraction.
//!
//! The graph driver talks to a `CommandChannel` instead of a concrete
//! transport. Production code plugs in whatever reaches the real targets;
//! the binary uses [`crate::sim::SimChannel`], and tests provide their own
//! implementation that records sends and scripts acceptance.
//!
//! Completion and failure do not come back through this trait. They arrive
//! later as [`crate::engine::MissionEvent::CommandResolved`] events.

use crate::command::CommandEnvelope;

/// Trait abstracting how commands reach their target.
pub trait CommandChannel: Send {
    /// Try to deliver `envelope` to `target`.
    ///
    /// Returns `false` with no side effect when the target is currently
    /// unreachable; the caller retries on a later tick. Returns `true` when
    /// the command was dispatched, exactly once.
    fn send(&mut self, target: &str, envelope: &CommandEnvelope) -> bool;
}

impl<C: CommandChannel + ?Sized> CommandChannel for Box<C> {
    fn send(&mut self, target: &str, envelope: &CommandEnvelope) -> bool {
        (**self).send(target, envelope)
    }
}
