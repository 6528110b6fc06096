// src/command/mod.rs

//! Command schema and the channel boundary.
//!
//! - [`payload`] defines the typed commands, the metadata envelope stamped
//!   with the issuing task id, and the completion/failure report.
//! - [`channel`] provides the `CommandChannel` trait the driver sends
//!   through.

pub mod channel;
pub mod payload;

pub use channel::CommandChannel;
pub use payload::{
    command_id_for, CommandEnvelope, CommandKind, CommandMeta, CommandReport, CommandType,
};
