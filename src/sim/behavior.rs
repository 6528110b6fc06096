// src/sim/behavior.rs

//! Target-side command handling.
//!
//! An [`EntityBehavior`] is what sits on the far end of the command channel
//! for one target: it accepts encoded commands, keeps at most one active
//! command per type, and later produces the encoded completion or failure
//! report for it.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::command::{CommandEnvelope, CommandReport, CommandType};
use crate::errors::{MissionError, Result};
use crate::types::TargetId;

/// How a target will eventually answer a command.
#[derive(Debug, Clone, PartialEq)]
pub enum ReactionOutcome {
    Complete { after: Duration, data: Value },
    Fail { after: Duration, reason: String },
}

impl ReactionOutcome {
    pub fn after(&self) -> Duration {
        match self {
            ReactionOutcome::Complete { after, .. } | ReactionOutcome::Fail { after, .. } => *after,
        }
    }
}

/// Per-command-type reaction of a target.
pub trait Reaction: Send + Sync {
    fn react(&self, envelope: &CommandEnvelope) -> ReactionOutcome;
}

impl<F> Reaction for F
where
    F: Fn(&CommandEnvelope) -> ReactionOutcome + Send + Sync,
{
    fn react(&self, envelope: &CommandEnvelope) -> ReactionOutcome {
        self(envelope)
    }
}

/// Reactions a target supports, keyed by command type.
#[derive(Default)]
pub struct ReactionRegistry {
    reactions: HashMap<CommandType, Box<dyn Reaction>>,
}

impl fmt::Debug for ReactionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.reactions.keys().collect();
        types.sort();
        f.debug_struct("ReactionRegistry").field("types", &types).finish()
    }
}

impl ReactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the reaction for `command_type`.
    pub fn register(&mut self, command_type: CommandType, reaction: impl Reaction + 'static) {
        self.reactions.insert(command_type, Box::new(reaction));
    }

    pub fn contains(&self, command_type: CommandType) -> bool {
        self.reactions.contains_key(&command_type)
    }

    pub fn lookup(&self, target: &str, command_type: CommandType) -> Result<&dyn Reaction> {
        self.reactions
            .get(&command_type)
            .map(|r| r.as_ref())
            .ok_or_else(|| MissionError::NoReactionRegistered {
                target: target.to_string(),
                command_type: command_type.to_string(),
            })
    }
}

/// Result of trying to send a report back to the mission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Encoded [`CommandReport`], ready to hand to the mission.
    Sent(String),
    /// Target is out of comms; the command stays active, retry later.
    NoComms,
    /// No active command of that type.
    NotActive,
}

#[derive(Debug)]
pub struct EntityBehavior {
    target: TargetId,
    reachable: bool,
    reactions: ReactionRegistry,
    active: HashMap<CommandType, CommandEnvelope>,
}

impl EntityBehavior {
    pub fn new(target: impl Into<TargetId>, reachable: bool) -> Self {
        Self {
            target: target.into(),
            reachable,
            reactions: ReactionRegistry::new(),
            active: HashMap::new(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn has_comms(&self) -> bool {
        self.reachable
    }

    pub fn set_comms(&mut self, reachable: bool) {
        if self.reachable != reachable {
            debug!(target_id = %self.target, reachable, "comms state changed");
        }
        self.reachable = reachable;
    }

    pub fn on_command(&mut self, command_type: CommandType, reaction: impl Reaction + 'static) {
        self.reactions.register(command_type, reaction);
    }

    pub fn reactions(&self) -> &ReactionRegistry {
        &self.reactions
    }

    pub fn is_active(&self, command_type: CommandType) -> bool {
        self.active.contains_key(&command_type)
    }

    pub fn active_commands(&self) -> impl Iterator<Item = &CommandEnvelope> {
        self.active.values()
    }

    /// Accept an encoded command.
    ///
    /// Returns `Ok(None)` when a command of the same type is already active;
    /// the new command is dropped. Fails with `NoReactionRegistered` when
    /// the target does not handle that command type.
    pub fn receive(&mut self, raw: &str) -> Result<Option<ReactionOutcome>> {
        let envelope = CommandEnvelope::decode(raw)?;
        let command_type = envelope.command_type();

        if self.active.contains_key(&command_type) {
            error!(
                target_id = %self.target,
                %command_type,
                "a command of this type is already active; ignoring new command"
            );
            return Ok(None);
        }

        let outcome = self.reactions.lookup(&self.target, command_type)?.react(&envelope);
        debug!(
            target_id = %self.target,
            %command_type,
            task = envelope.meta.task_id.as_deref().unwrap_or("-"),
            "command accepted"
        );
        self.active.insert(command_type, envelope);
        Ok(Some(outcome))
    }

    /// Report the active command of `command_type` as completed.
    pub fn complete_command(&mut self, command_type: CommandType, data: Value) -> Delivery {
        self.finish(command_type, None, data)
    }

    /// Report the active command of `command_type` as failed.
    pub fn fail_command(&mut self, command_type: CommandType, reason: impl Into<String>) -> Delivery {
        self.finish(command_type, Some(reason.into()), Value::Null)
    }

    fn finish(&mut self, command_type: CommandType, reason: Option<String>, data: Value) -> Delivery {
        if !self.active.contains_key(&command_type) {
            warn!(target_id = %self.target, %command_type, "no active command to report on");
            return Delivery::NotActive;
        }
        if !self.reachable {
            return Delivery::NoComms;
        }

        let Some(orig) = self.active.remove(&command_type) else {
            return Delivery::NotActive;
        };
        match CommandReport::for_command(orig, reason, data).encode() {
            Ok(payload) => Delivery::Sent(payload),
            Err(e) => {
                error!(target_id = %self.target, %command_type, error = %e, "failed to encode command report");
                Delivery::NotActive
            }
        }
    }
}
