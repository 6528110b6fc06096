// src/dag/task.rs

//! Task metadata and per-task lifecycle state.

use std::time::Duration;

use crate::command::{CommandEnvelope, CommandKind, CommandType};
use crate::errors::{MissionError, Result};
use crate::types::{TargetId, TaskId};

/// Tri-state outcome of a task within one graph cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Pending,
    Completed,
    Failed,
}

impl TaskOutcome {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, TaskOutcome::Pending)
    }
}

/// What a task does once it becomes eligible.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskKind {
    /// Remote command against one target; resolved by callback.
    Command {
        target: TargetId,
        command: CommandKind,
    },
    /// Pure delay; resolved by the driver once `duration` has elapsed.
    Timer {
        duration: Duration,
        /// Clock reading when the timer was started. Set exactly once.
        started_at: Option<Duration>,
    },
}

/// A unit of work owned by a single [`crate::dag::TaskGraph`].
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    id: TaskId,
    kind: TaskKind,
    started: bool,
    outcome: TaskOutcome,
}

impl Task {
    pub fn command(id: impl Into<TaskId>, target: impl Into<TargetId>, command: CommandKind) -> Self {
        Self {
            id: id.into(),
            kind: TaskKind::Command {
                target: target.into(),
                command,
            },
            started: false,
            outcome: TaskOutcome::Pending,
        }
    }

    /// Timer task lasting `seconds`, which must be finite and non-negative.
    pub fn timer(id: impl Into<TaskId>, seconds: f64) -> Result<Self> {
        let id = id.into();
        let duration = Duration::try_from_secs_f64(seconds).map_err(|e| {
            MissionError::ConfigError(format!(
                "timer task '{id}' has invalid duration {seconds}: {e}"
            ))
        })?;

        Ok(Self {
            id,
            kind: TaskKind::Timer {
                duration,
                started_at: None,
            },
            started: false,
            outcome: TaskOutcome::Pending,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn outcome(&self) -> TaskOutcome {
        self.outcome
    }

    pub fn is_timer(&self) -> bool {
        matches!(self.kind, TaskKind::Timer { .. })
    }

    /// Target of a command task; `None` for timers.
    pub fn target(&self) -> Option<&str> {
        match &self.kind {
            TaskKind::Command { target, .. } => Some(target),
            TaskKind::Timer { .. } => None,
        }
    }

    pub fn command_type(&self) -> Option<CommandType> {
        match &self.kind {
            TaskKind::Command { command, .. } => Some(command.command_type()),
            TaskKind::Timer { .. } => None,
        }
    }

    /// Outgoing envelope stamped with this task's id as correlation id.
    pub fn envelope(&self) -> Option<CommandEnvelope> {
        match &self.kind {
            TaskKind::Command { target, command } => {
                Some(CommandEnvelope::new(target, command.clone()).with_task_id(self.id.clone()))
            }
            TaskKind::Timer { .. } => None,
        }
    }

    /// Record that a command task was accepted by the channel.
    pub fn mark_started(&mut self) {
        self.started = true;
    }

    /// Start a timer task's clock. Later calls keep the first reading.
    pub fn start_timer(&mut self, now: Duration) {
        if let TaskKind::Timer { started_at, .. } = &mut self.kind {
            if started_at.is_none() {
                *started_at = Some(now);
            }
        }
        self.started = true;
    }

    /// Whether a started timer has run for at least its duration at `now`.
    pub fn timer_expired(&self, now: Duration) -> bool {
        match &self.kind {
            TaskKind::Timer {
                duration,
                started_at: Some(start),
            } => now.saturating_sub(*start) >= *duration,
            _ => false,
        }
    }

    pub(crate) fn set_outcome(&mut self, outcome: TaskOutcome) {
        self.outcome = outcome;
    }
}
