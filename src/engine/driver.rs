// src/engine/driver.rs

//! Per-target tick routine: start eligible tasks and advance timers.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::command::{CommandChannel, CommandEnvelope, CommandType};
use crate::dag::{TaskGraph, TaskKind};
use crate::engine::clock::Clock;
use crate::types::{TargetId, TaskId};

/// What one tick did to one graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Command tasks accepted by the channel this tick.
    pub dispatched: Vec<TaskId>,
    /// Command tasks whose target was unreachable; retried next tick.
    pub rejected: Vec<TaskId>,
    /// Command tasks held back because a command of the same type is
    /// already in flight against the same target.
    pub deferred: Vec<TaskId>,
    pub timers_started: Vec<TaskId>,
    pub timers_completed: Vec<TaskId>,
    /// Tasks that entered `pending` because a timer completed this tick.
    /// They start on the next tick at the earliest.
    pub unlocked: Vec<TaskId>,
}

impl TickReport {
    pub fn is_quiet(&self) -> bool {
        self.dispatched.is_empty()
            && self.rejected.is_empty()
            && self.deferred.is_empty()
            && self.timers_started.is_empty()
            && self.timers_completed.is_empty()
    }
}

/// Decision for one pending task, taken from a shared borrow of the graph.
enum Step {
    Dispatch {
        target: TargetId,
        command_type: CommandType,
        envelope: CommandEnvelope,
    },
    Defer,
    StartTimer,
    CompleteTimer,
    Wait,
}

/// Drives one task graph bound to one target actor.
#[derive(Debug, Clone)]
pub struct GraphDriver {
    target: TargetId,
}

impl GraphDriver {
    pub fn new(target: impl Into<TargetId>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Run one tick over `graph`.
    ///
    /// Only tasks that were pending when the tick began are visited, each at
    /// most once, in task-id order.
    pub fn tick(
        &self,
        graph: &mut TaskGraph,
        channel: &mut dyn CommandChannel,
        clock: &dyn Clock,
    ) -> TickReport {
        let now = clock.now();
        let snapshot: Vec<TaskId> = graph.pending_tasks().iter().cloned().collect();
        let mut in_flight = in_flight_commands(graph, &snapshot);
        let mut report = TickReport::default();

        for task_id in snapshot {
            if !graph.pending_tasks().contains(&task_id) {
                continue;
            }

            match self.plan_step(graph, &task_id, now, &in_flight) {
                Step::Dispatch {
                    target,
                    command_type,
                    envelope,
                } => {
                    if channel.send(&target, &envelope) {
                        if let Ok(task) = graph.get_task_mut(&task_id) {
                            task.mark_started();
                        }
                        info!(
                            task = %task_id,
                            target_id = %target,
                            command_type = %command_type,
                            "task started"
                        );
                        in_flight.insert((target, command_type));
                        report.dispatched.push(task_id);
                    } else {
                        debug!(
                            task = %task_id,
                            target_id = %target,
                            "target unreachable; retrying next tick"
                        );
                        report.rejected.push(task_id);
                    }
                }
                Step::StartTimer => {
                    if let Ok(task) = graph.get_task_mut(&task_id) {
                        task.start_timer(now);
                    }
                    info!(task = %task_id, target_id = %self.target, "timer started");
                    report.timers_started.push(task_id);
                }
                Step::CompleteTimer => match graph.mark_completed(&task_id) {
                    Ok(unlocked) => {
                        info!(task = %task_id, target_id = %self.target, "timer elapsed; task completed");
                        report.unlocked.extend(unlocked);
                        report.timers_completed.push(task_id);
                    }
                    Err(e) => {
                        warn!(task = %task_id, target_id = %self.target, error = %e, "could not complete timer task");
                    }
                },
                Step::Defer => report.deferred.push(task_id),
                Step::Wait => {}
            }
        }

        report
    }

    fn plan_step(
        &self,
        graph: &TaskGraph,
        task_id: &str,
        now: Duration,
        in_flight: &HashSet<(TargetId, CommandType)>,
    ) -> Step {
        let task = match graph.get_task(task_id) {
            Ok(task) => task,
            Err(e) => {
                warn!(task = %task_id, target_id = %self.target, error = %e, "pending task missing from registry");
                return Step::Wait;
            }
        };

        match (task.kind(), task.is_started()) {
            (TaskKind::Command { target, command }, false) => {
                let command_type = command.command_type();
                if in_flight.contains(&(target.clone(), command_type)) {
                    debug!(
                        task = %task_id,
                        target_id = %target,
                        command_type = %command_type,
                        "same command type already in flight; deferring"
                    );
                    return Step::Defer;
                }
                match task.envelope() {
                    Some(envelope) => Step::Dispatch {
                        target: target.clone(),
                        command_type,
                        envelope: envelope.with_generation(graph.generation()),
                    },
                    None => Step::Wait,
                }
            }
            (TaskKind::Command { .. }, true) => Step::Wait,
            (TaskKind::Timer { .. }, false) => Step::StartTimer,
            (TaskKind::Timer { .. }, true) if task.timer_expired(now) => Step::CompleteTimer,
            (TaskKind::Timer { .. }, true) => Step::Wait,
        }
    }
}

/// (target, command type) pairs held by started, unresolved command tasks.
fn in_flight_commands(graph: &TaskGraph, pending: &[TaskId]) -> HashSet<(TargetId, CommandType)> {
    pending
        .iter()
        .filter_map(|id| graph.get_task(id).ok())
        .filter(|task| task.is_started())
        .filter_map(|task| match task.kind() {
            TaskKind::Command { target, command } => Some((target.clone(), command.command_type())),
            TaskKind::Timer { .. } => None,
        })
        .collect()
}
