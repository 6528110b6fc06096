// src/engine/mission.rs

//! Pure mission core.
//!
//! A [`Mission`] owns one [`TaskGraph`] per target actor plus the recovery
//! policy applied when a task fails. It performs no IO and owns no tokio
//! types: the async shell in [`crate::engine::runtime`] feeds it events and
//! ticks, and tests can drive it directly with a fake channel and a manual
//! clock.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::command::{CommandChannel, CommandEnvelope, CommandReport};
use crate::config::PlanFile;
use crate::dag::{GraphStatus, TaskGraph};
use crate::engine::clock::Clock;
use crate::engine::driver::{GraphDriver, TickReport};
use crate::engine::recovery::{FailureContext, RecoveryPolicy};
use crate::engine::MissionEvent;
use crate::errors::{MissionError, Result};
use crate::types::{FailurePolicy, Resolution, ResolutionMode, TargetId, TaskId};

pub struct Mission {
    mode: ResolutionMode,
    graphs: BTreeMap<TargetId, TaskGraph>,
    recovery: Box<dyn RecoveryPolicy>,
    /// Targets already reported as stalled, so the warning fires once.
    stalled: BTreeSet<TargetId>,
}

impl std::fmt::Debug for Mission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mission")
            .field("mode", &self.mode)
            .field("graphs", &self.graphs)
            .finish_non_exhaustive()
    }
}

impl Default for Mission {
    fn default() -> Self {
        Self::new(ResolutionMode::default(), FailurePolicy::default())
    }
}

impl Mission {
    pub fn new(mode: ResolutionMode, recovery: impl RecoveryPolicy + 'static) -> Self {
        Self {
            mode,
            graphs: BTreeMap::new(),
            recovery: Box::new(recovery),
            stalled: BTreeSet::new(),
        }
    }

    /// Build every target's graph from a validated plan.
    pub fn from_plan(plan: &PlanFile) -> Result<Self> {
        let mut mission = Self::new(plan.config.resolution_mode, plan.config.failure_policy);

        for (target, target_cfg) in &plan.target {
            let graph = mission.add_target(target.clone());
            for (task_id, task_cfg) in &target_cfg.task {
                let task = task_cfg.to_task(task_id, target)?;
                let after: Vec<&str> = task_cfg.after.iter().map(String::as_str).collect();
                graph.add_task(task, &after)?;
            }
            debug!(target_id = %target, tasks = graph.len(), "built task graph from plan");
        }

        Ok(mission)
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    /// Replace the recovery policy.
    pub fn set_recovery(&mut self, recovery: impl RecoveryPolicy + 'static) {
        self.recovery = Box::new(recovery);
    }

    /// Graph for `target`, created empty if it does not exist yet.
    pub fn add_target(&mut self, target: impl Into<TargetId>) -> &mut TaskGraph {
        let mode = self.mode;
        self.graphs
            .entry(target.into())
            .or_insert_with(|| TaskGraph::with_mode(mode))
    }

    pub fn graph(&self, target: &str) -> Option<&TaskGraph> {
        self.graphs.get(target)
    }

    pub fn graph_mut(&mut self, target: &str) -> Option<&mut TaskGraph> {
        self.graphs.get_mut(target)
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.graphs.keys().map(String::as_str)
    }

    /// Run one tick over every graph, in target order.
    pub fn tick(
        &mut self,
        channel: &mut dyn CommandChannel,
        clock: &dyn Clock,
    ) -> BTreeMap<TargetId, TickReport> {
        let mut reports = BTreeMap::new();

        for (target, graph) in self.graphs.iter_mut() {
            let report = GraphDriver::new(target.clone()).tick(graph, channel, clock);

            if graph.is_stalled() {
                if self.stalled.insert(target.clone()) {
                    warn!(
                        target_id = %target,
                        blocked = ?graph.blocked_tasks(),
                        failed = ?graph.failed_tasks(),
                        "task graph stalled: blocked tasks can no longer become eligible"
                    );
                }
            } else {
                self.stalled.remove(target);
            }

            reports.insert(target.clone(), report);
        }

        reports
    }

    /// Apply one event. Returns `false` when the mission should stop.
    pub fn handle_event(&mut self, event: MissionEvent) -> bool {
        match event {
            MissionEvent::CommandResolved {
                target,
                resolution,
                payload,
            } => {
                self.handle_resolution(&target, resolution, &payload);
                true
            }
            MissionEvent::ShutdownRequested => {
                info!("shutdown requested");
                false
            }
        }
    }

    /// Route a completion/failure report to the owning graph.
    ///
    /// Bad payloads, missing correlation ids, unknown targets, unknown task
    /// ids (e.g. a late callback after `clear_all`) and reports that do not
    /// match what the task dispatched are logged and discarded. Returns the
    /// resolved task id on success.
    pub fn handle_resolution(
        &mut self,
        target: &str,
        resolution: Resolution,
        payload: &str,
    ) -> Option<TaskId> {
        match self.apply_resolution(target, resolution, payload) {
            Ok(task_id) => Some(task_id),
            Err(e @ MissionError::UnknownTaskId(_)) => {
                warn!(target_id = %target, %resolution, error = %e, "ignoring report for unknown task");
                None
            }
            Err(e @ MissionError::MismatchedReport { .. }) => {
                warn!(target_id = %target, %resolution, error = %e, "ignoring stale or mismatched report");
                None
            }
            Err(e) => {
                warn!(target_id = %target, %resolution, error = %e, "discarding command report");
                None
            }
        }
    }

    fn apply_resolution(
        &mut self,
        target: &str,
        resolution: Resolution,
        payload: &str,
    ) -> Result<TaskId> {
        let report = CommandReport::decode(payload)?;
        let task_id = report
            .correlation_id()
            .ok_or(MissionError::MissingCorrelationId)?
            .to_string();

        let graph = self
            .graphs
            .get_mut(target)
            .ok_or_else(|| MissionError::UnknownTarget(target.to_string()))?;

        verify_report(graph, &task_id, &report.orig_cmd)?;

        match resolution {
            Resolution::Completed => {
                let unlocked = graph.mark_completed(&task_id)?;
                info!(
                    task = %task_id,
                    target_id = %target,
                    ?unlocked,
                    "task completed"
                );
            }
            Resolution::Failed => {
                if !graph.mark_failed(&task_id)? {
                    return Ok(task_id);
                }
                let reason = report.reason.as_deref();
                warn!(
                    task = %task_id,
                    target_id = %target,
                    reason = reason.unwrap_or("unspecified"),
                    "task failed"
                );
                let failure = FailureContext {
                    target,
                    task_id: &task_id,
                    reason,
                };
                self.recovery.on_task_failed(&failure, graph);
            }
        }

        Ok(task_id)
    }

    /// Every graph has nothing pending.
    pub fn is_idle(&self) -> bool {
        self.graphs.values().all(TaskGraph::is_idle)
    }

    pub fn status(&self) -> BTreeMap<TargetId, GraphStatus> {
        self.graphs
            .iter()
            .map(|(target, graph)| (target.clone(), graph.get_status()))
            .collect()
    }
}

/// Check that `orig_cmd` is the command this graph dispatched for `task_id`.
///
/// Already resolved tasks pass through, so duplicate reports still hit the
/// graph's resolution mode. A report without a generation is accepted from
/// targets that do not echo one.
fn verify_report(graph: &TaskGraph, task_id: &str, orig_cmd: &CommandEnvelope) -> Result<()> {
    let task = graph.get_task(task_id)?;
    if task.outcome().is_resolved() {
        return Ok(());
    }

    let mismatch = |detail: String| MissionError::MismatchedReport {
        task_id: task_id.to_string(),
        detail,
    };

    let Some(expected) = task.envelope() else {
        return Err(mismatch("task is a timer".to_string()));
    };
    if !task.is_started() {
        return Err(mismatch("task was never dispatched".to_string()));
    }
    if orig_cmd.meta.command_type != expected.meta.command_type
        || orig_cmd.meta.command_id != expected.meta.command_id
    {
        return Err(mismatch(format!(
            "report is for {}, task sent {}",
            orig_cmd.meta.command_id, expected.meta.command_id
        )));
    }
    match orig_cmd.meta.generation {
        Some(generation) if generation != graph.generation() => Err(mismatch(format!(
            "report is from plan generation {generation}, graph is at {}",
            graph.generation()
        ))),
        _ => Ok(()),
    }
}
