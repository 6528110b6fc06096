// src/dag/graph.rs

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use tracing::{debug, warn};

use crate::dag::propagation::{self, DependentsIndex};
use crate::dag::status::GraphStatus;
use crate::dag::task::{Task, TaskOutcome};
use crate::errors::{MissionError, Result};
use crate::types::{ResolutionMode, TaskId};

/// Dependency-ordered set of tasks for one target actor.
///
/// It is responsible for:
/// - remembering every registered task and its remaining prerequisites
/// - deciding when a task becomes eligible (`pending`)
/// - applying completion/failure and unlocking direct dependents
///
/// A registered task is in exactly one of `pending`, `completed`, `failed`,
/// or in none of them while it still waits on prerequisites ("blocked").
/// Failure does not cascade unless [`TaskGraph::cascade_failure`] is called.
#[derive(Debug, Default)]
pub struct TaskGraph {
    mode: ResolutionMode,
    tasks: HashMap<TaskId, Task>,
    /// Remaining unsatisfied prerequisites per unresolved task.
    dependencies: HashMap<TaskId, BTreeSet<TaskId>>,
    /// Reverse index: prerequisite -> tasks waiting on it.
    dependents: DependentsIndex,
    pending: BTreeSet<TaskId>,
    completed: BTreeSet<TaskId>,
    failed: BTreeSet<TaskId>,
    /// Bumped by every `clear_all`.
    generation: u64,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: ResolutionMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    /// Plan generation stamped on every command this graph dispatches.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Register `task`, waiting on every id in `depends_on`.
    ///
    /// - With no (remaining) prerequisites the task enters `pending` at once.
    ///   A prerequisite that is already completed counts as satisfied.
    /// - Prerequisites may name tasks that are not registered yet.
    /// - Rejects duplicate ids and edges that would close a cycle; in both
    ///   cases the graph is left untouched.
    pub fn add_task(&mut self, task: Task, depends_on: &[&str]) -> Result<()> {
        let id = task.id().to_string();

        if self.tasks.contains_key(&id) {
            warn!(task = %id, "add_task: task id already registered");
            return Err(MissionError::DuplicateTaskId(id));
        }

        let deps: BTreeSet<TaskId> = depends_on.iter().map(|d| d.to_string()).collect();

        for dep in deps.iter() {
            if *dep == id || propagation::path_exists(&self.dependents, &id, dep) {
                warn!(task = %id, dependency = %dep, "add_task: dependency would close a cycle");
                return Err(MissionError::DependencyCycle {
                    task: id,
                    dependency: dep.clone(),
                });
            }
        }

        let remaining: BTreeSet<TaskId> = deps
            .iter()
            .filter(|dep| !self.completed.contains(*dep))
            .cloned()
            .collect();

        for dep in deps.iter() {
            self.dependents
                .entry(dep.clone())
                .or_default()
                .insert(id.clone());
        }

        if remaining.is_empty() {
            debug!(task = %id, "task registered with no open prerequisites; pending");
            self.pending.insert(id.clone());
        } else {
            debug!(task = %id, waiting_on = ?remaining, "task registered; blocked on prerequisites");
        }

        self.dependencies.insert(id.clone(), remaining);
        self.tasks.insert(id, task);
        Ok(())
    }

    pub fn get_task(&self, task_id: &str) -> Result<&Task> {
        self.tasks
            .get(task_id)
            .ok_or_else(|| MissionError::UnknownTaskId(task_id.to_string()))
    }

    pub fn get_task_mut(&mut self, task_id: &str) -> Result<&mut Task> {
        self.tasks
            .get_mut(task_id)
            .ok_or_else(|| MissionError::UnknownTaskId(task_id.to_string()))
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.tasks.contains_key(task_id)
    }

    /// Mark a task completed and unlock its direct dependents.
    ///
    /// Returns the ids that entered `pending` because of this call.
    pub fn mark_completed(&mut self, task_id: &str) -> Result<Vec<TaskId>> {
        if !self.begin_resolution(task_id, TaskOutcome::Completed)? {
            return Ok(Vec::new());
        }

        self.pending.remove(task_id);
        self.completed.insert(task_id.to_string());
        self.dependencies.remove(task_id);

        let mut unlocked = Vec::new();
        let waiting: Vec<TaskId> = self
            .dependents
            .get(task_id)
            .map(|d| d.iter().cloned().collect())
            .unwrap_or_default();

        for dependent in waiting {
            let Some(remaining) = self.dependencies.get_mut(&dependent) else {
                // Already resolved; nothing to unlock.
                continue;
            };
            remaining.remove(task_id);

            let unresolved = self
                .tasks
                .get(&dependent)
                .is_some_and(|t| !t.outcome().is_resolved());

            if remaining.is_empty() && unresolved && self.pending.insert(dependent.clone()) {
                debug!(task = %dependent, unlocked_by = %task_id, "prerequisites satisfied; pending");
                unlocked.push(dependent);
            }
        }

        debug!(task = %task_id, unlocked = unlocked.len(), "task completed");
        Ok(unlocked)
    }

    /// Mark a task failed. Dependents stay blocked.
    ///
    /// Returns `false` when the task was already resolved (idempotent mode).
    pub fn mark_failed(&mut self, task_id: &str) -> Result<bool> {
        if !self.begin_resolution(task_id, TaskOutcome::Failed)? {
            return Ok(false);
        }

        self.pending.remove(task_id);
        self.failed.insert(task_id.to_string());
        self.dependencies.remove(task_id);

        debug!(task = %task_id, "task failed; dependents left blocked");
        Ok(true)
    }

    /// Mark every unresolved transitive dependent of `task_id` as failed.
    ///
    /// Returns the ids that were newly failed, in discovery order.
    pub fn cascade_failure(&mut self, task_id: &str) -> Vec<TaskId> {
        let mut newly_failed = Vec::new();

        for name in propagation::transitive_dependents(&self.dependents, task_id) {
            let Some(task) = self.tasks.get_mut(&name) else {
                continue;
            };
            if task.outcome().is_resolved() {
                continue;
            }
            task.set_outcome(TaskOutcome::Failed);
            self.pending.remove(&name);
            self.dependencies.remove(&name);
            self.failed.insert(name.clone());
            debug!(task = %name, upstream = %task_id, "failing dependent due to upstream failure");
            newly_failed.push(name);
        }

        newly_failed
    }

    /// Forget every task and index, and start a new generation.
    ///
    /// Commands already in flight are not cancelled. Their callbacks later
    /// hit `UnknownTaskId`, or a generation mismatch if the ids were reused.
    pub fn clear_all(&mut self) {
        self.generation += 1;
        debug!(tasks = self.tasks.len(), generation = self.generation, "clearing task graph");
        self.tasks.clear();
        self.dependencies.clear();
        self.dependents.clear();
        self.pending.clear();
        self.completed.clear();
        self.failed.clear();
    }

    pub fn get_status(&self) -> GraphStatus {
        GraphStatus {
            pending: self.pending.iter().cloned().collect(),
            completed: self.completed.iter().cloned().collect(),
            failed: self.failed.iter().cloned().collect(),
        }
    }

    pub fn pending_tasks(&self) -> &BTreeSet<TaskId> {
        &self.pending
    }

    pub fn completed_tasks(&self) -> &BTreeSet<TaskId> {
        &self.completed
    }

    pub fn failed_tasks(&self) -> &BTreeSet<TaskId> {
        &self.failed
    }

    /// Registered, unresolved tasks still waiting on prerequisites.
    pub fn blocked_tasks(&self) -> Vec<TaskId> {
        let mut blocked: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|t| !t.outcome().is_resolved() && !self.pending.contains(t.id()))
            .map(|t| t.id().to_string())
            .collect();
        blocked.sort();
        blocked
    }

    /// Nothing can make progress, yet some tasks are still blocked.
    ///
    /// Happens when a prerequisite failed (and failures do not cascade) or
    /// was never registered.
    pub fn is_stalled(&self) -> bool {
        self.pending.is_empty() && !self.blocked_tasks().is_empty()
    }

    /// No task is pending (eligible or in flight).
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Validate a resolution request and record the outcome on the task.
    ///
    /// Returns `Ok(false)` when the task is already resolved and the graph
    /// runs in idempotent mode.
    fn begin_resolution(&mut self, task_id: &str, outcome: TaskOutcome) -> Result<bool> {
        let mode = self.mode;
        let task = self.get_task_mut(task_id)?;

        if task.outcome().is_resolved() {
            return match mode {
                ResolutionMode::Idempotent => {
                    debug!(
                        task = %task_id,
                        previous = ?task.outcome(),
                        requested = ?outcome,
                        "task already resolved; ignoring"
                    );
                    Ok(false)
                }
                ResolutionMode::Strict => Err(MissionError::AlreadyResolved(task_id.to_string())),
            };
        }

        task.set_outcome(outcome);
        Ok(true)
    }
}

impl fmt::Display for TaskGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<TaskGraph | Pending: {}, Completed: {}, Failed: {}>",
            self.pending.len(),
            self.completed.len(),
            self.failed.len()
        )
    }
}
