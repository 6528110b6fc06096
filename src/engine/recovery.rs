// src/engine/recovery.rs

//! What happens to a target's plan after one of its tasks fails.

use tracing::{info, warn};

use crate::dag::TaskGraph;
use crate::types::FailurePolicy;

/// Details of a failed task handed to a [`RecoveryPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct FailureContext<'a> {
    pub target: &'a str,
    pub task_id: &'a str,
    /// Reason reported by the target, e.g. "Hit Obstacle".
    pub reason: Option<&'a str>,
}

/// Hook invoked after a task has been marked failed.
///
/// Implementations may rewrite the graph: clear it, cascade the failure,
/// or add a fresh recovery plan.
pub trait RecoveryPolicy: Send {
    fn on_task_failed(&mut self, failure: &FailureContext<'_>, graph: &mut TaskGraph);
}

impl RecoveryPolicy for FailurePolicy {
    fn on_task_failed(&mut self, failure: &FailureContext<'_>, graph: &mut TaskGraph) {
        match self {
            FailurePolicy::LeaveBlocked => {
                let blocked = graph.blocked_tasks();
                if !blocked.is_empty() {
                    info!(
                        target_id = %failure.target,
                        task = %failure.task_id,
                        ?blocked,
                        "dependents of failed task stay blocked"
                    );
                }
            }
            FailurePolicy::Cascade => {
                let failed = graph.cascade_failure(failure.task_id);
                if !failed.is_empty() {
                    warn!(
                        target_id = %failure.target,
                        task = %failure.task_id,
                        ?failed,
                        "failure cascaded to dependents"
                    );
                }
            }
            FailurePolicy::ClearPlan => {
                warn!(
                    target_id = %failure.target,
                    task = %failure.task_id,
                    "clearing plan after task failure"
                );
                graph.clear_all();
            }
        }
    }
}

impl<F> RecoveryPolicy for F
where
    F: FnMut(&FailureContext<'_>, &mut TaskGraph) + Send,
{
    fn on_task_failed(&mut self, failure: &FailureContext<'_>, graph: &mut TaskGraph) {
        self(failure, graph)
    }
}
