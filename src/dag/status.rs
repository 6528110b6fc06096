// src/dag/status.rs

//! Read-only status snapshot of a task graph.

use std::fmt;

use crate::types::TaskId;

/// Snapshot of the three resolution sets, each sorted by task id.
///
/// Blocked tasks (registered but still waiting on prerequisites) appear in
/// none of the lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStatus {
    pub pending: Vec<TaskId>,
    pub completed: Vec<TaskId>,
    pub failed: Vec<TaskId>,
}

impl GraphStatus {
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.completed.is_empty() && self.failed.is_empty()
    }
}

impl fmt::Display for GraphStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pending={:?} completed={:?} failed={:?}",
            self.pending, self.completed, self.failed
        )
    }
}
