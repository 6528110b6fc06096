use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Canonical task identifier type; unique within one task graph.
pub type TaskId = String;

/// Canonical identifier for a target actor (rover, scout, truck...).
pub type TargetId = String;

/// What the mission does with a task graph when one of its tasks fails.
///
/// - `LeaveBlocked`: mark the task failed and nothing else. Dependents stay
///   blocked until the mission script rebuilds the plan (default).
/// - `Cascade`: also mark every unresolved transitive dependent as failed.
/// - `ClearPlan`: discard the whole graph for that target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    LeaveBlocked,
    Cascade,
    ClearPlan,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::LeaveBlocked
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "leave_blocked" => Ok(FailurePolicy::LeaveBlocked),
            "cascade" => Ok(FailurePolicy::Cascade),
            "clear_plan" => Ok(FailurePolicy::ClearPlan),
            other => Err(format!(
                "invalid failure_policy: {other} (expected \"leave_blocked\", \"cascade\" or \"clear_plan\")"
            )),
        }
    }
}

/// How a task graph treats a second resolution of an already resolved task.
///
/// A duplicate or late callback can report the same task twice. Neither mode
/// re-runs dependent unlocking; they only differ in whether the caller hears
/// about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Second resolution is a logged no-op.
    Idempotent,
    /// Second resolution returns `MissionError::AlreadyResolved`.
    Strict,
}

impl Default for ResolutionMode {
    fn default() -> Self {
        ResolutionMode::Idempotent
    }
}

impl FromStr for ResolutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "idempotent" => Ok(ResolutionMode::Idempotent),
            "strict" => Ok(ResolutionMode::Strict),
            other => Err(format!(
                "invalid resolution_mode: {other} (expected \"idempotent\" or \"strict\")"
            )),
        }
    }
}

/// How a dispatched command ended, as reported by the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Completed,
    Failed,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Completed => write!(f, "completed"),
            Resolution::Failed => write!(f, "failed"),
        }
    }
}
