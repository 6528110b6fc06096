// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::command::{CommandKind, CommandType};
use crate::config::duration::parse_duration;
use crate::dag::Task;
use crate::errors::{MissionError, Result};
use crate::types::{FailurePolicy, ResolutionMode};

/// Mission plan as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// loop_freq_hz = 10.0
/// failure_policy = "leave_blocked"
///
/// [target.LTV1]
/// latency = "2s"
///
/// [target.LTV1.task.Move1]
/// command = { type = "MoveToCoord", x = 20.0, y = 0.0 }
///
/// [target.LTV1.task.Wait]
/// timer = 5.0
/// after = ["Move1"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawPlanFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All targets from `[target.<name>]`, keyed by target id.
    #[serde(default)]
    pub target: BTreeMap<String, TargetConfig>,
}

/// A plan that passed validation. Build one with `PlanFile::try_from`.
#[derive(Debug, Clone)]
pub struct PlanFile {
    pub config: ConfigSection,
    pub target: BTreeMap<String, TargetConfig>,
}

impl PlanFile {
    pub(crate) fn new_unchecked(config: ConfigSection, target: BTreeMap<String, TargetConfig>) -> Self {
        Self { config, target }
    }

    pub fn task_count(&self) -> usize {
        self.target.values().map(|t| t.task.len()).sum()
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Scheduler ticks per second.
    #[serde(default = "default_loop_freq_hz")]
    pub loop_freq_hz: f64,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(default)]
    pub resolution_mode: ResolutionMode,
}

fn default_loop_freq_hz() -> f64 {
    10.0
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            loop_freq_hz: default_loop_freq_hz(),
            failure_policy: FailurePolicy::default(),
            resolution_mode: ResolutionMode::default(),
        }
    }
}

/// `[target.<name>]` section: one actor and its task graph.
///
/// `reachable`, `latency` and `fail` only drive the built-in simulator.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Whether the target starts in comms.
    #[serde(default = "default_reachable")]
    pub reachable: bool,

    /// Time the simulated target takes to finish any command, e.g. `"2s"`.
    #[serde(default = "default_latency")]
    pub latency: String,

    /// Command types the simulated target reports as failed.
    #[serde(default)]
    pub fail: Vec<CommandType>,

    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

fn default_reachable() -> bool {
    true
}

fn default_latency() -> String {
    "1s".to_string()
}

impl TargetConfig {
    pub fn latency(&self) -> Result<Duration> {
        parse_duration(&self.latency).map_err(MissionError::ConfigError)
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            reachable: default_reachable(),
            latency: default_latency(),
            fail: Vec::new(),
            task: BTreeMap::new(),
        }
    }
}

/// `[target.<name>.task.<id>]` section.
///
/// Exactly one of `command` and `timer` must be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    #[serde(default)]
    pub command: Option<CommandKind>,

    /// Timer duration in seconds.
    #[serde(default)]
    pub timer: Option<f64>,

    /// Prerequisites within the same target.
    #[serde(default)]
    pub after: Vec<String>,
}

impl TaskConfig {
    pub fn to_task(&self, id: &str, target: &str) -> Result<Task> {
        match (&self.command, self.timer) {
            (Some(command), None) => Ok(Task::command(id, target, command.clone())),
            (None, Some(seconds)) => Task::timer(id, seconds),
            (Some(_), Some(_)) => Err(MissionError::ConfigError(format!(
                "task '{id}' on target '{target}' sets both `command` and `timer`"
            ))),
            (None, None) => Err(MissionError::ConfigError(format!(
                "task '{id}' on target '{target}' needs either `command` or `timer`"
            ))),
        }
    }
}
