#![allow(dead_code)]

use std::collections::BTreeMap;

use missiongraph::command::{CommandKind, CommandType};
use missiongraph::config::{ConfigSection, PlanFile, RawPlanFile, TargetConfig, TaskConfig};
use missiongraph::types::{FailurePolicy, ResolutionMode};

/// Builder for `PlanFile` to simplify test setup.
pub struct PlanBuilder {
    plan: RawPlanFile,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self {
            plan: RawPlanFile {
                config: ConfigSection::default(),
                target: BTreeMap::new(),
            },
        }
    }

    pub fn loop_freq_hz(mut self, hz: f64) -> Self {
        self.plan.config.loop_freq_hz = hz;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.plan.config.failure_policy = policy;
        self
    }

    pub fn resolution_mode(mut self, mode: ResolutionMode) -> Self {
        self.plan.config.resolution_mode = mode;
        self
    }

    pub fn with_target(mut self, name: &str, target: TargetConfig) -> Self {
        self.plan.target.insert(name.to_string(), target);
        self
    }

    /// The plan without validation, for testing the validator itself.
    pub fn build_raw(self) -> RawPlanFile {
        self.plan
    }

    pub fn build(self) -> PlanFile {
        PlanFile::try_from(self.plan).expect("Failed to build valid plan from builder")
    }
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TargetConfig`.
pub struct TargetConfigBuilder {
    target: TargetConfig,
}

impl TargetConfigBuilder {
    pub fn new() -> Self {
        Self {
            target: TargetConfig::default(),
        }
    }

    pub fn reachable(mut self, val: bool) -> Self {
        self.target.reachable = val;
        self
    }

    pub fn latency(mut self, latency: &str) -> Self {
        self.target.latency = latency.to_string();
        self
    }

    pub fn fail(mut self, command_type: CommandType) -> Self {
        self.target.fail.push(command_type);
        self
    }

    pub fn task(mut self, id: &str, task: TaskConfig) -> Self {
        self.target.task.insert(id.to_string(), task);
        self
    }

    pub fn build(self) -> TargetConfig {
        self.target
    }
}

impl Default for TargetConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn command(command: CommandKind) -> Self {
        Self {
            task: TaskConfig {
                command: Some(command),
                ..TaskConfig::default()
            },
        }
    }

    pub fn timer(seconds: f64) -> Self {
        Self {
            task: TaskConfig {
                timer: Some(seconds),
                ..TaskConfig::default()
            },
        }
    }

    pub fn move_to(x: f64, y: f64) -> Self {
        Self::command(CommandKind::MoveToCoord { x, y })
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
