// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::{TargetId, TaskId};

#[derive(Error, Debug)]
pub enum MissionError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Duplicate task id: {0}")]
    DuplicateTaskId(TaskId),

    #[error("Unknown task id: {0}")]
    UnknownTaskId(TaskId),

    #[error("Task already resolved: {0}")]
    AlreadyResolved(TaskId),

    #[error("Dependency cycle: task '{task}' cannot depend on '{dependency}'")]
    DependencyCycle { task: TaskId, dependency: TaskId },

    #[error("Cycle detected in plan: {0}")]
    DagCycle(String),

    #[error("No reaction registered on '{target}' for command type '{command_type}'")]
    NoReactionRegistered {
        target: TargetId,
        command_type: String,
    },

    #[error("Unknown target: {0}")]
    UnknownTarget(TargetId),

    #[error("Command report carries no task id")]
    MissingCorrelationId,

    #[error("Command report does not match task '{task_id}': {detail}")]
    MismatchedReport { task_id: TaskId, detail: String },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON codec error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, MissionError>;
