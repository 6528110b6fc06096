// src/command/payload.rs

//! Typed command schema and the metadata envelope that travels with it.
//!
//! Everything inside the crate works on [`CommandKind`] / [`CommandEnvelope`];
//! JSON only appears at the channel boundary via `encode` / `decode`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Result;
use crate::types::TaskId;

/// Command-type tag. At most one command per tag may be outstanding against
/// a single target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CommandType {
    MoveToCoord,
    RotateToAzimuth,
    CameraPan,
    CaptureImage,
    Stop,
    PickUpAntenna,
    PlaceDownAntenna,
}

impl CommandType {
    pub const ALL: [CommandType; 7] = [
        CommandType::MoveToCoord,
        CommandType::RotateToAzimuth,
        CommandType::CameraPan,
        CommandType::CaptureImage,
        CommandType::Stop,
        CommandType::PickUpAntenna,
        CommandType::PlaceDownAntenna,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::MoveToCoord => "MoveToCoord",
            CommandType::RotateToAzimuth => "RotateToAzimuth",
            CommandType::CameraPan => "CameraPan",
            CommandType::CaptureImage => "CaptureImage",
            CommandType::Stop => "Stop",
            CommandType::PickUpAntenna => "PickUpAntenna",
            CommandType::PlaceDownAntenna => "PlaceDownAntenna",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        CommandType::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str() == s.trim())
            .ok_or_else(|| format!("unknown command type '{s}'"))
    }
}

/// Command body, one variant per command type.
///
/// In a plan file this is written inline, e.g.
/// `command = { type = "MoveToCoord", x = 20.0, y = 0.0 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CommandKind {
    /// Drive to a point in the local north/west frame (metres).
    MoveToCoord { x: f64, y: f64 },
    /// Turn in place to an azimuth in degrees.
    RotateToAzimuth { azimuth: f64 },
    CameraPan { azimuth: f64, elevation: f64 },
    CaptureImage { exposure: f64 },
    Stop,
    PickUpAntenna,
    PlaceDownAntenna,
}

impl CommandKind {
    pub fn command_type(&self) -> CommandType {
        match self {
            CommandKind::MoveToCoord { .. } => CommandType::MoveToCoord,
            CommandKind::RotateToAzimuth { .. } => CommandType::RotateToAzimuth,
            CommandKind::CameraPan { .. } => CommandType::CameraPan,
            CommandKind::CaptureImage { .. } => CommandType::CaptureImage,
            CommandKind::Stop => CommandType::Stop,
            CommandKind::PickUpAntenna => CommandType::PickUpAntenna,
            CommandKind::PlaceDownAntenna => CommandType::PlaceDownAntenna,
        }
    }
}

/// Metadata common to every command and report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMeta {
    /// Event key for this (target, command type) pair.
    pub command_id: String,
    pub command_type: CommandType,
    /// Correlation id: the task that issued the command, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    /// Generation of the task graph that issued the command. Bumped by
    /// `clear_all`, so reports for a discarded plan can be told apart from
    /// a rebuilt plan reusing the same task ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
}

/// Build the event key used for a (target, command type) pair.
pub fn command_id_for(target: &str, command_type: CommandType) -> String {
    format!("MM_Cmd_{target}_{command_type}")
}

/// An outgoing command: metadata plus typed body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub meta: CommandMeta,
    pub command: CommandKind,
}

impl CommandEnvelope {
    /// Envelope for a command sent outside of any task graph.
    pub fn new(target: &str, command: CommandKind) -> Self {
        let command_type = command.command_type();
        Self {
            meta: CommandMeta {
                command_id: command_id_for(target, command_type),
                command_type,
                task_id: None,
                generation: None,
            },
            command,
        }
    }

    /// Stamp the correlation id.
    pub fn with_task_id(mut self, task_id: impl Into<TaskId>) -> Self {
        self.meta.task_id = Some(task_id.into());
        self
    }

    pub fn with_generation(mut self, generation: u64) -> Self {
        self.meta.generation = Some(generation);
        self
    }

    pub fn command_type(&self) -> CommandType {
        self.meta.command_type
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Completion or failure report sent back by a target.
///
/// The original envelope is echoed verbatim under `orig_cmd`, which is how
/// the mission correlates the report with a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandReport {
    pub meta: CommandMeta,
    pub orig_cmd: CommandEnvelope,
    /// Failure reason, e.g. "Hit Obstacle".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Free-form result data (image metadata, final position...).
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl CommandReport {
    pub fn for_command(orig_cmd: CommandEnvelope, reason: Option<String>, data: Value) -> Self {
        let meta = CommandMeta {
            command_id: orig_cmd.meta.command_id.clone(),
            command_type: orig_cmd.meta.command_type,
            task_id: None,
            generation: None,
        };
        Self {
            meta,
            orig_cmd,
            reason,
            data,
        }
    }

    /// Task id stamped on the original command.
    pub fn correlation_id(&self) -> Option<&str> {
        self.orig_cmd.meta.task_id.as_deref()
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
