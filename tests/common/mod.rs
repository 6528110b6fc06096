#![allow(dead_code)]

pub use missiongraph_test_utils::builders;
pub use missiongraph_test_utils::init_tracing;

use missiongraph::command::CommandKind;
use missiongraph::dag::Task;

pub const ROVER: &str = "LTV1";

/// Drive command against [`ROVER`].
pub fn move_task(id: &str, x: f64) -> Task {
    Task::command(id, ROVER, CommandKind::MoveToCoord { x, y: 0.0 })
}

/// Command task of an arbitrary kind against [`ROVER`].
pub fn command_task(id: &str, command: CommandKind) -> Task {
    Task::command(id, ROVER, command)
}

pub fn timer_task(id: &str, seconds: f64) -> Task {
    Task::timer(id, seconds).expect("valid timer duration")
}
