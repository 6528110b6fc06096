// src/dag/mod.rs

//! Task graph representation.
//!
//! - [`task`] holds a single task: a remote command or a timer, plus its
//!   lifecycle flags.
//! - [`graph`] contains the dependency bookkeeping that decides which tasks
//!   are eligible and unlocks dependents when a task completes.
//! - [`status`] defines the read-only status snapshot.
//! - [`propagation`] has the reverse-index traversals (cycle check, cascade).

pub mod graph;
pub mod propagation;
pub mod status;
pub mod task;

pub use graph::TaskGraph;
pub use status::GraphStatus;
pub use task::{Task, TaskKind, TaskOutcome};
