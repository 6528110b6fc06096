// src/engine/mod.rs

//! Mission execution engine.
//!
//! This module ties together:
//! - the per-target graph driver that starts tasks and advances timers
//! - the pure mission core that routes command reports to graphs and
//!   applies the recovery policy
//! - the async runtime loop that reacts to ticks, command reports and
//!   shutdown signals
//!
//! The pure core lives in [`mission`]; the async/IO shell is implemented in
//! [`runtime`].

use crate::types::{Resolution, TargetId};

/// Runtime options used by the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Exit once no graph has pending tasks.
    pub exit_when_idle: bool,
    /// Exit after this many ticks.
    pub max_ticks: Option<u64>,
}

/// Events flowing into the runtime from command channels and signal handlers.
#[derive(Debug, Clone)]
pub enum MissionEvent {
    /// A target reported that a command completed or failed.
    ///
    /// `payload` is the JSON-encoded [`crate::command::CommandReport`].
    CommandResolved {
        target: TargetId,
        resolution: Resolution,
        payload: String,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod clock;
pub mod driver;
pub mod mission;
pub mod recovery;
pub mod runtime;

pub use clock::{Clock, IntervalTicker, ManualClock, SystemClock, Ticker};
pub use driver::{GraphDriver, TickReport};
pub use mission::Mission;
pub use recovery::{FailureContext, RecoveryPolicy};
pub use runtime::Runtime;
