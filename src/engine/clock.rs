// src/engine/clock.rs

//! Injectable time sources.
//!
//! - [`Clock`] answers "what time is it" for timer tasks.
//! - [`Ticker`] decides when the next scheduler tick happens.
//!
//! Production code uses [`SystemClock`] and [`IntervalTicker`], both backed
//! by tokio's timer so that tests can pause time. Tests that drive the core
//! by hand use [`ManualClock`].

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::errors::{MissionError, Result};

/// Monotonic time since the clock's origin.
pub trait Clock: Send {
    fn now(&self) -> Duration;
}

/// Clock backed by `tokio::time::Instant`; honours paused time in tests.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock. Clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Duration) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    /// Set the reading in seconds; invalid values are ignored.
    pub fn set_secs(&self, secs: f64) {
        if let Ok(now) = Duration::try_from_secs_f64(secs) {
            self.set(now);
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Source of scheduler ticks.
pub trait Ticker: Send {
    /// Resolve when the next tick is due.
    fn tick(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Fixed-rate ticker, the cooperative "sleep until next tick" of the loop.
#[derive(Debug)]
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Must be called from within a tokio runtime.
    pub fn new(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    /// Ticker running at `hz` ticks per second.
    pub fn from_hz(hz: f64) -> Result<Self> {
        if !(hz.is_finite() && hz > 0.0) {
            return Err(MissionError::ConfigError(format!(
                "loop frequency must be a positive number (got {hz})"
            )));
        }
        let period = Duration::try_from_secs_f64(1.0 / hz)
            .map_err(|e| MissionError::ConfigError(format!("invalid loop frequency {hz}: {e}")))?;
        Ok(Self::new(period))
    }
}

impl Ticker for IntervalTicker {
    fn tick(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.interval.tick().await;
        })
    }
}
