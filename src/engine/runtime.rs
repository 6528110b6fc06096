// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::command::CommandChannel;
use crate::errors::Result;

use super::clock::{Clock, Ticker};
use super::mission::Mission;
use super::{MissionEvent, RuntimeOptions};

/// Drives the mission in response to ticks and `MissionEvent`s, and sends
/// commands through a `CommandChannel`.
///
/// This is a pure IO shell around `Mission`, which contains all the
/// scheduling semantics. Every queued event is applied before the tick it
/// raced with, so a callback always happens-before the next pending scan.
pub struct Runtime<C, T, K>
where
    C: CommandChannel,
    T: Ticker,
    K: Clock,
{
    mission: Mission,
    event_rx: mpsc::Receiver<MissionEvent>,
    channel: C,
    ticker: T,
    clock: K,
    options: RuntimeOptions,
}

impl<C, T, K> fmt::Debug for Runtime<C, T, K>
where
    C: CommandChannel,
    T: Ticker,
    K: Clock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("mission", &self.mission)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Why the loop stopped.
enum Exit {
    Shutdown,
    ChannelClosed,
    Idle,
    MaxTicks(u64),
}

impl<C, T, K> Runtime<C, T, K>
where
    C: CommandChannel,
    T: Ticker,
    K: Clock,
{
    pub fn new(
        mission: Mission,
        event_rx: mpsc::Receiver<MissionEvent>,
        channel: C,
        ticker: T,
        clock: K,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            mission,
            event_rx,
            channel,
            ticker,
            clock,
            options,
        }
    }

    /// Main loop. Returns the mission so callers can inspect final status.
    pub async fn run(mut self) -> Result<Mission> {
        info!("mission runtime started");

        let mut ticks: u64 = 0;
        let exit = loop {
            tokio::select! {
                biased;

                event = self.event_rx.recv() => match event {
                    Some(event) => {
                        debug!(?event, "runtime received event");
                        if !self.mission.handle_event(event) {
                            break Exit::Shutdown;
                        }
                    }
                    None => break Exit::ChannelClosed,
                },

                _ = self.ticker.tick() => {
                    if !self.drain_events() {
                        break Exit::Shutdown;
                    }

                    ticks += 1;
                    let reports = self.mission.tick(&mut self.channel, &self.clock);
                    for (target, report) in reports.iter().filter(|(_, r)| !r.is_quiet()) {
                        debug!(tick = ticks, target_id = %target, ?report, "tick");
                    }

                    if self.options.exit_when_idle && self.mission.is_idle() {
                        break Exit::Idle;
                    }
                    if self.options.max_ticks.is_some_and(|max| ticks >= max) {
                        break Exit::MaxTicks(ticks);
                    }
                }
            }
        };

        match exit {
            Exit::Shutdown => info!("shutdown requested; stopping runtime"),
            Exit::ChannelClosed => info!("runtime event channel closed; exiting"),
            Exit::Idle => info!(ticks, "no pending tasks left; exiting"),
            Exit::MaxTicks(n) => info!(ticks = n, "tick limit reached; exiting"),
        }

        Ok(self.mission)
    }

    /// Apply every event already queued. Returns `false` on shutdown.
    fn drain_events(&mut self) -> bool {
        while let Ok(event) = self.event_rx.try_recv() {
            debug!(?event, "runtime received event");
            if !self.mission.handle_event(event) {
                return false;
            }
        }
        true
    }
}
