// src/sim/channel.rs

//! In-process command channel backed by simulated targets.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::command::{CommandChannel, CommandEnvelope, CommandReport, CommandType};
use crate::config::PlanFile;
use crate::engine::MissionEvent;
use crate::errors::{MissionError, Result};
use crate::sim::behavior::{Delivery, EntityBehavior, ReactionOutcome};
use crate::types::{Resolution, TargetId};

/// How often an out-of-comms target retries delivering a report.
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(100);

type SharedEntity = Arc<Mutex<EntityBehavior>>;

fn lock(entity: &Mutex<EntityBehavior>) -> MutexGuard<'_, EntityBehavior> {
    entity.lock().unwrap_or_else(PoisonError::into_inner)
}

/// [`CommandChannel`] that hands commands to in-process [`EntityBehavior`]s
/// and posts their reports back as [`MissionEvent::CommandResolved`].
///
/// Each accepted command gets its own tokio task that waits for the
/// reaction's delay, then delivers the report, retrying while the target is
/// out of comms. Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct SimChannel {
    entities: HashMap<TargetId, SharedEntity>,
    event_tx: mpsc::Sender<MissionEvent>,
    retry_interval: Duration,
}

impl SimChannel {
    pub fn new(event_tx: mpsc::Sender<MissionEvent>) -> Self {
        Self {
            entities: HashMap::new(),
            event_tx,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// One simulated target per plan target.
    ///
    /// Every command type completes after the target's latency, except the
    /// types listed in `fail`, which fail with "simulated failure".
    pub fn from_plan(plan: &PlanFile, event_tx: mpsc::Sender<MissionEvent>) -> Result<Self> {
        let mut channel = Self::new(event_tx);

        for (name, target) in plan.target.iter() {
            let latency = target.latency()?;
            let mut behavior = EntityBehavior::new(name.clone(), target.reachable);

            for command_type in CommandType::ALL {
                if target.fail.contains(&command_type) {
                    behavior.on_command(command_type, move |_: &CommandEnvelope| ReactionOutcome::Fail {
                        after: latency,
                        reason: "simulated failure".to_string(),
                    });
                } else {
                    behavior.on_command(command_type, move |env: &CommandEnvelope| {
                        ReactionOutcome::Complete {
                            after: latency,
                            data: json!({ "command": env.command }),
                        }
                    });
                }
            }

            channel.add_entity(behavior);
        }

        Ok(channel)
    }

    /// Register a target, replacing any previous one with the same id.
    pub fn add_entity(&mut self, behavior: EntityBehavior) -> SharedEntity {
        let target = behavior.target().to_string();
        let shared = Arc::new(Mutex::new(behavior));
        self.entities.insert(target, Arc::clone(&shared));
        shared
    }

    pub fn entity(&self, target: &str) -> Option<SharedEntity> {
        self.entities.get(target).cloned()
    }

    /// Put a target in or out of comms. Returns `false` for unknown targets.
    pub fn set_comms(&self, target: &str, reachable: bool) -> bool {
        match self.entities.get(target) {
            Some(entity) => {
                lock(entity).set_comms(reachable);
                true
            }
            None => false,
        }
    }

    fn report_now(&self, target: &str, envelope: &CommandEnvelope, reason: String) {
        let report = CommandReport::for_command(envelope.clone(), Some(reason), Value::Null);
        let payload = match report.encode() {
            Ok(payload) => payload,
            Err(e) => {
                error!(target_id = %target, error = %e, "failed to encode command report");
                return;
            }
        };
        let event = MissionEvent::CommandResolved {
            target: target.to_string(),
            resolution: Resolution::Failed,
            payload,
        };
        if let Err(e) = self.event_tx.try_send(event) {
            warn!(target_id = %target, error = %e, "could not queue failure report");
        }
    }
}

impl CommandChannel for SimChannel {
    fn send(&mut self, target: &str, envelope: &CommandEnvelope) -> bool {
        let Some(entity) = self.entities.get(target) else {
            warn!(target_id = %target, "send: unknown target");
            return false;
        };

        let raw = match envelope.encode() {
            Ok(raw) => raw,
            Err(e) => {
                error!(target_id = %target, error = %e, "send: failed to encode command");
                return false;
            }
        };

        let received = {
            let mut behavior = lock(entity);
            if !behavior.has_comms() {
                debug!(target_id = %target, "send: target out of comms");
                return false;
            }
            behavior.receive(&raw)
        };

        match received {
            Ok(Some(outcome)) => {
                spawn_delivery(
                    target.to_string(),
                    Arc::clone(entity),
                    envelope.command_type(),
                    outcome,
                    self.event_tx.clone(),
                    self.retry_interval,
                );
                true
            }
            // Delivered, then dropped by the target. The task will not
            // resolve until the active command of this type does.
            Ok(None) => {
                warn!(
                    target_id = %target,
                    command_type = %envelope.command_type(),
                    task = envelope.meta.task_id.as_deref().unwrap_or("-"),
                    "send: target dropped duplicate command; task will wait on the active one"
                );
                true
            }
            Err(e @ MissionError::NoReactionRegistered { .. }) => {
                error!(target_id = %target, error = %e, "target cannot handle command");
                self.report_now(target, envelope, e.to_string());
                true
            }
            Err(e) => {
                error!(target_id = %target, error = %e, "send: target rejected command");
                false
            }
        }
    }
}

/// Wait out the reaction delay, then deliver the report once in comms.
fn spawn_delivery(
    target: TargetId,
    entity: SharedEntity,
    command_type: CommandType,
    outcome: ReactionOutcome,
    event_tx: mpsc::Sender<MissionEvent>,
    retry_interval: Duration,
) {
    tokio::spawn(async move {
        tokio::time::sleep(outcome.after()).await;

        loop {
            let (resolution, delivery) = {
                let mut behavior = lock(&entity);
                match &outcome {
                    ReactionOutcome::Complete { data, .. } => (
                        Resolution::Completed,
                        behavior.complete_command(command_type, data.clone()),
                    ),
                    ReactionOutcome::Fail { reason, .. } => (
                        Resolution::Failed,
                        behavior.fail_command(command_type, reason.clone()),
                    ),
                }
            };

            match delivery {
                Delivery::Sent(payload) => {
                    let event = MissionEvent::CommandResolved {
                        target: target.clone(),
                        resolution,
                        payload,
                    };
                    if event_tx.send(event).await.is_err() {
                        debug!(target_id = %target, "mission gone; dropping report");
                    }
                    break;
                }
                Delivery::NoComms => tokio::time::sleep(retry_interval).await,
                Delivery::NotActive => break,
            }
        }
    });
}
