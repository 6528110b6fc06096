use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use missiongraph::command::{CommandChannel, CommandEnvelope, CommandReport};
use serde_json::Value;

/// One `send` call observed by a [`FakeChannel`].
#[derive(Debug, Clone)]
pub struct SentCommand {
    pub target: String,
    pub envelope: CommandEnvelope,
    pub accepted: bool,
}

impl SentCommand {
    pub fn task_id(&self) -> Option<&str> {
        self.envelope.meta.task_id.as_deref()
    }
}

#[derive(Debug)]
struct State {
    sent: Vec<SentCommand>,
    /// Answers consumed one per `send`, before falling back to reachability.
    script: VecDeque<bool>,
    unreachable: HashSet<String>,
}

/// A fake command channel that:
/// - records every `send` call, accepted or not
/// - accepts by default, unless the target is marked unreachable or a
///   scripted answer says otherwise
///
/// Clones share state, so a test can keep a handle while the runtime owns
/// the channel.
#[derive(Debug, Clone)]
pub struct FakeChannel {
    state: Arc<Mutex<State>>,
}

impl Default for FakeChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeChannel {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                sent: Vec::new(),
                script: VecDeque::new(),
                unreachable: HashSet::new(),
            })),
        }
    }

    /// Queue answers for the next `send` calls.
    pub fn script(&self, answers: impl IntoIterator<Item = bool>) {
        self.state.lock().unwrap().script.extend(answers);
    }

    pub fn set_reachable(&self, target: &str, reachable: bool) {
        let mut state = self.state.lock().unwrap();
        if reachable {
            state.unreachable.remove(target);
        } else {
            state.unreachable.insert(target.to_string());
        }
    }

    /// Every `send` call so far.
    pub fn sent(&self) -> Vec<SentCommand> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Only the accepted sends.
    pub fn accepted(&self) -> Vec<SentCommand> {
        self.sent().into_iter().filter(|s| s.accepted).collect()
    }

    /// Task ids of accepted sends, in order.
    pub fn accepted_task_ids(&self) -> Vec<String> {
        self.accepted()
            .iter()
            .filter_map(|s| s.task_id().map(str::to_string))
            .collect()
    }

    pub fn attempts(&self) -> usize {
        self.state.lock().unwrap().sent.len()
    }

    /// Most recent accepted envelope carrying `task_id`.
    pub fn envelope_for(&self, task_id: &str) -> Option<CommandEnvelope> {
        self.accepted()
            .into_iter()
            .rev()
            .find(|s| s.task_id() == Some(task_id))
            .map(|s| s.envelope)
    }

    pub fn clear_log(&self) {
        self.state.lock().unwrap().sent.clear();
    }
}

impl CommandChannel for FakeChannel {
    fn send(&mut self, target: &str, envelope: &CommandEnvelope) -> bool {
        let mut state = self.state.lock().unwrap();
        let accepted = match state.script.pop_front() {
            Some(answer) => answer,
            None => !state.unreachable.contains(target),
        };
        state.sent.push(SentCommand {
            target: target.to_string(),
            envelope: envelope.clone(),
            accepted,
        });
        accepted
    }
}

/// Encoded completion report for `envelope`, as a target would send it.
pub fn completion_for(envelope: &CommandEnvelope) -> String {
    CommandReport::for_command(envelope.clone(), None, Value::Null)
        .encode()
        .expect("encode completion report")
}

/// Encoded failure report for `envelope`.
pub fn failure_for(envelope: &CommandEnvelope, reason: &str) -> String {
    CommandReport::for_command(envelope.clone(), Some(reason.to_string()), Value::Null)
        .encode()
        .expect("encode failure report")
}
