//! Scripted in-memory [`Backend`] for tests.
//!
//! Replies are queued per command and consumed in order; sticky replies
//! answer every call once the queue for that command is empty. Every
//! invocation is recorded so tests can assert on what reached the backend.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::backend::{Backend, BackendError};

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum Scripted {
    Reply(Value),
    Reject(Value),
    Transport(String),
    /// Resolve with the inner outcome after a delay.
    Delayed(Duration, Box<Scripted>),
    /// Never resolve.
    Hang,
}

impl Scripted {
    pub fn delayed(delay: Duration, inner: Scripted) -> Self {
        Self::Delayed(delay, Box::new(inner))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub command: String,
    pub args: Value,
}

#[derive(Default)]
pub struct ScriptedBackend {
    queued: Mutex<HashMap<String, VecDeque<Scripted>>>,
    sticky: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome for the next call of `command`.
    pub fn push(&self, command: &str, outcome: Scripted) {
        self.queued
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push_back(outcome);
    }

    /// Answer every call of `command` with `outcome` once its queue is empty.
    pub fn always(&self, command: &str, outcome: Scripted) {
        self.sticky
            .lock()
            .unwrap()
            .insert(command.to_string(), outcome);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, command: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.command == command)
            .cloned()
            .collect()
    }

    pub fn call_count(&self, command: &str) -> usize {
        self.calls_to(command).len()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_outcome(&self, command: &str) -> Scripted {
        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(command)
            .and_then(|q| q.pop_front());

        queued
            .or_else(|| self.sticky.lock().unwrap().get(command).cloned())
            .unwrap_or_else(|| Scripted::Reject(json!(format!("unscripted command {command}"))))
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, BackendError> {
        self.calls.lock().unwrap().push(RecordedCall {
            command: command.to_string(),
            args,
        });

        let mut outcome = self.next_outcome(command);
        loop {
            match outcome {
                Scripted::Reply(value) => return Ok(value),
                Scripted::Reject(payload) => return Err(BackendError::Rejected(payload)),
                Scripted::Transport(reason) => return Err(BackendError::Transport(reason)),
                Scripted::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    outcome = *inner;
                }
                Scripted::Hang => return futures::future::pending().await,
            }
        }
    }
}
