//! Resilience wrapper around [`Backend`]: every backend call goes through
//! [`Gateway::call_raw`], which adds a per-attempt timeout, bounded retries
//! with exponential backoff and error normalisation.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use lanchat_shared::constants::{
    DEFAULT_BACKOFF_BASE_MS, DEFAULT_COMMAND_RETRIES, DEFAULT_COMMAND_TIMEOUT_MS,
};

use crate::backend::{Backend, BackendError};
use crate::error::{CallFailure, CommandError, Result};

/// Gateway-wide defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Extra attempts granted to read commands after a transient failure.
    pub retries: u32,
    /// Delay before the first retry; doubled for every following one.
    pub backoff_base: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_COMMAND_TIMEOUT_MS),
            retries: DEFAULT_COMMAND_RETRIES,
            backoff_base: Duration::from_millis(DEFAULT_BACKOFF_BASE_MS),
        }
    }
}

/// Options for a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    pub timeout: Duration,
    pub retries: u32,
    pub backoff_base: Duration,
    /// Suppress logging. The error is still returned.
    pub silent: bool,
}

impl CallOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl From<&GatewayConfig> for CallOptions {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            timeout: config.timeout,
            retries: config.retries,
            backoff_base: config.backoff_base,
            silent: false,
        }
    }
}

/// One entry of [`Gateway::call_batch`].
#[derive(Debug, Clone)]
pub struct BatchCall {
    pub command: String,
    pub args: Value,
}

impl BatchCall {
    pub fn new(command: impl Into<String>, args: Value) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

/// Single chokepoint for all backend commands.
#[derive(Clone)]
pub struct Gateway {
    backend: Arc<dyn Backend>,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(backend: Arc<dyn Backend>, config: GatewayConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Options for idempotent commands: the configured retry budget applies.
    pub fn read_options(&self) -> CallOptions {
        CallOptions::from(&self.config)
    }

    /// Options for commands with side effects on peers (sending, receipts,
    /// transfer actions). A timed-out attempt may still have run, so these
    /// are never repeated automatically.
    pub fn write_options(&self) -> CallOptions {
        CallOptions::from(&self.config).with_retries(0)
    }

    /// Invoke `command`, retrying transient failures up to `opts.retries`
    /// times. Permanent failures are returned immediately.
    pub async fn call_raw(&self, command: &str, args: Value, opts: CallOptions) -> Result<Value> {
        let mut attempt: u32 = 0;

        loop {
            let failure =
                match tokio::time::timeout(opts.timeout, self.backend.invoke(command, args.clone()))
                    .await
                {
                    Ok(Ok(value)) => {
                        debug!(command, attempt, "Command succeeded");
                        return Ok(value);
                    }
                    Ok(Err(BackendError::Transport(reason))) => CallFailure::Transport(reason),
                    Ok(Err(BackendError::Rejected(payload))) => {
                        CallFailure::Backend(lanchat_shared::FrontendError::from_value(&payload))
                    }
                    Err(_) => CallFailure::Timeout(opts.timeout),
                };

            if attempt < opts.retries && failure.is_transient() {
                let delay = opts.backoff(attempt);
                if !opts.silent {
                    warn!(
                        command,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure,
                        "Command failed, retrying"
                    );
                }
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            if !opts.silent {
                error!(
                    command,
                    attempts = attempt + 1,
                    code = %failure.code(),
                    error = %failure,
                    "Command failed"
                );
            }
            return Err(CommandError::new(command, attempt + 1, failure));
        }
    }

    /// Typed call: encode `args`, run [`Gateway::call_raw`], decode the reply.
    pub async fn call<A, T>(&self, command: &str, args: &A, opts: CallOptions) -> Result<T>
    where
        A: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let args = serde_json::to_value(args).map_err(|e| {
            self.local_failure(command, CallFailure::Encode(e.to_string()), opts)
        })?;

        let value = self.call_raw(command, args, opts).await?;

        serde_json::from_value(value)
            .map_err(|e| self.local_failure(command, CallFailure::Decode(e.to_string()), opts))
    }

    /// Like [`Gateway::call`] for commands whose reply carries no data.
    pub async fn call_unit<A>(&self, command: &str, args: &A, opts: CallOptions) -> Result<()>
    where
        A: Serialize + ?Sized,
    {
        let args = serde_json::to_value(args).map_err(|e| {
            self.local_failure(command, CallFailure::Encode(e.to_string()), opts)
        })?;
        self.call_raw(command, args, opts).await.map(|_| ())
    }

    /// Run every call concurrently with the read options. Each slot holds its
    /// own outcome; one failure never fails the batch.
    pub async fn call_batch(&self, calls: Vec<BatchCall>) -> Vec<Result<Value>> {
        let opts = self.read_options();
        join_all(
            calls
                .into_iter()
                .map(|call| async move { self.call_raw(&call.command, call.args, opts).await }),
        )
        .await
    }

    fn local_failure(&self, command: &str, failure: CallFailure, opts: CallOptions) -> CommandError {
        if !opts.silent {
            error!(command, error = %failure, "Command failed");
        }
        CommandError::new(command, 1, failure)
    }
}
