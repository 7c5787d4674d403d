//! Client configuration loaded from environment variables.
//!
//! Every setting has a default, so a client starts with no configuration.

use std::time::Duration;

use lanchat_bridge::GatewayConfig;
use lanchat_shared::constants::{DEFAULT_EVENT_CAPACITY, DEFAULT_PAGE_SIZE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Timeout, retry budget and backoff for backend commands.
    /// Env: `LANCHAT_COMMAND_TIMEOUT_MS`, `LANCHAT_COMMAND_RETRIES`,
    /// `LANCHAT_BACKOFF_BASE_MS`
    pub gateway: GatewayConfig,

    /// Messages requested per history page.
    /// Env: `LANCHAT_PAGE_SIZE`
    /// Default: `50`
    pub page_size: u32,

    /// Buffer of the view event channel.
    /// Env: `LANCHAT_EVENT_CAPACITY`
    /// Default: `256`
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64>(&lookup, "LANCHAT_COMMAND_TIMEOUT_MS") {
            if ms > 0 {
                config.gateway.timeout = Duration::from_millis(ms);
            } else {
                tracing::warn!("LANCHAT_COMMAND_TIMEOUT_MS must be positive, using default");
            }
        }

        if let Some(retries) = parse_var::<u32>(&lookup, "LANCHAT_COMMAND_RETRIES") {
            config.gateway.retries = retries;
        }

        if let Some(ms) = parse_var::<u64>(&lookup, "LANCHAT_BACKOFF_BASE_MS") {
            config.gateway.backoff_base = Duration::from_millis(ms);
        }

        if let Some(size) = parse_var::<u32>(&lookup, "LANCHAT_PAGE_SIZE") {
            if size > 0 {
                config.page_size = size;
            } else {
                tracing::warn!("LANCHAT_PAGE_SIZE must be positive, using default");
            }
        }

        if let Some(capacity) = parse_var::<usize>(&lookup, "LANCHAT_EVENT_CAPACITY") {
            if capacity > 0 {
                config.event_capacity = capacity;
            } else {
                tracing::warn!("LANCHAT_EVENT_CAPACITY must be positive, using default");
            }
        }

        // RUST_LOG is read by tracing-subscriber's EnvFilter in init_tracing.

        config
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "Invalid value, using default");
            None
        }
    }
}
