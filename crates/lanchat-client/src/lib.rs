//! # lanchat-client
//!
//! Session-scoped controller of the LanChat client. [`ChatClient`] drives the
//! backend through the command gateway and keeps the view state (sessions,
//! messages, history cursors, transfers, roster) consistent with it.

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod state;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::ClientConfig;
pub use controller::ChatClient;
pub use error::{ClientError, Result};
pub use events::{BackendEvent, ViewEvent};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Calling it again is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("lanchat_client=debug,lanchat_bridge=info,lanchat_store=info,warn")
    });

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();

    tracing::info!(app = lanchat_shared::constants::APP_NAME, "Tracing initialised");
}
