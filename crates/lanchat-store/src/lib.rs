//! # lanchat-store
//!
//! Client-side view state for LanChat: the message delivery state machine,
//! per-conversation message lists, the session list, history cursors and
//! file transfer tracking.
//!
//! Everything here is synchronous and free of I/O. The controller in
//! `lanchat-client` owns one instance of each type and mutates it only
//! through the methods below.

pub mod format;
pub mod messages;
pub mod models;
pub mod pagination;
pub mod sessions;
pub mod status;
pub mod transfers;

mod error;

pub use error::{Result, StoreError};
pub use messages::MessageStore;
pub use models::*;
pub use pagination::{Cursor, FetchTicket, Pagination};
pub use sessions::SessionList;
pub use status::{check_transition, Transition};
pub use transfers::{ProgressOutcome, ProgressUpdate, Transfer, TransferTracker};
