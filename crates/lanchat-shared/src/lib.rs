//! # lanchat-shared
//!
//! Types shared by every LanChat crate: identifiers and wire enums, the
//! backend error taxonomy, the data shapes exchanged over the command bridge
//! and protocol constants.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::{ErrorCode, FrontendError};
