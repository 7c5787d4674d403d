// Command gateway between the client core and the native backend.

pub mod backend;
pub mod chat;
pub mod error;
pub mod file;
pub mod gateway;
pub mod group;
pub mod user;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{Backend, BackendError, BridgeRequest, ChannelBackend};
pub use error::{CallFailure, CommandError};
pub use gateway::{BatchCall, CallOptions, Gateway, GatewayConfig};
