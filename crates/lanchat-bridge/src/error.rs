use std::time::Duration;

use thiserror::Error;

use lanchat_shared::{ErrorCode, FrontendError};

/// Why a single command ultimately failed.
#[derive(Error, Debug, Clone)]
pub enum CallFailure {
    /// No answer within the per-attempt timeout. The backend may still
    /// complete the command later.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    /// The backend rejected the command.
    #[error("{0}")]
    Backend(FrontendError),

    /// Arguments could not be encoded.
    #[error("failed to encode arguments: {0}")]
    Encode(String),

    /// The reply did not have the expected shape.
    #[error("failed to decode reply: {0}")]
    Decode(String),
}

impl CallFailure {
    /// Backend taxonomy code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout(_) | Self::Transport(_) => ErrorCode::Network,
            Self::Backend(err) => err.code,
            Self::Encode(_) | Self::Decode(_) => ErrorCode::Serialize,
        }
    }

    /// Whether another attempt could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) => true,
            Self::Backend(err) => err.code.is_transient(),
            Self::Encode(_) | Self::Decode(_) => false,
        }
    }
}

/// Normalised error returned by every gateway call.
#[derive(Error, Debug, Clone)]
#[error("command `{command}` failed after {attempts} attempt(s): {cause}")]
pub struct CommandError {
    pub command: String,
    pub attempts: u32,
    #[source]
    pub cause: CallFailure,
}

impl CommandError {
    pub fn new(command: impl Into<String>, attempts: u32, cause: CallFailure) -> Self {
        Self {
            command: command.into(),
            attempts,
            cause,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.cause.code()
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, CallFailure::Timeout(_))
    }

    /// The structured backend error, when the backend produced one.
    pub fn backend_error(&self) -> Option<&FrontendError> {
        match &self.cause {
            CallFailure::Backend(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;
