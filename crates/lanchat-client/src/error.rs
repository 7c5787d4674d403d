use thiserror::Error;

use lanchat_bridge::CommandError;
use lanchat_shared::ErrorCode;
use lanchat_store::{MessageId, StoreError};

/// Errors surfaced by [`crate::ChatClient`] operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No current user loaded")]
    NoCurrentUser,

    #[error("Transfer {0} is not an inbound offer")]
    NotAnOffer(i64),

    #[error("Transfer {0} has no resumable record")]
    NotResumable(i64),

    #[error("Message {0} has no text to send again")]
    NotResendable(MessageId),

    #[error("State lock poisoned")]
    StatePoisoned,
}

impl ClientError {
    /// Error kind for callers that branch on the backend taxonomy.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Command(e) => e.code(),
            Self::Store(StoreError::TransferFinished { .. }) => ErrorCode::Business,
            Self::Store(_) => ErrorCode::NotFound,
            Self::NoCurrentUser
            | Self::NotAnOffer(_)
            | Self::NotResumable(_)
            | Self::NotResendable(_) => ErrorCode::Validation,
            Self::StatePoisoned => ErrorCode::Business,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
