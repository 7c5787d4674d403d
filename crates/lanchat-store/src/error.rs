use thiserror::Error;

use lanchat_shared::types::{SessionKey, TransferStatus};

use crate::models::MessageId;

/// Errors produced by the store layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No message with this id in any conversation.
    #[error("Message not found: {0}")]
    UnknownMessage(MessageId),

    /// The session is not in the session list.
    #[error("Session not found: {0}")]
    UnknownSession(SessionKey),

    /// No transfer is tracked under this file id.
    #[error("Transfer not found: {0}")]
    UnknownTransfer(i64),

    /// The transfer already reached a terminal state.
    #[error("Transfer {file_id} already {status}")]
    TransferFinished {
        file_id: i64,
        status: TransferStatus,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
