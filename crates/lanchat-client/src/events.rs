use serde::{Deserialize, Serialize};

use lanchat_shared::protocol::{ChatMessageDto, TransferProgressDto, UserInfo};
use lanchat_shared::types::{MessageStatus, SessionKind, UserId};

/// Notifications pushed by the backend outside of any command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum BackendEvent {
    MessageReceived(ChatMessageDto),
    MessageSent {
        mid: i64,
    },
    MessageSendFailed {
        mid: i64,
        #[serde(default)]
        reason: Option<String>,
    },
    MessageStatusChanged {
        mid: i64,
        status: MessageStatus,
    },
    UnreadCountChanged {
        session_type: SessionKind,
        target_id: i64,
        count: u32,
    },
    FileOffered {
        file_id: i64,
        /// Packet number of the offer, echoed back on accept/reject.
        request_id: String,
        file_name: String,
        file_size: u64,
        peer_addr: String,
    },
    TransferProgress(TransferProgressDto),
    TransferCompleted {
        file_id: i64,
    },
    TransferFailed {
        file_id: i64,
        #[serde(default)]
        reason: Option<String>,
    },
    UserOnline(UserInfo),
    UserOffline {
        uid: UserId,
    },
}

/// Change notifications for the view layer. Subscribers re-read the
/// affected state through [`crate::ChatClient`] accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewEvent {
    SessionsChanged,
    MessagesChanged {
        session_type: SessionKind,
        target_id: i64,
    },
    TransferChanged {
        file_id: i64,
    },
    RosterChanged,
}
