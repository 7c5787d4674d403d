//! Data shapes exchanged with the backend over the command bridge.
//!
//! Result objects keep the backend's snake_case field names; command
//! arguments are built by `lanchat-bridge` and use camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    GroupId, GroupRole, MessageStatus, MessageType, OnlineStatus, SessionKey, SessionKind,
    TransferDirection, TransferStatus, UserId,
};

/// Backend command names.
pub mod commands {
    pub const GET_CURRENT_USER: &str = "get_current_user_handler";
    pub const UPDATE_CURRENT_USER: &str = "update_current_user_handler";

    pub const GET_CHAT_HISTORY: &str = "get_chat_history_handler";
    pub const SEND_TEXT_MESSAGE: &str = "send_text_message_handler";
    pub const GET_SESSION_LIST: &str = "get_session_list_handler";
    pub const MARK_MESSAGES_READ: &str = "mark_messages_read_handler";
    pub const MARK_MESSAGE_READ_AND_SEND_RECEIPT: &str = "mark_message_read_and_send_receipt";
    pub const RETRY_SEND_MESSAGE: &str = "retry_send_message";

    pub const GET_ONLINE_USERS: &str = "get_online_users_handler";
    pub const GET_CONTACT_LIST: &str = "get_contact_list_handler";

    pub const SEND_FILE_REQUEST: &str = "send_file_request_handler";
    pub const ACCEPT_FILE_REQUEST: &str = "accept_file_request_handler";
    pub const REJECT_FILE_REQUEST: &str = "reject_file_request_handler";
    pub const CANCEL_TRANSFER: &str = "cancel_upload_handler";
    pub const GET_PENDING_TRANSFERS: &str = "get_pending_transfers_handler";
    pub const RESUME_TRANSFER: &str = "resume_transfer_handler";

    pub const CREATE_GROUP: &str = "create_group_handler";
    pub const GET_GROUP_INFO: &str = "get_group_info_handler";
    pub const GET_GROUP_MEMBERS: &str = "get_group_members_handler";
    pub const ADD_GROUP_MEMBER: &str = "add_group_member_handler";
    pub const REMOVE_GROUP_MEMBER: &str = "remove_group_member_handler";
    pub const UPDATE_MEMBER_ROLE: &str = "update_member_role_handler";
    pub const GET_USER_GROUPS: &str = "get_user_groups_handler";
    pub const UPDATE_GROUP_INFO: &str = "update_group_info_handler";
    pub const DELETE_GROUP: &str = "delete_group_handler";
}

// ---------------------------------------------------------------------------
// Users & contacts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub uid: UserId,
    /// LAN address the peer announced itself from.
    pub feiq_ip: String,
    pub feiq_port: u16,
    pub feiq_machine_id: String,
    pub nickname: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub status: OnlineStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub id: i64,
    pub owner_uid: UserId,
    pub contact_uid: UserId,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(flatten)]
    pub user: UserInfo,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAttachmentDto {
    pub fid: i64,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub mid: i64,
    pub session_type: SessionKind,
    pub target_id: i64,
    pub sender_uid: UserId,
    /// Protocol packet number, needed to acknowledge the message.
    #[serde(default)]
    pub msg_no: Option<String>,
    /// Address to send the read receipt to.
    #[serde(default)]
    pub sender_ip: Option<String>,
    pub msg_type: MessageType,
    pub content: String,
    pub send_time: DateTime<Utc>,
    pub status: MessageStatus,
    #[serde(default)]
    pub file_info: Option<FileAttachmentDto>,
    #[serde(default)]
    pub is_revoked: Option<bool>,
}

impl ChatMessageDto {
    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(self.session_type, self.target_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSessionDto {
    pub sid: i64,
    pub owner_uid: UserId,
    pub session_type: SessionKind,
    pub target_id: i64,
    pub last_msg_id: Option<i64>,
    pub unread_count: u32,
    pub update_time: DateTime<Utc>,
    #[serde(default)]
    pub session_name: Option<String>,
    #[serde(default)]
    pub session_avatar: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_time: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// File transfer
// ---------------------------------------------------------------------------

/// A transfer the backend kept across restarts and can resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTransferDto {
    pub tid: i64,
    pub file_id: i64,
    pub file_name: String,
    pub file_path: String,
    pub transferred: u64,
    pub file_size: u64,
    pub status: TransferStatus,
    pub target_ip: String,
    pub direction: TransferDirection,
}

/// Progress report for one file. Every field but the id is optional: the
/// backend only sends what changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferProgressDto {
    pub file_id: i64,
    #[serde(default)]
    pub transferred: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    /// Bytes per second.
    #[serde(default)]
    pub speed: Option<f64>,
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub gid: GroupId,
    pub group_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub creator_uid: UserId,
    #[serde(default)]
    pub desc: Option<String>,
    pub create_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: i64,
    pub gid: GroupId,
    pub member_uid: UserId,
    pub nickname: String,
    pub role: GroupRole,
    pub join_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_message_from_backend_json() {
        let value = json!({
            "mid": 1,
            "session_type": 0,
            "target_id": 2,
            "sender_uid": 2,
            "msg_type": 0,
            "content": "Hello",
            "send_time": "2024-01-30T10:00:00Z",
            "status": 1
        });

        let msg: ChatMessageDto = serde_json::from_value(value).unwrap();
        assert_eq!(msg.session_key(), SessionKey::direct(UserId(2)));
        assert_eq!(msg.status, MessageStatus::Sent);
        assert!(msg.msg_no.is_none());
        assert!(msg.file_info.is_none());
    }

    #[test]
    fn test_contact_flattens_user_fields() {
        let value = json!({
            "id": 3,
            "owner_uid": 1,
            "contact_uid": 5,
            "uid": 5,
            "feiq_ip": "192.168.1.5",
            "feiq_port": 2425,
            "feiq_machine_id": "PC-5",
            "nickname": "Eve",
            "status": 1
        });

        let contact: ContactInfo = serde_json::from_value(value).unwrap();
        assert_eq!(contact.user.nickname, "Eve");
        assert_eq!(contact.user.status, OnlineStatus::Online);
        assert!(contact.remark.is_none());
    }

    #[test]
    fn test_partial_progress() {
        let progress: TransferProgressDto =
            serde_json::from_value(json!({"file_id": 9, "transferred": 512})).unwrap();
        assert_eq!(progress.transferred, Some(512));
        assert!(progress.total.is_none());
        assert!(progress.speed.is_none());
    }
}
