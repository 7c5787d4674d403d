//! Domain models held by the client-side store.
//!
//! These are built from the backend DTOs in `lanchat_shared::protocol` and
//! are what the UI layer reads.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lanchat_shared::constants::FILE_MESSAGE_PREFIX;
use lanchat_shared::protocol::{ChatMessageDto, ChatSessionDto, FileAttachmentDto};
use lanchat_shared::types::{MessageStatus, MessageType, SessionKey, UserId};

// ---------------------------------------------------------------------------
// Message id
// ---------------------------------------------------------------------------

/// Identity of a message in the store.
///
/// An optimistic message starts with a `Local` placeholder and is re-keyed to
/// `Server` once the backend confirms the send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageId {
    Local(Uuid),
    Server(i64),
}

impl MessageId {
    /// Fresh placeholder id for an optimistic message.
    pub fn local() -> Self {
        Self::Local(Uuid::new_v4())
    }

    pub fn server_id(&self) -> Option<i64> {
        match self {
            Self::Server(id) => Some(*id),
            Self::Local(_) => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(uuid) => write!(f, "local:{uuid}"),
            Self::Server(id) => write!(f, "{id}"),
        }
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self::Server(id)
    }
}

// ---------------------------------------------------------------------------
// Message body
// ---------------------------------------------------------------------------

/// A file carried by a file, image, voice or video message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub file_id: i64,
    pub file_name: String,
    pub file_size: u64,
    /// MIME type or extension as reported by the sender.
    pub file_type: String,
    pub local_path: Option<String>,
    pub download_url: Option<String>,
    pub thumbnail: Option<String>,
}

impl From<FileAttachmentDto> for FileAttachment {
    fn from(dto: FileAttachmentDto) -> Self {
        Self {
            file_id: dto.fid,
            file_name: dto.file_name,
            file_size: dto.file_size,
            file_type: dto.file_type,
            local_path: dto.file_path,
            download_url: dto.download_url,
            thumbnail: dto.thumbnail,
        }
    }
}

/// Message payload, one variant per message kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageBody {
    Text(String),
    Emoji(String),
    File(FileAttachment),
    Image(FileAttachment),
    Voice(FileAttachment),
    Video(FileAttachment),
}

impl MessageBody {
    /// Build a body from the backend's `(msg_type, content, file_info)`
    /// triple. Attachment kinds take the descriptor from `file_info`, or
    /// from `content` when the backend serialised it there. A kind whose
    /// descriptor is missing degrades to text so the message still shows.
    pub fn from_wire(
        msg_type: MessageType,
        content: String,
        file_info: Option<FileAttachmentDto>,
    ) -> Self {
        let attachment = match msg_type {
            MessageType::Text => return Self::Text(content),
            MessageType::Emoji => return Self::Emoji(content),
            _ => file_info
                .or_else(|| serde_json::from_str::<FileAttachmentDto>(&content).ok())
                .map(FileAttachment::from),
        };

        match (msg_type, attachment) {
            (MessageType::File, Some(a)) => Self::File(a),
            (MessageType::Image, Some(a)) => Self::Image(a),
            (MessageType::Voice, Some(a)) => Self::Voice(a),
            (MessageType::Video, Some(a)) => Self::Video(a),
            _ => Self::Text(content),
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Text(_) => MessageType::Text,
            Self::Emoji(_) => MessageType::Emoji,
            Self::File(_) => MessageType::File,
            Self::Image(_) => MessageType::Image,
            Self::Voice(_) => MessageType::Voice,
            Self::Video(_) => MessageType::Video,
        }
    }

    pub fn attachment(&self) -> Option<&FileAttachment> {
        match self {
            Self::File(a) | Self::Image(a) | Self::Voice(a) | Self::Video(a) => Some(a),
            Self::Text(_) | Self::Emoji(_) => None,
        }
    }

    /// Full text of a text or emoji message.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Emoji(text) => Some(text),
            _ => None,
        }
    }

    /// One-line summary for the session list.
    pub fn preview(&self) -> String {
        match self {
            Self::Text(text) | Self::Emoji(text) => text.clone(),
            Self::File(a) => format!("{FILE_MESSAGE_PREFIX} {}", a.file_name),
            Self::Image(_) => "[Image]".to_string(),
            Self::Voice(_) => "[Voice]".to_string(),
            Self::Video(_) => "[Video]".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// What a read receipt needs to reach the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptInfo {
    /// Protocol packet number of the original message.
    pub seq_no: String,
    /// Address of the sending peer.
    pub peer_addr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub session: SessionKey,
    pub sender: UserId,
    pub body: MessageBody,
    pub sent_at: DateTime<Utc>,
    pub status: MessageStatus,
    /// `None` when the message lacks a sequence number or sender address,
    /// e.g. messages stored before receipts existed.
    pub receipt: Option<ReceiptInfo>,
    pub revoked: bool,
}

impl Message {
    /// Optimistic outbound message, not yet acknowledged by the backend.
    pub fn pending(session: SessionKey, sender: UserId, body: MessageBody) -> Self {
        Self {
            id: MessageId::local(),
            session,
            sender,
            body,
            sent_at: Utc::now(),
            status: MessageStatus::Sending,
            receipt: None,
            revoked: false,
        }
    }
}

impl From<ChatMessageDto> for Message {
    fn from(dto: ChatMessageDto) -> Self {
        let session = dto.session_key();
        let receipt = match (dto.msg_no, dto.sender_ip) {
            (Some(seq_no), Some(peer_addr)) if !seq_no.is_empty() && !peer_addr.is_empty() => {
                Some(ReceiptInfo { seq_no, peer_addr })
            }
            _ => None,
        };

        Self {
            id: MessageId::Server(dto.mid),
            session,
            sender: dto.sender_uid,
            body: MessageBody::from_wire(dto.msg_type, dto.content, dto.file_info),
            sent_at: dto.send_time,
            status: dto.status,
            receipt,
            revoked: dto.is_revoked.unwrap_or(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A conversation as listed for the local user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub owner: UserId,
    pub key: SessionKey,
    pub last_message_id: Option<i64>,
    pub unread: u32,
    pub updated_at: DateTime<Utc>,
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl From<ChatSessionDto> for Session {
    fn from(dto: ChatSessionDto) -> Self {
        Self {
            id: dto.sid,
            owner: dto.owner_uid,
            key: SessionKey::new(dto.session_type, dto.target_id),
            last_message_id: dto.last_msg_id,
            unread: dto.unread_count,
            updated_at: dto.update_time,
            name: dto.session_name,
            avatar: dto.session_avatar,
            last_message: dto.last_message,
            last_message_at: dto.last_message_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanchat_shared::types::SessionKind;

    fn dto(msg_type: MessageType, content: &str) -> ChatMessageDto {
        ChatMessageDto {
            mid: 1,
            session_type: SessionKind::Direct,
            target_id: 2,
            sender_uid: UserId(2),
            msg_no: Some("1700000000".into()),
            sender_ip: Some("192.168.1.2".into()),
            msg_type,
            content: content.into(),
            send_time: Utc::now(),
            status: MessageStatus::Sent,
            file_info: None,
            is_revoked: None,
        }
    }

    #[test]
    fn test_text_message_conversion() {
        let msg = Message::from(dto(MessageType::Text, "Hello"));
        assert_eq!(msg.id, MessageId::Server(1));
        assert_eq!(msg.body, MessageBody::Text("Hello".into()));
        assert_eq!(msg.receipt.as_ref().unwrap().peer_addr, "192.168.1.2");
        assert!(!msg.revoked);
    }

    #[test]
    fn test_receipt_requires_both_fields() {
        let mut wire = dto(MessageType::Text, "Hi");
        wire.msg_no = None;
        assert!(Message::from(wire).receipt.is_none());

        let mut wire = dto(MessageType::Text, "Hi");
        wire.sender_ip = Some(String::new());
        assert!(Message::from(wire).receipt.is_none());
    }

    #[test]
    fn test_file_descriptor_in_content() {
        let content = r#"{"fid":4,"file_name":"a.png","file_size":10,"file_type":"image/png"}"#;
        let msg = Message::from(dto(MessageType::Image, content));
        match msg.body {
            MessageBody::Image(ref a) => assert_eq!(a.file_name, "a.png"),
            ref other => panic!("unexpected body {other:?}"),
        }
        assert_eq!(msg.body.message_type(), MessageType::Image);
    }

    #[test]
    fn test_missing_descriptor_degrades_to_text() {
        let msg = Message::from(dto(MessageType::File, "[File] report.pdf"));
        assert_eq!(msg.body, MessageBody::Text("[File] report.pdf".into()));
    }

    #[test]
    fn test_text_is_full_content() {
        let long = "x".repeat(500);
        let msg = Message::from(dto(MessageType::Text, &long));
        assert_eq!(msg.body.text(), Some(long.as_str()));

        let content = r#"{"fid":4,"file_name":"a.png","file_size":10,"file_type":"image/png"}"#;
        let image = Message::from(dto(MessageType::Image, content));
        assert_eq!(image.body.text(), None);
        assert_eq!(image.body.preview(), "[Image]");
    }

    #[test]
    fn test_pending_message_is_local() {
        let msg = Message::pending(
            SessionKey::direct(UserId(42)),
            UserId(1),
            MessageBody::Text("Hello".into()),
        );
        assert!(msg.id.is_local());
        assert_eq!(msg.status, MessageStatus::Sending);
        assert!(msg.id.server_id().is_none());
    }
}
