use serde::Serialize;

use lanchat_shared::protocol::{commands, ChatMessageDto, ChatSessionDto};
use lanchat_shared::types::{SessionKey, SessionKind, UserId};

use crate::error::Result;
use crate::gateway::Gateway;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryArgs {
    session_type: SessionKind,
    target_id: i64,
    page: u32,
    page_size: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendTextArgs<'a> {
    session_type: SessionKind,
    target_id: i64,
    content: &'a str,
    owner_uid: UserId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OwnerArgs {
    owner_uid: UserId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkReadArgs {
    session_type: SessionKind,
    target_id: i64,
    owner_uid: UserId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptArgs<'a> {
    mid: i64,
    msg_no: &'a str,
    target_ip: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetryArgs {
    mid: i64,
    session_type: SessionKind,
    target_id: i64,
    owner_uid: UserId,
}

impl Gateway {
    pub async fn get_history(
        &self,
        session: SessionKey,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ChatMessageDto>> {
        let args = HistoryArgs {
            session_type: session.kind,
            target_id: session.target,
            page,
            page_size,
        };
        self.call(commands::GET_CHAT_HISTORY, &args, self.read_options())
            .await
    }

    /// Returns the server-assigned message id.
    pub async fn send_text_message(
        &self,
        session: SessionKey,
        content: &str,
        owner: UserId,
    ) -> Result<i64> {
        let args = SendTextArgs {
            session_type: session.kind,
            target_id: session.target,
            content,
            owner_uid: owner,
        };
        self.call(commands::SEND_TEXT_MESSAGE, &args, self.write_options())
            .await
    }

    pub async fn get_session_list(&self, owner: UserId) -> Result<Vec<ChatSessionDto>> {
        self.call(
            commands::GET_SESSION_LIST,
            &OwnerArgs { owner_uid: owner },
            self.read_options(),
        )
        .await
    }

    /// Mark every message of a conversation read on the backend.
    pub async fn mark_messages_read(&self, session: SessionKey, owner: UserId) -> Result<()> {
        let args = MarkReadArgs {
            session_type: session.kind,
            target_id: session.target,
            owner_uid: owner,
        };
        self.call_unit(commands::MARK_MESSAGES_READ, &args, self.read_options())
            .await
    }

    /// Mark one message read and acknowledge it to the sending peer.
    pub async fn mark_message_read_and_send_receipt(
        &self,
        mid: i64,
        seq_no: &str,
        peer_addr: &str,
    ) -> Result<()> {
        let args = ReceiptArgs {
            mid,
            msg_no: seq_no,
            target_ip: peer_addr,
        };
        self.call_unit(
            commands::MARK_MESSAGE_READ_AND_SEND_RECEIPT,
            &args,
            self.write_options(),
        )
        .await
    }

    pub async fn retry_send_message(
        &self,
        mid: i64,
        session: SessionKey,
        owner: UserId,
    ) -> Result<()> {
        let args = RetryArgs {
            mid,
            session_type: session.kind,
            target_id: session.target,
            owner_uid: owner,
        };
        self.call_unit(commands::RETRY_SEND_MESSAGE, &args, self.write_options())
            .await
    }
}
