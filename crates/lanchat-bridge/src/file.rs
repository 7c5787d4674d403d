//! File transfer commands.
//!
//! The backend runs the actual transfer; these commands only start, answer,
//! cancel or resume one. Progress comes back as events.

use serde::Serialize;
use serde_json::Value;

use lanchat_shared::protocol::{commands, PendingTransferDto};
use lanchat_shared::types::UserId;

use crate::error::Result;
use crate::gateway::Gateway;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendFileArgs<'a> {
    file_paths: &'a [String],
    target_ip: &'a str,
    owner_uid: UserId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AcceptFileArgs<'a> {
    packet_no: &'a str,
    file_id: i64,
    offset: u64,
    target_ip: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RejectFileArgs<'a> {
    packet_no: &'a str,
    target_ip: &'a str,
}

#[derive(Serialize)]
struct FileIdArgs {
    fid: i64,
}

#[derive(Serialize)]
struct TransferIdArgs {
    tid: i64,
}

impl Gateway {
    /// Offer files to a peer. Returns the id the backend tracks the outbound
    /// transfer under.
    pub async fn send_file_request(
        &self,
        file_paths: &[String],
        peer_addr: &str,
        owner: UserId,
    ) -> Result<i64> {
        let args = SendFileArgs {
            file_paths,
            target_ip: peer_addr,
            owner_uid: owner,
        };
        self.call(commands::SEND_FILE_REQUEST, &args, self.write_options())
            .await
    }

    /// Accept an inbound offer, asking the peer to start at `offset` bytes.
    pub async fn accept_file_request(
        &self,
        request_id: &str,
        file_id: i64,
        offset: u64,
        peer_addr: &str,
    ) -> Result<()> {
        let args = AcceptFileArgs {
            packet_no: request_id,
            file_id,
            offset,
            target_ip: peer_addr,
        };
        self.call_unit(commands::ACCEPT_FILE_REQUEST, &args, self.write_options())
            .await
    }

    pub async fn reject_file_request(&self, request_id: &str, peer_addr: &str) -> Result<()> {
        let args = RejectFileArgs {
            packet_no: request_id,
            target_ip: peer_addr,
        };
        self.call_unit(commands::REJECT_FILE_REQUEST, &args, self.write_options())
            .await
    }

    pub async fn cancel_transfer(&self, file_id: i64) -> Result<()> {
        self.call_unit(
            commands::CANCEL_TRANSFER,
            &FileIdArgs { fid: file_id },
            self.write_options(),
        )
        .await
    }

    /// Transfers interrupted in a previous run that can be resumed.
    pub async fn get_pending_transfers(&self) -> Result<Vec<PendingTransferDto>> {
        self.call(
            commands::GET_PENDING_TRANSFERS,
            &Value::Null,
            self.read_options(),
        )
        .await
    }

    pub async fn resume_transfer(&self, transfer_id: i64) -> Result<()> {
        self.call_unit(
            commands::RESUME_TRANSFER,
            &TransferIdArgs { tid: transfer_id },
            self.write_options(),
        )
        .await
    }
}
