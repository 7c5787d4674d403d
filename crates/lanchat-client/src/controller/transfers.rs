use std::path::Path;

use tracing::{debug, error, info, warn};

use lanchat_shared::types::TransferDirection;
use lanchat_store::{ProgressUpdate, StoreError, Transfer};

use super::ChatClient;
use crate::error::{ClientError, Result};
use crate::events::ViewEvent;

impl ChatClient {
    /// Offer files to a peer. The outbound transfer is tracked under the
    /// returned file id and named after the first path.
    pub async fn send_file(&self, file_paths: &[String], peer_addr: &str) -> Result<i64> {
        let owner = self.owner()?;
        let file_id = self
            .gateway
            .send_file_request(file_paths, peer_addr, owner)
            .await?;

        let first = file_paths.first().map(String::as_str).unwrap_or_default();
        let mut transfer = Transfer::new(
            file_id,
            display_name(first),
            0,
            TransferDirection::Upload,
            peer_addr,
        );
        transfer.local_path = file_paths.first().cloned();

        self.with_state(|s| s.transfers.register(transfer))?;
        info!(file_id, files = file_paths.len(), peer = %peer_addr, "File offer sent");
        self.emit(ViewEvent::TransferChanged { file_id });
        Ok(file_id)
    }

    /// Track an inbound offer until it is accepted or rejected.
    pub fn register_offer(
        &self,
        file_id: i64,
        request_id: String,
        file_name: String,
        file_size: u64,
        peer_addr: String,
    ) -> Result<()> {
        let mut transfer = Transfer::new(
            file_id,
            file_name,
            file_size,
            TransferDirection::Download,
            peer_addr,
        );
        transfer.request_id = Some(request_id);

        if self.with_state(|s| s.transfers.register(transfer))? {
            self.emit(ViewEvent::TransferChanged { file_id });
        }
        Ok(())
    }

    /// Accept an inbound offer, asking the peer to start at `offset` bytes
    /// (0 for a fresh download). A backend failure marks the transfer failed.
    pub async fn accept_file(&self, file_id: i64, offset: u64) -> Result<()> {
        let (request_id, peer_addr) = self.offer_of(file_id)?;

        if let Err(e) = self
            .gateway
            .accept_file_request(&request_id, file_id, offset, &peer_addr)
            .await
        {
            self.fail_transfer(file_id, &e.to_string())?;
            return Err(e.into());
        }

        self.with_state(|s| {
            s.transfers.start(file_id)?;
            s.transfers.apply_progress(
                file_id,
                ProgressUpdate {
                    transferred: Some(offset),
                    ..Default::default()
                },
            );
            Ok::<_, StoreError>(())
        })??;
        info!(file_id, offset, "File offer accepted");
        self.emit(ViewEvent::TransferChanged { file_id });
        Ok(())
    }

    /// Decline an inbound offer. The transfer ends as cancelled.
    pub async fn reject_file(&self, file_id: i64) -> Result<()> {
        let (request_id, peer_addr) = self.offer_of(file_id)?;
        self.gateway
            .reject_file_request(&request_id, &peer_addr)
            .await?;

        self.with_state(|s| s.transfers.cancel(file_id))??;
        info!(file_id, "File offer rejected");
        self.emit(ViewEvent::TransferChanged { file_id });
        Ok(())
    }

    /// Cancel a transfer.
    ///
    /// The cancellation is recorded locally first and is final: progress
    /// arriving afterwards is ignored even if the backend call fails.
    pub async fn cancel_transfer(&self, file_id: i64) -> Result<()> {
        let changed = self.with_state(|s| s.transfers.cancel(file_id))??;
        if !changed {
            debug!(file_id, "Transfer already cancelled");
            return Ok(());
        }
        self.emit(ViewEvent::TransferChanged { file_id });

        if let Err(e) = self.gateway.cancel_transfer(file_id).await {
            error!(file_id, error = %e, "Backend cancel failed, transfer stays cancelled locally");
            return Err(e.into());
        }
        Ok(())
    }

    /// Fetch transfers interrupted in a previous run and track them.
    pub async fn load_pending_transfers(&self) -> Result<Vec<Transfer>> {
        let pending = self.gateway.get_pending_transfers().await?;
        let count = pending.len();

        let transfers = self.with_state(|s| {
            pending
                .into_iter()
                .map(Transfer::from)
                .filter_map(|t| {
                    let file_id = t.file_id;
                    s.transfers.register(t);
                    s.transfers.get(file_id).cloned()
                })
                .collect::<Vec<_>>()
        })?;

        debug!(count, "Pending transfers loaded");
        for t in &transfers {
            self.emit(ViewEvent::TransferChanged { file_id: t.file_id });
        }
        Ok(transfers)
    }

    /// Resume a transfer loaded from the pending list.
    pub async fn resume_transfer(&self, file_id: i64) -> Result<()> {
        let transfer_id = self
            .with_state(|s| -> Result<i64> {
                let t = s
                    .transfers
                    .get(file_id)
                    .ok_or(StoreError::UnknownTransfer(file_id))?;
                if !t.is_active() {
                    return Err(StoreError::TransferFinished {
                        file_id,
                        status: t.status,
                    }
                    .into());
                }
                t.transfer_id.ok_or(ClientError::NotResumable(file_id))
            })??;

        if let Err(e) = self.gateway.resume_transfer(transfer_id).await {
            self.fail_transfer(file_id, &e.to_string())?;
            return Err(e.into());
        }

        self.with_state(|s| s.transfers.start(file_id))??;
        info!(file_id, transfer_id, "Transfer resumed");
        self.emit(ViewEvent::TransferChanged { file_id });
        Ok(())
    }

    pub fn transfers(&self) -> Result<Vec<Transfer>> {
        self.with_state(|s| s.transfers.transfers().to_vec())
    }

    pub fn transfer(&self, file_id: i64) -> Result<Option<Transfer>> {
        self.with_state(|s| s.transfers.get(file_id).cloned())
    }

    fn offer_of(&self, file_id: i64) -> Result<(String, String)> {
        self.with_state(|s| -> Result<(String, String)> {
            let t = s
                .transfers
                .get(file_id)
                .ok_or(StoreError::UnknownTransfer(file_id))?;
            if !t.is_active() {
                return Err(StoreError::TransferFinished {
                    file_id,
                    status: t.status,
                }
                .into());
            }
            match (&t.request_id, t.direction) {
                (Some(request_id), TransferDirection::Download) => {
                    Ok((request_id.clone(), t.peer_addr.clone()))
                }
                _ => Err(ClientError::NotAnOffer(file_id)),
            }
        })?
    }

    fn fail_transfer(&self, file_id: i64, reason: &str) -> Result<()> {
        match self.with_state(|s| s.transfers.fail(file_id, reason))? {
            Ok(true) => self.emit(ViewEvent::TransferChanged { file_id }),
            Ok(false) => {}
            Err(e) => warn!(file_id, error = %e, "Failed transfer no longer tracked"),
        }
        Ok(())
    }
}

fn display_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use lanchat_bridge::testing::Scripted;
    use lanchat_shared::protocol::commands;

    use lanchat_shared::types::TransferStatus;

    use super::super::test_support::client;
    use super::*;

    fn offer(client: &ChatClient, file_id: i64) {
        client
            .register_offer(
                file_id,
                "1700000042".into(),
                "photo.jpg".into(),
                2048,
                "192.168.1.42".into(),
            )
            .unwrap();
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("/home/u/docs/report.pdf"), "report.pdf");
        assert_eq!(display_name(""), "unknown");
    }

    #[tokio::test]
    async fn test_send_file_registers_upload() {
        let (client, backend) = client();
        backend.push(commands::SEND_FILE_REQUEST, Scripted::Reply(json!(55)));

        let paths = vec!["/tmp/a.zip".to_string(), "/tmp/b.zip".to_string()];
        let file_id = client.send_file(&paths, "192.168.1.9").await.unwrap();
        assert_eq!(file_id, 55);

        let t = client.transfer(55).unwrap().unwrap();
        assert_eq!(t.file_name, "a.zip");
        assert_eq!(t.direction, TransferDirection::Upload);
        assert_eq!(t.status, TransferStatus::Pending);

        let call = &backend.calls_to(commands::SEND_FILE_REQUEST)[0];
        assert_eq!(call.args["filePaths"], json!(paths));
        assert_eq!(call.args["targetIp"], "192.168.1.9");
    }

    #[tokio::test]
    async fn test_upload_progress_before_total_is_kept() {
        let (client, backend) = client();
        backend.push(commands::SEND_FILE_REQUEST, Scripted::Reply(json!(7)));
        let file_id = client
            .send_file(&["/tmp/big.iso".to_string()], "192.168.1.9")
            .await
            .unwrap();

        client
            .handle_event(crate::events::BackendEvent::TransferProgress(
                lanchat_shared::protocol::TransferProgressDto {
                    file_id,
                    transferred: Some(4096),
                    total: None,
                    speed: Some(1024.0),
                },
            ))
            .await
            .unwrap();

        let t = client.transfer(file_id).unwrap().unwrap();
        assert_eq!(t.transferred, 4096);
        assert_eq!(t.status, TransferStatus::Transferring);
    }

    #[tokio::test]
    async fn test_accept_file_with_offset() {
        let (client, backend) = client();
        backend.push(commands::ACCEPT_FILE_REQUEST, Scripted::Reply(json!(null)));
        offer(&client, 7);

        client.accept_file(7, 1024).await.unwrap();
        let t = client.transfer(7).unwrap().unwrap();
        assert_eq!(t.status, TransferStatus::Transferring);
        assert_eq!(t.transferred, 1024);
        assert_eq!(t.percent(), 50);

        let call = &backend.calls_to(commands::ACCEPT_FILE_REQUEST)[0];
        assert_eq!(call.args["packetNo"], "1700000042");
        assert_eq!(call.args["offset"], 1024);
    }

    #[tokio::test]
    async fn test_accept_failure_marks_failed() {
        let (client, backend) = client();
        backend.push(commands::ACCEPT_FILE_REQUEST, Scripted::Transport("gone".into()));
        offer(&client, 7);

        assert!(client.accept_file(7, 0).await.is_err());
        assert_eq!(client.transfer(7).unwrap().unwrap().status, TransferStatus::Failed);
    }

    #[tokio::test]
    async fn test_accept_upload_is_not_an_offer() {
        let (client, backend) = client();
        backend.push(commands::SEND_FILE_REQUEST, Scripted::Reply(json!(3)));
        client.send_file(&["/tmp/x".to_string()], "10.0.0.1").await.unwrap();

        assert!(matches!(
            client.accept_file(3, 0).await,
            Err(ClientError::NotAnOffer(3))
        ));
        assert_eq!(backend.call_count(commands::ACCEPT_FILE_REQUEST), 0);
    }

    #[tokio::test]
    async fn test_reject_file() {
        let (client, backend) = client();
        backend.push(commands::REJECT_FILE_REQUEST, Scripted::Reply(json!(null)));
        offer(&client, 7);

        client.reject_file(7).await.unwrap();
        assert_eq!(client.transfer(7).unwrap().unwrap().status, TransferStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_survives_backend_failure() {
        let (client, backend) = client();
        backend.push(commands::CANCEL_TRANSFER, Scripted::Reject(json!("busy")));
        offer(&client, 7);

        assert!(client.cancel_transfer(7).await.is_err());
        assert_eq!(client.transfer(7).unwrap().unwrap().status, TransferStatus::Cancelled);

        // A second cancel is a local no-op.
        client.cancel_transfer(7).await.unwrap();
        assert_eq!(backend.call_count(commands::CANCEL_TRANSFER), 1);
    }

    #[tokio::test]
    async fn test_pending_transfers_and_resume() {
        let (client, backend) = client();
        backend.push(
            commands::GET_PENDING_TRANSFERS,
            Scripted::Reply(json!([{
                "tid": 4,
                "file_id": 40,
                "file_name": "iso.img",
                "file_path": "/tmp/iso.img",
                "transferred": 300,
                "file_size": 1000,
                "status": 1,
                "target_ip": "10.0.0.3",
                "direction": 0
            }])),
        );
        backend.push(commands::RESUME_TRANSFER, Scripted::Reply(json!(null)));

        let pending = client.load_pending_transfers().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].percent(), 30);

        client.resume_transfer(40).await.unwrap();
        assert_eq!(backend.calls_to(commands::RESUME_TRANSFER)[0].args["tid"], 4);
        assert_eq!(
            client.transfer(40).unwrap().unwrap().status,
            TransferStatus::Transferring
        );
    }

    #[tokio::test]
    async fn test_resume_requires_record() {
        let (client, _backend) = client();
        offer(&client, 7);
        assert!(matches!(
            client.resume_transfer(7).await,
            Err(ClientError::NotResumable(7))
        ));
    }
}
