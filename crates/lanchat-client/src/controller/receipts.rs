use tracing::{info, warn};

use lanchat_shared::types::MessageStatus;
use lanchat_store::{MessageId, StoreError};

use super::ChatClient;
use crate::error::Result;

impl ChatClient {
    /// Mark one message read and acknowledge it to its sender.
    ///
    /// Needs the message's sequence number and sender address; without them
    /// nothing is sent. Receipts are best-effort: a backend failure is logged
    /// and the local status left untouched. Returns whether the receipt went
    /// out.
    pub async fn mark_read(&self, id: MessageId) -> Result<bool> {
        let (key, receipt) = self.with_state(|s| {
            s.messages
                .find(id)
                .map(|m| (m.session, m.receipt.clone()))
                .ok_or(StoreError::UnknownMessage(id))
        })??;

        let (Some(mid), Some(receipt)) = (id.server_id(), receipt) else {
            warn!(msg_id = %id, "Message lacks sequence number or sender address, receipt not sent");
            return Ok(false);
        };

        if let Err(e) = self
            .gateway
            .mark_message_read_and_send_receipt(mid, &receipt.seq_no, &receipt.peer_addr)
            .await
        {
            warn!(msg_id = mid, peer = %receipt.peer_addr, error = %e, "Read receipt failed");
            return Ok(false);
        }

        let applied = self.with_state(|s| s.messages.set_status(id, MessageStatus::Read))?;
        match applied {
            Ok(t) if t.changes_status() => self.emit_messages_changed(key),
            Ok(_) => {}
            Err(e) => warn!(msg_id = mid, error = %e, "Receipt sent for message no longer cached"),
        }
        info!(msg_id = mid, peer = %receipt.peer_addr, "Read receipt sent");
        Ok(true)
    }
}
