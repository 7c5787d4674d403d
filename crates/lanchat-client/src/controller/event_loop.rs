use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use lanchat_shared::types::{MessageStatus, SessionKey};
use lanchat_store::{Message, MessageId, ProgressOutcome, ProgressUpdate, StoreError};

use super::ChatClient;
use crate::error::Result;
use crate::events::{BackendEvent, ViewEvent};

impl ChatClient {
    /// Apply backend events until the sender side is dropped.
    pub async fn run_event_loop(&self, mut rx: mpsc::Receiver<BackendEvent>) {
        info!("Backend event loop started");

        while let Some(event) = rx.recv().await {
            if let Err(e) = self.handle_event(event).await {
                warn!(error = %e, "Failed to apply backend event");
            }
        }

        warn!("Backend event loop ended");
    }

    /// Apply one backend event to the view state.
    pub async fn handle_event(&self, event: BackendEvent) -> Result<()> {
        match event {
            BackendEvent::MessageReceived(dto) => {
                let message = Message::from(dto);
                self.on_message_received(message).await?;
            }

            BackendEvent::MessageSent { mid } => {
                self.apply_remote_status(mid, MessageStatus::Sent)?;
            }

            BackendEvent::MessageSendFailed { mid, reason } => {
                warn!(msg_id = mid, reason = reason.as_deref().unwrap_or("unknown"), "Backend reported send failure");
                self.apply_remote_status(mid, MessageStatus::Failed)?;
            }

            BackendEvent::MessageStatusChanged { mid, status } => {
                self.apply_remote_status(mid, status)?;
            }

            BackendEvent::UnreadCountChanged {
                session_type,
                target_id,
                count,
            } => {
                let key = SessionKey::new(session_type, target_id);
                match self.with_state(|s| s.sessions.set_unread(&key, count))? {
                    Ok(true) => self.emit(ViewEvent::SessionsChanged),
                    Ok(false) => {}
                    Err(e) => debug!(session = %key, error = %e, "Unread count for unlisted session"),
                }
            }

            BackendEvent::FileOffered {
                file_id,
                request_id,
                file_name,
                file_size,
                peer_addr,
            } => {
                info!(file_id, name = %file_name, peer = %peer_addr, "File offered");
                self.register_offer(file_id, request_id, file_name, file_size, peer_addr)?;
            }

            BackendEvent::TransferProgress(progress) => {
                let file_id = progress.file_id;
                let outcome = self.with_state(|s| {
                    s.transfers
                        .apply_progress(file_id, ProgressUpdate::from(&progress))
                })?;
                match outcome {
                    ProgressOutcome::Updated => self.emit(ViewEvent::TransferChanged { file_id }),
                    ProgressOutcome::Ignored => {}
                    ProgressOutcome::Unknown => {
                        debug!(file_id, "Progress for untracked transfer");
                    }
                }
            }

            BackendEvent::TransferCompleted { file_id } => {
                if self.with_state(|s| s.transfers.complete(file_id))?? {
                    self.emit(ViewEvent::TransferChanged { file_id });
                }
            }

            BackendEvent::TransferFailed { file_id, reason } => {
                let reason = reason.as_deref().unwrap_or("unknown");
                if self.with_state(|s| s.transfers.fail(file_id, reason))?? {
                    self.emit(ViewEvent::TransferChanged { file_id });
                }
            }

            BackendEvent::UserOnline(user) => {
                debug!(uid = %user.uid, "User online");
                self.with_state(|s| s.roster.set_online(user))?;
                self.emit(ViewEvent::RosterChanged);
            }

            BackendEvent::UserOffline { uid } => {
                if self.with_state(|s| s.roster.set_offline(uid))? {
                    debug!(%uid, "User offline");
                    self.emit(ViewEvent::RosterChanged);
                }
            }
        }
        Ok(())
    }

    async fn on_message_received(&self, message: Message) -> Result<()> {
        let key = message.session;
        let mid = message.id.server_id();
        let preview = message.body.preview();
        let at = message.sent_at;

        let (added, noted) = self.with_state(|s| {
            let added = s.messages.push(message);
            let noted = if added {
                Some(s.sessions.note_incoming(&key, mid, preview, at))
            } else {
                None
            };
            (added, noted)
        })?;

        if !added {
            return Ok(());
        }
        self.emit_messages_changed(key);

        match noted {
            Some(Err(StoreError::UnknownSession(_))) => {
                // First message of a new conversation.
                debug!(session = %key, "Message for unlisted session, refreshing list");
                if let Err(e) = self.list_sessions().await {
                    warn!(session = %key, error = %e, "Session list refresh failed");
                }
            }
            Some(Err(e)) => warn!(session = %key, error = %e, "Session summary not updated"),
            Some(Ok(_)) => self.emit(ViewEvent::SessionsChanged),
            None => {}
        }
        Ok(())
    }

    fn apply_remote_status(&self, mid: i64, status: MessageStatus) -> Result<()> {
        match self.update_message_status(MessageId::Server(mid), status) {
            Err(crate::error::ClientError::Store(StoreError::UnknownMessage(_))) => {
                if status == MessageStatus::Sent {
                    // A send that timed out locally may still have gone through.
                    info!(msg_id = mid, "Send confirmed for a message not cached under its server id");
                } else {
                    debug!(msg_id = mid, %status, "Status for uncached message");
                }
                Ok(())
            }
            other => other.map(|_| ()),
        }
    }
}
