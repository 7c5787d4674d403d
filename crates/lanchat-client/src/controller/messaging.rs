use chrono::Utc;
use tracing::{debug, info, warn};

use lanchat_shared::constants::FILE_MESSAGE_PREFIX;
use lanchat_shared::types::{MessageStatus, SessionKey, UserId};
use lanchat_store::{MessageBody, MessageId, StoreError, Transition};

use super::ChatClient;
use crate::error::{ClientError, Result};

impl ChatClient {
    /// Send a text message.
    ///
    /// The message is listed right away as `sending` under a placeholder id.
    /// On success it is re-keyed to the server id and marked `sent`; on
    /// failure it stays listed as `failed` for a manual retry and the error
    /// is returned.
    pub async fn send_message(&self, key: SessionKey, content: &str) -> Result<MessageId> {
        let owner = self.owner()?;
        let body = MessageBody::Text(content.to_string());
        let preview = body.preview();

        let local = self.with_state(|s| {
            let id = s.messages.append_pending(key, owner, body);
            if let Err(e) = s.sessions.note_outgoing(&key, preview, Utc::now()) {
                debug!(session = %key, error = %e, "Outgoing message for unlisted session");
            }
            id
        })?;
        self.emit_messages_changed(key);

        self.deliver(key, local, content, owner).await
    }

    /// Announce a file in the conversation as a `[File] <name>` text message.
    pub async fn send_file_message(&self, key: SessionKey, file_name: &str) -> Result<MessageId> {
        self.send_message(key, &format!("{FILE_MESSAGE_PREFIX} {file_name}"))
            .await
    }

    /// Re-send a failed message. Resolves to `sent` or back to `failed`,
    /// never leaving it `sending`. A message that is not failed is left
    /// alone.
    pub async fn retry_message(&self, id: MessageId) -> Result<MessageId> {
        let owner = self.owner()?;

        let (key, content, transition) = self.with_state(|s| -> Result<_> {
            let message = s
                .messages
                .find(id)
                .ok_or(StoreError::UnknownMessage(id))?;
            let key = message.session;
            let content = message.body.text().map(str::to_owned);
            if id.is_local() && content.is_none() {
                return Err(ClientError::NotResendable(id));
            }
            let transition = s.messages.set_status(id, MessageStatus::Sending)?;
            Ok((key, content, transition))
        })??;

        if !transition.changes_status() {
            debug!(msg_id = %id, "Message not in a retryable state");
            return Ok(id);
        }
        self.emit_messages_changed(key);
        info!(msg_id = %id, session = %key, "Retrying message");

        match id {
            // Never reached the backend: send it again.
            MessageId::Local(_) => {
                let content = content.unwrap_or_default();
                self.deliver(key, id, &content, owner).await
            }
            MessageId::Server(mid) => {
                let outcome = self.gateway.retry_send_message(mid, key, owner).await;
                let status = if outcome.is_ok() {
                    MessageStatus::Sent
                } else {
                    MessageStatus::Failed
                };
                self.settle(key, id, status)?;
                outcome?;
                Ok(id)
            }
        }
    }

    /// Apply a status to a message wherever it is listed. Disallowed
    /// transitions are logged and reported, not applied.
    pub fn update_message_status(&self, id: MessageId, status: MessageStatus) -> Result<Transition> {
        let (key, transition) = self.with_state(|s| {
            let transition = s.messages.set_status(id, status)?;
            let key = s.messages.find(id).map(|m| m.session);
            Ok::<_, StoreError>((key, transition))
        })??;

        if let (Some(key), true) = (key, transition.changes_status()) {
            self.emit_messages_changed(key);
        }
        Ok(transition)
    }

    /// Issue the send for placeholder `local` and reconcile the outcome.
    async fn deliver(
        &self,
        key: SessionKey,
        local: MessageId,
        content: &str,
        owner: UserId,
    ) -> Result<MessageId> {
        match self.gateway.send_text_message(key, content, owner).await {
            Ok(server_id) => {
                let confirmed = self.with_state(|s| s.messages.confirm_sent(local, server_id))?;
                match confirmed {
                    Ok(Transition::Reconciled) => {
                        info!(msg_id = server_id, "Late send confirmation reconciled");
                    }
                    Ok(_) => info!(msg_id = server_id, session = %key, "Message sent"),
                    // The conversation was reset while the send was in flight.
                    Err(e) => debug!(msg_id = server_id, error = %e, "Sent message no longer cached"),
                }
                self.emit_messages_changed(key);
                Ok(MessageId::Server(server_id))
            }
            Err(e) => {
                warn!(msg_id = %local, session = %key, error = %e, "Message send failed");
                self.settle(key, local, MessageStatus::Failed)?;
                Err(e.into())
            }
        }
    }

    fn settle(&self, key: SessionKey, id: MessageId, status: MessageStatus) -> Result<()> {
        let applied = self.with_state(|s| s.messages.set_status(id, status))?;
        if let Err(e) = applied {
            debug!(msg_id = %id, error = %e, "Settled message no longer cached");
        }
        self.emit_messages_changed(key);
        Ok(())
    }
}
