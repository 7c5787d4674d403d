use std::collections::HashMap;

use tracing::{debug, warn};

use lanchat_shared::types::{MessageStatus, SessionKey, UserId};

use crate::error::{Result, StoreError};
use crate::models::{Message, MessageBody, MessageId};
use crate::status::{check_transition, Transition};

/// Per-conversation message lists in append order.
///
/// Message ids are globally unique, so lookups by id scan every
/// conversation rather than a single one.
#[derive(Debug, Default)]
pub struct MessageStore {
    conversations: HashMap<SessionKey, Vec<Message>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages of one conversation, empty when nothing is cached.
    pub fn messages(&self, key: &SessionKey) -> &[Message] {
        self.conversations
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self, key: &SessionKey) -> usize {
        self.messages(key).len()
    }

    pub fn is_empty(&self, key: &SessionKey) -> bool {
        self.messages(key).is_empty()
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.locate(id).is_some()
    }

    pub fn find(&self, id: MessageId) -> Option<&Message> {
        self.locate(id)
            .map(|(key, idx)| &self.conversations[&key][idx])
    }

    /// Append a message unless its id is already cached. Returns whether it
    /// was added.
    pub fn push(&mut self, message: Message) -> bool {
        if self.contains(message.id) {
            debug!(msg_id = %message.id, "Duplicate message ignored");
            return false;
        }
        self.conversations
            .entry(message.session)
            .or_default()
            .push(message);
        true
    }

    /// Append an optimistic outbound message and return its placeholder id.
    pub fn append_pending(
        &mut self,
        session: SessionKey,
        sender: UserId,
        body: MessageBody,
    ) -> MessageId {
        let message = Message::pending(session, sender, body);
        let id = message.id;
        self.conversations.entry(session).or_default().push(message);
        id
    }

    /// Merge a fetched history page into a conversation.
    ///
    /// A fetched message whose id is already cached is dropped; the local
    /// copy is kept. Returns the number of messages added.
    pub fn merge_history(&mut self, key: SessionKey, fetched: Vec<Message>) -> usize {
        let list = self.conversations.entry(key).or_default();
        let mut added = 0;

        for message in fetched {
            if list.iter().any(|m| m.id == message.id) {
                continue;
            }
            list.push(message);
            added += 1;
        }

        debug!(session = %key, added, total = list.len(), "History merged");
        added
    }

    /// Apply a status change to the message with this id, wherever it is.
    ///
    /// Transitions outside the status table are logged and skipped; only an
    /// unknown id is an error.
    pub fn set_status(&mut self, id: MessageId, status: MessageStatus) -> Result<Transition> {
        let message = self.get_mut(id).ok_or(StoreError::UnknownMessage(id))?;
        Ok(apply_status(message, status))
    }

    /// Record a successful send for the placeholder `local`.
    ///
    /// The placeholder takes the server id. If a message with that server id
    /// is already cached (it arrived through history or an event first), the
    /// placeholder is dropped and the cached entry is marked sent instead.
    pub fn confirm_sent(&mut self, local: MessageId, server_id: i64) -> Result<Transition> {
        let server = MessageId::Server(server_id);
        let (key, idx) = self.locate(local).ok_or(StoreError::UnknownMessage(local))?;

        if local != server && self.contains(server) {
            if let Some(list) = self.conversations.get_mut(&key) {
                list.remove(idx);
            }
            debug!(%local, %server, "Placeholder superseded by cached message");
            return self.set_status(server, MessageStatus::Sent);
        }

        let message = &mut self
            .conversations
            .get_mut(&key)
            .ok_or(StoreError::UnknownMessage(local))?[idx];
        message.id = server;
        Ok(apply_status(message, MessageStatus::Sent))
    }

    /// Drop every cached message of a conversation.
    pub fn clear(&mut self, key: &SessionKey) {
        self.conversations.remove(key);
    }

    fn get_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.conversations
            .values_mut()
            .flat_map(|list| list.iter_mut())
            .find(|m| m.id == id)
    }

    fn locate(&self, id: MessageId) -> Option<(SessionKey, usize)> {
        self.conversations.iter().find_map(|(key, list)| {
            list.iter()
                .position(|m| m.id == id)
                .map(|idx| (*key, idx))
        })
    }
}

fn apply_status(message: &mut Message, status: MessageStatus) -> Transition {
    let transition = check_transition(message.status, status);
    match transition {
        Transition::Applied => message.status = status,
        Transition::Reconciled => {
            debug!(msg_id = %message.id, from = %message.status, to = %status, "Late status reconciled");
            message.status = status;
        }
        Transition::Rejected => {
            warn!(msg_id = %message.id, from = %message.status, to = %status, "Status transition rejected");
        }
        Transition::Unchanged => {}
    }
    transition
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn key() -> SessionKey {
        SessionKey::direct(UserId(42))
    }

    fn server_message(id: i64, text: &str) -> Message {
        Message {
            id: MessageId::Server(id),
            session: key(),
            sender: UserId(42),
            body: MessageBody::Text(text.into()),
            sent_at: Utc::now(),
            status: MessageStatus::Sent,
            receipt: None,
            revoked: false,
        }
    }

    fn text(s: &str) -> MessageBody {
        MessageBody::Text(s.into())
    }

    #[test]
    fn test_overlapping_history_has_no_duplicates() {
        let mut store = MessageStore::new();
        let first: Vec<_> = (1..=5).map(|i| server_message(i, "a")).collect();
        let second: Vec<_> = (4..=8).map(|i| server_message(i, "b")).collect();

        assert_eq!(store.merge_history(key(), first), 5);
        assert_eq!(store.merge_history(key(), second), 3);

        let ids: Vec<_> = store.messages(&key()).iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), 8);
        let mut unique = ids.clone();
        unique.sort_by_key(|id| id.server_id());
        unique.dedup();
        assert_eq!(unique.len(), 8);
    }

    #[test]
    fn test_merge_keeps_local_copy() {
        let mut store = MessageStore::new();
        store.push(server_message(1, "local"));
        store.merge_history(key(), vec![server_message(1, "remote")]);

        let msg = store.find(MessageId::Server(1)).unwrap();
        assert_eq!(msg.body, text("local"));
    }

    #[test]
    fn test_pending_then_confirm() {
        let mut store = MessageStore::new();
        let local = store.append_pending(key(), UserId(1), text("Hello"));

        let t = store.confirm_sent(local, 789).unwrap();
        assert_eq!(t, Transition::Applied);
        assert!(!store.contains(local));

        let msgs = store.messages(&key());
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].id, MessageId::Server(789));
        assert_eq!(msgs[0].status, MessageStatus::Sent);
    }

    #[test]
    fn test_confirm_after_history_arrival_drops_placeholder() {
        let mut store = MessageStore::new();
        let local = store.append_pending(key(), UserId(1), text("Hello"));
        let mut echoed = server_message(789, "Hello");
        echoed.status = MessageStatus::Sending;
        store.merge_history(key(), vec![echoed]);
        assert_eq!(store.len(&key()), 2);

        store.confirm_sent(local, 789).unwrap();
        let msgs = store.messages(&key());
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].status, MessageStatus::Sent);
    }

    #[test]
    fn test_late_success_after_failure() {
        let mut store = MessageStore::new();
        let local = store.append_pending(key(), UserId(1), text("Hello"));
        store.set_status(local, MessageStatus::Failed).unwrap();

        let t = store.confirm_sent(local, 5).unwrap();
        assert_eq!(t, Transition::Reconciled);
        assert_eq!(
            store.find(MessageId::Server(5)).unwrap().status,
            MessageStatus::Sent
        );
    }

    #[test]
    fn test_set_status_searches_all_sessions() {
        let mut store = MessageStore::new();
        let other = SessionKey::direct(UserId(7));
        let mut msg = server_message(3, "x");
        msg.session = other;
        store.push(msg);

        store.set_status(MessageId::Server(3), MessageStatus::Read).unwrap();
        assert_eq!(store.messages(&other)[0].status, MessageStatus::Read);
    }

    #[test]
    fn test_rejected_transition_keeps_status() {
        let mut store = MessageStore::new();
        let mut msg = server_message(3, "x");
        msg.status = MessageStatus::Read;
        store.push(msg);

        let t = store.set_status(MessageId::Server(3), MessageStatus::Sent).unwrap();
        assert_eq!(t, Transition::Rejected);
        assert_eq!(
            store.find(MessageId::Server(3)).unwrap().status,
            MessageStatus::Read
        );
    }

    #[test]
    fn test_unknown_message_is_error() {
        let mut store = MessageStore::new();
        let id = MessageId::Server(99);
        assert_eq!(
            store.set_status(id, MessageStatus::Sent),
            Err(StoreError::UnknownMessage(id))
        );
    }

    #[test]
    fn test_clear_conversation() {
        let mut store = MessageStore::new();
        store.push(server_message(1, "a"));
        store.clear(&key());
        assert!(store.is_empty(&key()));
    }
}
