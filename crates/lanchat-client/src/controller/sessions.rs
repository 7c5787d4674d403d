use tracing::{debug, error, info, warn};

use lanchat_shared::types::SessionKey;
use lanchat_store::{Cursor, FetchTicket, Message, Session};

use super::ChatClient;
use crate::error::Result;
use crate::events::ViewEvent;

impl ChatClient {
    /// Fetch the session list and replace the cached one. On failure the
    /// previous list is kept.
    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        let owner = self.owner()?;

        let fetched = match self.gateway.get_session_list(owner).await {
            Ok(list) => list,
            Err(e) => {
                error!(error = %e, "Failed to load session list");
                return Err(e.into());
            }
        };

        let sessions = self.with_state(|s| {
            s.sessions
                .replace(fetched.into_iter().map(Session::from).collect());
            s.sessions.sessions().to_vec()
        })?;

        debug!(count = sessions.len(), "Session list loaded");
        self.emit(ViewEvent::SessionsChanged);
        Ok(sessions)
    }

    pub fn sessions(&self) -> Result<Vec<Session>> {
        self.with_state(|s| s.sessions.sessions().to_vec())
    }

    pub fn session(&self, key: &SessionKey) -> Result<Option<Session>> {
        self.with_state(|s| s.sessions.get(key).cloned())
    }

    pub fn current_session(&self) -> Result<Option<SessionKey>> {
        self.with_state(|s| s.sessions.current().copied())
    }

    /// Make `key` the current conversation.
    ///
    /// Its unread counter drops to zero right away and is not restored if the
    /// backend mark-read call fails. The first history page is then loaded.
    pub async fn select_session(&self, key: SessionKey) -> Result<Vec<Message>> {
        let previous_unread = self.with_state(|s| s.sessions.select(key))?;
        self.emit(ViewEvent::SessionsChanged);
        info!(session = %key, previous_unread, "Session selected");

        if previous_unread > 0 {
            self.notify_read(key).await;
        }

        self.load_history(key, 1).await?;
        self.messages(&key)
    }

    /// Mark every message of a conversation read on the backend, then clear
    /// its unread counter.
    pub async fn mark_session_read(&self, key: SessionKey) -> Result<()> {
        let owner = self.owner()?;
        self.gateway.mark_messages_read(key, owner).await?;

        let cleared = self.with_state(|s| s.sessions.clear_unread(&key))?;
        if let Err(e) = cleared {
            debug!(session = %key, error = %e, "Marked read for unlisted session");
        }
        self.emit(ViewEvent::SessionsChanged);
        Ok(())
    }

    /// Load one history page. Returns the number of new messages, or 0
    /// without calling the backend when a fetch for this conversation is
    /// already in flight.
    pub async fn load_history(&self, key: SessionKey, page: u32) -> Result<usize> {
        let Some(ticket) = self.with_state(|s| s.pagination.begin_page(key, page))? else {
            return Ok(0);
        };
        self.fetch_page(key, ticket).await
    }

    /// Load the next history page. A no-op without backend call when the
    /// history is exhausted or a fetch is in flight.
    pub async fn load_more(&self, key: SessionKey) -> Result<usize> {
        let Some(ticket) = self.with_state(|s| s.pagination.begin_next(key))? else {
            debug!(session = %key, "Nothing more to load");
            return Ok(0);
        };
        self.fetch_page(key, ticket).await
    }

    /// Drop the cursor and every cached message of a conversation. A history
    /// page still in flight is discarded when it lands.
    pub fn reset_conversation(&self, key: &SessionKey) -> Result<()> {
        self.with_state(|s| {
            s.pagination.reset(key);
            s.messages.clear(key);
        })?;
        self.emit_messages_changed(*key);
        Ok(())
    }

    pub fn messages(&self, key: &SessionKey) -> Result<Vec<Message>> {
        self.with_state(|s| s.messages.messages(key).to_vec())
    }

    pub fn cursor(&self, key: &SessionKey) -> Result<Cursor> {
        self.with_state(|s| s.pagination.cursor(key))
    }

    /// Fetch the page of `ticket`, which holds the conversation's cursor.
    async fn fetch_page(&self, key: SessionKey, ticket: FetchTicket) -> Result<usize> {
        let page = ticket.page;
        let page_size = self.with_state(|s| s.pagination.page_size())?;

        let fetched = match self.gateway.get_history(key, page, page_size).await {
            Ok(list) => list,
            Err(e) => {
                self.with_state(|s| s.pagination.abort(key, ticket))?;
                error!(session = %key, page, error = %e, "Failed to load history");
                return Err(e.into());
            }
        };

        let count = fetched.len();
        let added = self.with_state(|s| {
            if !s.pagination.complete(key, ticket, count) {
                return None;
            }
            let messages = fetched.into_iter().map(Message::from).collect();
            Some(s.messages.merge_history(key, messages))
        })?;

        match added {
            Some(added) => {
                self.emit_messages_changed(key);
                Ok(added)
            }
            None => Ok(0),
        }
    }

    /// Best-effort backend mark-read for a selected session.
    async fn notify_read(&self, key: SessionKey) {
        let owner = match self.owner() {
            Ok(owner) => owner,
            Err(e) => {
                warn!(session = %key, error = %e, "Cannot mark session read");
                return;
            }
        };
        if let Err(e) = self.gateway.mark_messages_read(key, owner).await {
            warn!(session = %key, error = %e, "Failed to mark session read");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use lanchat_bridge::testing::Scripted;
    use lanchat_shared::protocol::commands;
    use lanchat_shared::types::UserId;

    use super::super::test_support::client;
    use super::*;

    fn history(ids: std::ops::RangeInclusive<i64>, peer: i64) -> serde_json::Value {
        let items: Vec<_> = ids
            .map(|mid| {
                json!({
                    "mid": mid,
                    "session_type": 0,
                    "target_id": peer,
                    "sender_uid": peer,
                    "msg_type": 0,
                    "content": format!("m{mid}"),
                    "send_time": Utc::now(),
                    "status": 1
                })
            })
            .collect();
        json!(items)
    }

    fn session_list(unread: u32) -> serde_json::Value {
        json!([{
            "sid": 1,
            "owner_uid": 1,
            "session_type": 0,
            "target_id": 42,
            "unread_count": unread,
            "update_time": Utc::now()
        }])
    }

    #[tokio::test]
    async fn test_list_sessions_failure_keeps_previous() {
        let (client, backend) = client();
        backend.push(commands::GET_SESSION_LIST, Scripted::Reply(session_list(2)));
        backend.push(commands::GET_SESSION_LIST, Scripted::Reject(json!("db locked")));

        assert_eq!(client.list_sessions().await.unwrap().len(), 1);
        assert!(client.list_sessions().await.is_err());
        assert_eq!(client.sessions().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_select_session_clears_unread_and_loads() {
        let (client, backend) = client();
        let key = SessionKey::direct(UserId(42));
        backend.push(commands::GET_SESSION_LIST, Scripted::Reply(session_list(3)));
        backend.push(commands::MARK_MESSAGES_READ, Scripted::Reject(json!("offline")));
        backend.push(commands::GET_CHAT_HISTORY, Scripted::Reply(history(1..=3, 42)));
        client.list_sessions().await.unwrap();

        let messages = client.select_session(key).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(client.session(&key).unwrap().unwrap().unread, 0);
        assert_eq!(client.current_session().unwrap(), Some(key));
        assert_eq!(backend.call_count(commands::MARK_MESSAGES_READ), 1);
    }

    #[tokio::test]
    async fn test_select_without_unread_skips_mark_read() {
        let (client, backend) = client();
        let key = SessionKey::direct(UserId(42));
        backend.push(commands::GET_SESSION_LIST, Scripted::Reply(session_list(0)));
        backend.push(commands::GET_CHAT_HISTORY, Scripted::Reply(history(1..=1, 42)));
        client.list_sessions().await.unwrap();

        client.select_session(key).await.unwrap();
        assert_eq!(backend.call_count(commands::MARK_MESSAGES_READ), 0);
    }

    #[tokio::test]
    async fn test_history_failure_allows_retry() {
        let (client, backend) = client();
        let key = SessionKey::direct(UserId(42));
        backend.push(commands::GET_CHAT_HISTORY, Scripted::Reject(json!("boom")));
        backend.push(commands::GET_CHAT_HISTORY, Scripted::Reply(history(1..=2, 42)));

        assert!(client.load_more(key).await.is_err());
        assert!(!client.cursor(&key).unwrap().is_loading);
        assert_eq!(client.load_more(key).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_history_fetch_is_single() {
        let (client, backend) = client();
        let key = SessionKey::direct(UserId(42));
        backend.push(
            commands::GET_CHAT_HISTORY,
            Scripted::delayed(
                std::time::Duration::from_millis(20),
                Scripted::Reply(history(1..=2, 42)),
            ),
        );

        let (a, b) = tokio::join!(client.load_history(key, 1), client.load_history(key, 1));
        assert_eq!(a.unwrap() + b.unwrap(), 2);
        assert_eq!(backend.call_count(commands::GET_CHAT_HISTORY), 1);
    }

    #[tokio::test]
    async fn test_reset_conversation() {
        let (client, backend) = client();
        let key = SessionKey::direct(UserId(42));
        backend.push(commands::GET_CHAT_HISTORY, Scripted::Reply(history(1..=2, 42)));
        client.load_more(key).await.unwrap();
        assert!(!client.cursor(&key).unwrap().has_more);

        client.reset_conversation(&key).unwrap();
        assert!(client.messages(&key).unwrap().is_empty());
        assert_eq!(client.cursor(&key).unwrap(), Cursor::default());
    }

    #[tokio::test]
    async fn test_reset_during_fetch_discards_stale_page() {
        let (client, backend) = client();
        let key = SessionKey::direct(UserId(42));
        backend.push(
            commands::GET_CHAT_HISTORY,
            Scripted::delayed(
                std::time::Duration::from_millis(30),
                Scripted::Reply(history(1..=2, 42)),
            ),
        );

        let worker = client.clone();
        let stale = tokio::spawn(async move { worker.load_more(key).await });
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        client.reset_conversation(&key).unwrap();
        assert_eq!(client.load_more(key).await.unwrap(), 0);
        assert_eq!(stale.await.unwrap().unwrap(), 0);

        assert_eq!(backend.call_count(commands::GET_CHAT_HISTORY), 1);
        assert!(client.messages(&key).unwrap().is_empty());
        assert_eq!(client.cursor(&key).unwrap(), Cursor::default());

        backend.push(commands::GET_CHAT_HISTORY, Scripted::Reply(history(5..=6, 42)));
        assert_eq!(client.load_more(key).await.unwrap(), 2);
        assert_eq!(backend.calls_to(commands::GET_CHAT_HISTORY)[1].args["page"], 1);
    }

    #[tokio::test]
    async fn test_mark_session_read() {
        let (client, backend) = client();
        let key = SessionKey::direct(UserId(42));
        backend.push(commands::GET_SESSION_LIST, Scripted::Reply(session_list(5)));
        backend.push(commands::MARK_MESSAGES_READ, Scripted::Reply(json!(null)));
        client.list_sessions().await.unwrap();

        client.mark_session_read(key).await.unwrap();
        assert_eq!(client.session(&key).unwrap().unwrap().unread, 0);

        let call = &backend.calls_to(commands::MARK_MESSAGES_READ)[0];
        assert_eq!(call.args["ownerUid"], 1);
        assert_eq!(call.args["targetId"], 42);
    }
}
