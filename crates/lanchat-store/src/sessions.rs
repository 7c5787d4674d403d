use chrono::{DateTime, Utc};
use tracing::debug;

use lanchat_shared::types::SessionKey;

use crate::error::{Result, StoreError};
use crate::models::Session;

/// Session list plus the currently selected conversation.
///
/// Unread counters change only through this type. The selected session
/// always reads as zero unread locally; counts reported for it by the
/// backend are ignored until another session is selected.
#[derive(Debug, Default)]
pub struct SessionList {
    sessions: Vec<Session>,
    current: Option<SessionKey>,
}

impl SessionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn get(&self, key: &SessionKey) -> Option<&Session> {
        self.sessions.iter().find(|s| s.key == *key)
    }

    pub fn current(&self) -> Option<&SessionKey> {
        self.current.as_ref()
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.current.as_ref().and_then(|key| self.get(key))
    }

    pub fn is_current(&self, key: &SessionKey) -> bool {
        self.current.as_ref() == Some(key)
    }

    /// Replace the whole list with a fresh fetch.
    ///
    /// Duplicate keys in the fetch keep their first entry. The selection is
    /// kept and its unread counter stays at zero.
    pub fn replace(&mut self, fetched: Vec<Session>) {
        let mut sessions: Vec<Session> = Vec::with_capacity(fetched.len());
        for session in fetched {
            if sessions.iter().any(|s| s.key == session.key) {
                debug!(session = %session.key, "Duplicate session in list ignored");
                continue;
            }
            sessions.push(session);
        }

        if let Some(key) = self.current {
            if let Some(s) = sessions.iter_mut().find(|s| s.key == key) {
                s.unread = 0;
            }
        }
        self.sessions = sessions;
    }

    /// Select a session. Returns the unread count it had before selection;
    /// the counter is now zero.
    pub fn select(&mut self, key: SessionKey) -> u32 {
        self.current = Some(key);
        self.clear_unread(&key).unwrap_or(0)
    }

    pub fn deselect(&mut self) {
        self.current = None;
    }

    /// Zero a session's unread counter, returning the previous value.
    pub fn clear_unread(&mut self, key: &SessionKey) -> Result<u32> {
        let session = self.get_mut(key)?;
        let previous = session.unread;
        session.unread = 0;
        Ok(previous)
    }

    /// Unread count reported by the backend. Ignored for the selected
    /// session. Returns whether the stored value changed.
    pub fn set_unread(&mut self, key: &SessionKey, count: u32) -> Result<bool> {
        if self.is_current(key) {
            return Ok(false);
        }
        let session = self.get_mut(key)?;
        let changed = session.unread != count;
        session.unread = count;
        Ok(changed)
    }

    /// Record an incoming message on a session's summary.
    ///
    /// The counter grows only when the session is not selected. Returns the
    /// new unread count.
    pub fn note_incoming(
        &mut self,
        key: &SessionKey,
        message_id: Option<i64>,
        preview: String,
        at: DateTime<Utc>,
    ) -> Result<u32> {
        let is_current = self.is_current(key);
        let session = self.get_mut(key)?;

        if message_id.is_some() {
            session.last_message_id = message_id;
        }
        session.last_message = Some(preview);
        session.last_message_at = Some(at);
        session.updated_at = at;
        if !is_current {
            session.unread = session.unread.saturating_add(1);
        }
        Ok(session.unread)
    }

    /// Record an outgoing message on a session's summary.
    pub fn note_outgoing(
        &mut self,
        key: &SessionKey,
        preview: String,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let session = self.get_mut(key)?;
        session.last_message = Some(preview);
        session.last_message_at = Some(at);
        session.updated_at = at;
        Ok(())
    }

    /// Sum of unread counters across all sessions.
    pub fn total_unread(&self) -> u32 {
        self.sessions
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.unread))
    }

    fn get_mut(&mut self, key: &SessionKey) -> Result<&mut Session> {
        self.sessions
            .iter_mut()
            .find(|s| s.key == *key)
            .ok_or(StoreError::UnknownSession(*key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanchat_shared::types::{GroupId, UserId};

    fn session(key: SessionKey, unread: u32) -> Session {
        Session {
            id: key.target,
            owner: UserId(1),
            key,
            last_message_id: None,
            unread,
            updated_at: Utc::now(),
            name: None,
            avatar: None,
            last_message: None,
            last_message_at: None,
        }
    }

    #[test]
    fn test_select_clears_unread() {
        let key = SessionKey::direct(UserId(42));
        let mut list = SessionList::new();
        list.replace(vec![session(key, 3)]);

        assert_eq!(list.select(key), 3);
        assert_eq!(list.get(&key).unwrap().unread, 0);
        assert!(list.is_current(&key));
    }

    #[test]
    fn test_incoming_on_current_session_stays_read() {
        let current = SessionKey::direct(UserId(42));
        let other = SessionKey::group(GroupId(9));
        let mut list = SessionList::new();
        list.replace(vec![session(current, 0), session(other, 0)]);
        list.select(current);

        assert_eq!(list.note_incoming(&current, Some(1), "hi".into(), Utc::now()).unwrap(), 0);
        assert_eq!(list.note_incoming(&other, Some(2), "yo".into(), Utc::now()).unwrap(), 1);
        assert_eq!(list.get(&other).unwrap().last_message.as_deref(), Some("yo"));
    }

    #[test]
    fn test_backend_count_ignored_for_current() {
        let key = SessionKey::direct(UserId(42));
        let mut list = SessionList::new();
        list.replace(vec![session(key, 0)]);
        list.select(key);

        assert!(!list.set_unread(&key, 5).unwrap());
        assert_eq!(list.get(&key).unwrap().unread, 0);
    }

    #[test]
    fn test_replace_keeps_selection_read() {
        let key = SessionKey::direct(UserId(42));
        let mut list = SessionList::new();
        list.replace(vec![session(key, 0)]);
        list.select(key);

        list.replace(vec![session(key, 4)]);
        assert_eq!(list.get(&key).unwrap().unread, 0);
        assert_eq!(list.current(), Some(&key));
    }

    #[test]
    fn test_replace_drops_duplicate_keys() {
        let key = SessionKey::direct(UserId(42));
        let mut list = SessionList::new();
        list.replace(vec![session(key, 1), session(key, 2)]);
        assert_eq!(list.sessions().len(), 1);
        assert_eq!(list.total_unread(), 1);
    }

    #[test]
    fn test_direct_and_group_with_same_target_are_distinct() {
        let mut list = SessionList::new();
        list.replace(vec![
            session(SessionKey::direct(UserId(5)), 1),
            session(SessionKey::group(GroupId(5)), 2),
        ]);
        assert_eq!(list.sessions().len(), 2);
        assert_eq!(list.total_unread(), 3);
    }

    #[test]
    fn test_unknown_session() {
        let mut list = SessionList::new();
        let key = SessionKey::direct(UserId(1));
        assert_eq!(list.clear_unread(&key), Err(StoreError::UnknownSession(key)));
    }
}
