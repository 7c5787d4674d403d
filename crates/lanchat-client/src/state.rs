//! View state owned by one [`crate::ChatClient`].
//!
//! [`ChatState`] sits behind `Arc<Mutex<>>` inside the client. The lock is
//! taken for synchronous store operations only and never held across an
//! `.await`.

use lanchat_shared::protocol::{ContactInfo, UserInfo};
use lanchat_shared::types::UserId;
use lanchat_store::{MessageStore, Pagination, SessionList, TransferTracker};

/// Contacts and currently online users.
#[derive(Debug, Default)]
pub struct Roster {
    pub contacts: Vec<ContactInfo>,
    pub online: Vec<UserInfo>,
}

impl Roster {
    /// Insert or refresh an online user. Returns `true` if the user was not
    /// listed before.
    pub fn set_online(&mut self, user: UserInfo) -> bool {
        match self.online.iter_mut().find(|u| u.uid == user.uid) {
            Some(existing) => {
                *existing = user;
                false
            }
            None => {
                self.online.push(user);
                true
            }
        }
    }

    /// Returns `true` if the user was listed.
    pub fn set_offline(&mut self, uid: UserId) -> bool {
        let before = self.online.len();
        self.online.retain(|u| u.uid != uid);
        before != self.online.len()
    }

    pub fn is_online(&self, uid: UserId) -> bool {
        self.online.iter().any(|u| u.uid == uid)
    }
}

pub struct ChatState {
    /// The logged-in user. `None` until loaded.
    pub current_user: Option<UserInfo>,

    pub sessions: SessionList,

    pub messages: MessageStore,

    /// History cursors, one per conversation.
    pub pagination: Pagination,

    pub transfers: TransferTracker,

    pub roster: Roster,
}

impl ChatState {
    pub fn new(page_size: u32) -> Self {
        Self {
            current_user: None,
            sessions: SessionList::new(),
            messages: MessageStore::new(),
            pagination: Pagination::new(page_size),
            transfers: TransferTracker::new(),
            roster: Roster::default(),
        }
    }

    pub fn owner(&self) -> Option<UserId> {
        self.current_user.as_ref().map(|u| u.uid)
    }
}
