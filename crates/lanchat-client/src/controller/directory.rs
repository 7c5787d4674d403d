use tracing::{debug, info};

use lanchat_shared::protocol::{ContactInfo, UserInfo};

use super::ChatClient;
use crate::error::Result;
use crate::events::ViewEvent;

impl ChatClient {
    /// Fetch the logged-in user from the backend and make it current.
    pub async fn load_current_user(&self) -> Result<UserInfo> {
        let user = self.gateway.get_current_user().await?;
        self.set_current_user(user.clone())?;
        Ok(user)
    }

    pub fn set_current_user(&self, user: UserInfo) -> Result<()> {
        info!(uid = %user.uid, nickname = %user.nickname, "Current user set");
        self.with_state(|s| s.current_user = Some(user))?;
        self.emit(ViewEvent::RosterChanged);
        Ok(())
    }

    pub fn current_user(&self) -> Result<Option<UserInfo>> {
        self.with_state(|s| s.current_user.clone())
    }

    /// Change the current user's nickname and/or avatar.
    pub async fn update_profile(
        &self,
        nickname: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<UserInfo> {
        let owner = self.owner()?;
        let user = self
            .gateway
            .update_current_user(owner, nickname, avatar)
            .await?;
        self.set_current_user(user.clone())?;
        Ok(user)
    }

    pub async fn refresh_contacts(&self) -> Result<Vec<ContactInfo>> {
        let owner = self.owner()?;
        let contacts = self.gateway.get_contact_list(owner).await?;

        self.with_state(|s| s.roster.contacts = contacts.clone())?;
        debug!(count = contacts.len(), "Contacts refreshed");
        self.emit(ViewEvent::RosterChanged);
        Ok(contacts)
    }

    pub async fn refresh_online_users(&self) -> Result<Vec<UserInfo>> {
        let owner = self.owner()?;
        let online = self.gateway.get_online_users(owner).await?;

        self.with_state(|s| s.roster.online = online.clone())?;
        debug!(count = online.len(), "Online users refreshed");
        self.emit(ViewEvent::RosterChanged);
        Ok(online)
    }

    pub fn contacts(&self) -> Result<Vec<ContactInfo>> {
        self.with_state(|s| s.roster.contacts.clone())
    }

    pub fn online_users(&self) -> Result<Vec<UserInfo>> {
        self.with_state(|s| s.roster.online.clone())
    }
}
