use tracing::{info, warn};

use lanchat_shared::protocol::{GroupInfo, GroupMember};
use lanchat_shared::types::{GroupId, GroupRole, SessionKey, UserId};

use super::ChatClient;
use crate::error::Result;

impl ChatClient {
    /// Create a group owned by the current user. The session list is
    /// refreshed afterwards so the new group conversation shows up.
    pub async fn create_group(&self, name: &str, members: &[UserId]) -> Result<GroupId> {
        let owner = self.owner()?;
        let gid = self.gateway.create_group(name, owner, members).await?;
        info!(%gid, name, members = members.len(), "Group created");

        self.refresh_sessions_quietly().await;
        Ok(gid)
    }

    pub async fn group_info(&self, gid: GroupId) -> Result<GroupInfo> {
        Ok(self.gateway.get_group_info(gid).await?)
    }

    pub async fn group_members(&self, gid: GroupId) -> Result<Vec<GroupMember>> {
        Ok(self.gateway.get_group_members(gid).await?)
    }

    /// Groups the current user belongs to.
    pub async fn user_groups(&self) -> Result<Vec<GroupInfo>> {
        let owner = self.owner()?;
        Ok(self.gateway.get_user_groups(owner).await?)
    }

    pub async fn add_group_member(&self, gid: GroupId, member: UserId, role: GroupRole) -> Result<()> {
        self.gateway.add_group_member(gid, member, role).await?;
        info!(%gid, %member, ?role, "Group member added");
        Ok(())
    }

    pub async fn remove_group_member(&self, gid: GroupId, member: UserId) -> Result<()> {
        self.gateway.remove_group_member(gid, member).await?;
        info!(%gid, %member, "Group member removed");
        Ok(())
    }

    pub async fn update_member_role(&self, gid: GroupId, member: UserId, role: GroupRole) -> Result<()> {
        self.gateway.update_member_role(gid, member, role).await?;
        info!(%gid, %member, ?role, "Group member role updated");
        Ok(())
    }

    /// Rename a group and/or change its description. The session list is
    /// refreshed so the cached display name follows.
    pub async fn update_group_info(&self, gid: GroupId, name: &str, desc: &str) -> Result<()> {
        self.gateway.update_group_info(gid, name, desc).await?;
        self.refresh_sessions_quietly().await;
        Ok(())
    }

    /// Delete a group. Its cached conversation is dropped locally.
    pub async fn delete_group(&self, gid: GroupId) -> Result<()> {
        self.gateway.delete_group(gid).await?;
        info!(%gid, "Group deleted");

        let key = SessionKey::group(gid);
        self.with_state(|s| {
            if s.sessions.is_current(&key) {
                s.sessions.deselect();
            }
        })?;
        self.reset_conversation(&key)?;
        self.refresh_sessions_quietly().await;
        Ok(())
    }

    async fn refresh_sessions_quietly(&self) {
        if let Err(e) = self.list_sessions().await {
            warn!(error = %e, "Session list refresh failed");
        }
    }
}
