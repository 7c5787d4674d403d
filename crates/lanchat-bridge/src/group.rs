use serde::Serialize;

use lanchat_shared::protocol::{commands, GroupInfo, GroupMember};
use lanchat_shared::types::{GroupId, GroupRole, UserId};

use crate::error::Result;
use crate::gateway::Gateway;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateGroupArgs<'a> {
    group_name: &'a str,
    creator_uid: UserId,
    member_uids: &'a [UserId],
}

#[derive(Serialize)]
struct GroupArgs {
    gid: GroupId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MemberArgs {
    gid: GroupId,
    member_uid: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<GroupRole>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserGroupsArgs {
    user_uid: UserId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateGroupArgs<'a> {
    gid: GroupId,
    group_name: &'a str,
    desc: &'a str,
}

impl Gateway {
    pub async fn create_group(
        &self,
        name: &str,
        creator: UserId,
        members: &[UserId],
    ) -> Result<GroupId> {
        let args = CreateGroupArgs {
            group_name: name,
            creator_uid: creator,
            member_uids: members,
        };
        self.call(commands::CREATE_GROUP, &args, self.write_options())
            .await
    }

    pub async fn get_group_info(&self, gid: GroupId) -> Result<GroupInfo> {
        self.call(commands::GET_GROUP_INFO, &GroupArgs { gid }, self.read_options())
            .await
    }

    pub async fn get_group_members(&self, gid: GroupId) -> Result<Vec<GroupMember>> {
        self.call(
            commands::GET_GROUP_MEMBERS,
            &GroupArgs { gid },
            self.read_options(),
        )
        .await
    }

    pub async fn add_group_member(
        &self,
        gid: GroupId,
        member: UserId,
        role: GroupRole,
    ) -> Result<()> {
        let args = MemberArgs {
            gid,
            member_uid: member,
            role: Some(role),
        };
        self.call_unit(commands::ADD_GROUP_MEMBER, &args, self.write_options())
            .await
    }

    pub async fn remove_group_member(&self, gid: GroupId, member: UserId) -> Result<()> {
        let args = MemberArgs {
            gid,
            member_uid: member,
            role: None,
        };
        self.call_unit(commands::REMOVE_GROUP_MEMBER, &args, self.write_options())
            .await
    }

    pub async fn update_member_role(
        &self,
        gid: GroupId,
        member: UserId,
        role: GroupRole,
    ) -> Result<()> {
        let args = MemberArgs {
            gid,
            member_uid: member,
            role: Some(role),
        };
        self.call_unit(commands::UPDATE_MEMBER_ROLE, &args, self.write_options())
            .await
    }

    pub async fn get_user_groups(&self, user: UserId) -> Result<Vec<GroupInfo>> {
        self.call(
            commands::GET_USER_GROUPS,
            &UserGroupsArgs { user_uid: user },
            self.read_options(),
        )
        .await
    }

    pub async fn update_group_info(&self, gid: GroupId, name: &str, desc: &str) -> Result<()> {
        let args = UpdateGroupArgs {
            gid,
            group_name: name,
            desc,
        };
        self.call_unit(commands::UPDATE_GROUP_INFO, &args, self.write_options())
            .await
    }

    pub async fn delete_group(&self, gid: GroupId) -> Result<()> {
        self.call_unit(commands::DELETE_GROUP, &GroupArgs { gid }, self.write_options())
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use crate::gateway::GatewayConfig;
    use crate::testing::{Scripted, ScriptedBackend};

    use super::*;

    #[tokio::test]
    async fn test_create_group_args() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push(commands::CREATE_GROUP, Scripted::Reply(json!(10)));
        let gw = Gateway::new(backend.clone(), GatewayConfig::default());

        let gid = gw
            .create_group("Team", UserId(1), &[UserId(2), UserId(3)])
            .await
            .unwrap();

        assert_eq!(gid, GroupId(10));
        assert_eq!(
            backend.calls()[0].args,
            json!({"groupName": "Team", "creatorUid": 1, "memberUids": [2, 3]})
        );
    }

    #[tokio::test]
    async fn test_remove_member_omits_role() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push(commands::REMOVE_GROUP_MEMBER, Scripted::Reply(Value::Null));
        let gw = Gateway::new(backend.clone(), GatewayConfig::default());

        gw.remove_group_member(GroupId(10), UserId(3)).await.unwrap();

        assert_eq!(backend.calls()[0].args, json!({"gid": 10, "memberUid": 3}));
    }

    #[tokio::test]
    async fn test_update_role_serialises_integer() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push(commands::UPDATE_MEMBER_ROLE, Scripted::Reply(Value::Null));
        let gw = Gateway::new(backend.clone(), GatewayConfig::default());

        gw.update_member_role(GroupId(10), UserId(3), GroupRole::Admin)
            .await
            .unwrap();

        assert_eq!(
            backend.calls()[0].args,
            json!({"gid": 10, "memberUid": 3, "role": 1})
        );
    }
}
