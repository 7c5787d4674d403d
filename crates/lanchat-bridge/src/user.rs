use serde::Serialize;
use serde_json::Value;

use lanchat_shared::protocol::{commands, ContactInfo, UserInfo};
use lanchat_shared::types::UserId;

use crate::error::Result;
use crate::gateway::Gateway;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserArgs<'a> {
    uid: UserId,
    nickname: Option<&'a str>,
    avatar: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OwnerArgs {
    owner_uid: UserId,
}

impl Gateway {
    pub async fn get_current_user(&self) -> Result<UserInfo> {
        self.call(commands::GET_CURRENT_USER, &Value::Null, self.read_options())
            .await
    }

    /// Fields passed as `None` are left unchanged by the backend.
    pub async fn update_current_user(
        &self,
        uid: UserId,
        nickname: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<UserInfo> {
        let args = UpdateUserArgs {
            uid,
            nickname,
            avatar,
        };
        self.call(commands::UPDATE_CURRENT_USER, &args, self.write_options())
            .await
    }

    pub async fn get_contact_list(&self, owner: UserId) -> Result<Vec<ContactInfo>> {
        self.call(
            commands::GET_CONTACT_LIST,
            &OwnerArgs { owner_uid: owner },
            self.read_options(),
        )
        .await
    }

    /// Peers currently announced on the LAN.
    pub async fn get_online_users(&self, owner: UserId) -> Result<Vec<UserInfo>> {
        self.call(
            commands::GET_ONLINE_USERS,
            &OwnerArgs { owner_uid: owner },
            self.read_options(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::gateway::GatewayConfig;
    use crate::testing::{Scripted, ScriptedBackend};

    use super::*;

    fn alice() -> Value {
        json!({
            "uid": 1,
            "feiq_ip": "192.168.1.10",
            "feiq_port": 2425,
            "feiq_machine_id": "TEST-PC",
            "nickname": "Alice",
            "status": 1
        })
    }

    #[tokio::test]
    async fn test_get_current_user() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push(commands::GET_CURRENT_USER, Scripted::Reply(alice()));
        let gw = Gateway::new(backend.clone(), GatewayConfig::default());

        let user = gw.get_current_user().await.unwrap();

        assert_eq!(user.uid, UserId(1));
        assert_eq!(user.nickname, "Alice");
        assert_eq!(backend.calls()[0].args, Value::Null);
    }

    #[tokio::test]
    async fn test_update_current_user_args() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push(commands::UPDATE_CURRENT_USER, Scripted::Reply(alice()));
        let gw = Gateway::new(backend.clone(), GatewayConfig::default());

        gw.update_current_user(UserId(1), Some("Bob"), None)
            .await
            .unwrap();

        assert_eq!(
            backend.calls()[0].args,
            json!({"uid": 1, "nickname": "Bob", "avatar": null})
        );
    }
}
