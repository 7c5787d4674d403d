//! Session-scoped controller.
//!
//! [`ChatClient`] owns the gateway and the view state. Operations follow the
//! same shape: mutate the store optimistically, await the gateway, then
//! reconcile. Operations are grouped by domain in the submodules.

mod directory;
mod event_loop;
mod groups;
mod messaging;
mod receipts;
mod sessions;
mod transfers;

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::trace;

use lanchat_bridge::Gateway;
use lanchat_shared::types::{SessionKey, UserId};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::events::ViewEvent;
use crate::state::ChatState;

#[derive(Clone)]
pub struct ChatClient {
    gateway: Gateway,
    state: Arc<Mutex<ChatState>>,
    events: broadcast::Sender<ViewEvent>,
}

impl ChatClient {
    pub fn new(gateway: Gateway, config: &ClientConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            gateway,
            state: Arc::new(Mutex::new(ChatState::new(config.page_size))),
            events,
        }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Receive view change notifications from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.events.subscribe()
    }

    /// Run `f` with the state locked. `f` is synchronous, so the lock can
    /// never span an await point.
    fn with_state<R>(&self, f: impl FnOnce(&mut ChatState) -> R) -> Result<R> {
        let mut guard = self.state.lock().map_err(|_| ClientError::StatePoisoned)?;
        Ok(f(&mut guard))
    }

    fn owner(&self) -> Result<UserId> {
        self.with_state(|s| s.owner())?
            .ok_or(ClientError::NoCurrentUser)
    }

    fn emit(&self, event: ViewEvent) {
        if self.events.send(event).is_err() {
            trace!("No view subscribers");
        }
    }

    fn emit_messages_changed(&self, key: SessionKey) {
        self.emit(ViewEvent::MessagesChanged {
            session_type: key.kind,
            target_id: key.target,
        });
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use lanchat_bridge::testing::ScriptedBackend;
    use lanchat_bridge::{Gateway, GatewayConfig};
    use lanchat_shared::protocol::UserInfo;
    use lanchat_shared::types::{OnlineStatus, UserId};

    use super::ChatClient;
    use crate::config::ClientConfig;

    pub const OWNER: UserId = UserId(1);

    pub fn me() -> UserInfo {
        UserInfo {
            uid: OWNER,
            feiq_ip: "192.168.1.1".into(),
            feiq_port: 2425,
            feiq_machine_id: "me".into(),
            nickname: "me".into(),
            avatar: None,
            status: OnlineStatus::Online,
        }
    }

    pub fn client() -> (ChatClient, Arc<ScriptedBackend>) {
        let backend = Arc::new(ScriptedBackend::new());
        let config = ClientConfig {
            gateway: GatewayConfig {
                timeout: Duration::from_millis(50),
                retries: 0,
                backoff_base: Duration::from_millis(1),
            },
            page_size: 50,
            event_capacity: 64,
        };
        let gateway = Gateway::new(backend.clone(), config.gateway.clone());
        let client = ChatClient::new(gateway, &config);
        client.set_current_user(me()).unwrap();
        (client, backend)
    }
}
