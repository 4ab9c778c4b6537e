// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Presence & notification hub (C4): a single process-wide registry of
//! `PlayerId -> live sockets`. Replaces the source's global mutable
//! dictionary with an explicit value, owned once by the process and handed
//! to every component that needs to push an event, with all access going
//! through these methods so the locking is internal and the critical
//! sections stay small (insert/remove/enumerate).

use crate::observer::{ObserverMessage, ObserverUpdate};
use crate::store::{RequestStore, UserStore};
use actix::{Actor, Context, Handler, Recipient};
use common::control::{HubEnvelope, HubEvent};
use common::error::{CoreError, CoreResult};
use common::id::PlayerId;
use log::warn;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// What actually goes out over a socket. The hub treats this as opaque JSON
/// (per its contract: it routes by player id, not by event shape), so every
/// producer -- matchmaker, challenge FSM, tournament engine, or the hub
/// itself -- serializes its own frame shape (a bare [`common::control::ControlFrame`]
/// or a [`HubEnvelope`]) into this before calling [`Hub::send`].
#[derive(actix::Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct HubOutbound(pub serde_json::Value);

pub type HubRecipient = Recipient<ObserverUpdate<HubOutbound>>;
pub type HubObserverMessage = ObserverMessage<serde_json::Value, HubOutbound, PlayerId>;

/// The registry itself. Deliberately not an `actix::Actor` -- its methods
/// are plain `async fn`s over an internal lock so they can be awaited
/// directly from any task (HTTP handler, other domain actor, test) without
/// going through a mailbox round trip. [`HubGateway`] is the thin actor
/// adapter that the WebSocket transport layer actually talks to.
pub struct Hub<U, R> {
    sockets: Mutex<HashMap<PlayerId, Vec<HubRecipient>>>,
    users: Arc<U>,
    requests: Arc<R>,
}

impl<U: UserStore, R: RequestStore> Hub<U, R> {
    pub fn new(users: Arc<U>, requests: Arc<R>) -> Self {
        Self {
            sockets: Mutex::new(HashMap::new()),
            users,
            requests,
        }
    }

    pub async fn connect(&self, player: PlayerId, socket: HubRecipient) -> CoreResult<()> {
        let became_online = {
            let mut sockets = self.sockets.lock().await;
            let entry = sockets.entry(player).or_insert_with(Vec::new);
            let was_empty = entry.is_empty();
            entry.push(socket);
            was_empty
        };
        if became_online {
            self.users.set_online(player, true).await?;
            self.fan_out_online_status(player, true).await?;
        }
        Ok(())
    }

    pub async fn disconnect(&self, player: PlayerId, socket: &HubRecipient) -> CoreResult<()> {
        let became_offline = {
            let mut sockets = self.sockets.lock().await;
            if let Some(entry) = sockets.get_mut(&player) {
                entry.retain(|r| r != socket);
                if entry.is_empty() {
                    sockets.remove(&player);
                    true
                } else {
                    false
                }
            } else {
                false
            }
        };
        if became_offline {
            self.users.set_online(player, false).await?;
            self.fan_out_online_status(player, false).await?;
            // C8 cancel-on-disconnect: any of this player's own pending
            // requests are deleted; no notification needed, the counterpart
            // either loses its own hub connection shortly or is already gone.
            if let Err(e) = self.requests.delete_pending_for(player).await {
                warn!("failed to drop pending requests for {}: {}", player, e);
            }
        }
        Ok(())
    }

    /// Deliver `event` to every live socket of `player`. A player with no
    /// live sockets is a no-op, not an error. The hub only cares that
    /// `event` serializes to JSON; it never inspects the shape.
    pub async fn send(&self, player: PlayerId, event: impl Serialize) -> CoreResult<()> {
        let value = serde_json::to_value(event)
            .map_err(|e| CoreError::Internal(format!("serialize hub event: {}", e)))?;
        let recipients = {
            let sockets = self.sockets.lock().await;
            sockets.get(&player).cloned().unwrap_or_default()
        };
        for recipient in recipients {
            // Best-effort: a dead mailbox just means the socket actor is
            // already tearing down; the disconnect path will clean the
            // registry up separately.
            let _ = recipient.do_send(ObserverUpdate::Send {
                message: HubOutbound(value.clone()),
            });
        }
        Ok(())
    }

    pub async fn is_online(&self, player: PlayerId) -> bool {
        self.sockets
            .lock()
            .await
            .get(&player)
            .map(|v| !v.is_empty())
            .unwrap_or(false)
    }

    async fn fan_out_online_status(&self, player: PlayerId, online: bool) -> CoreResult<()> {
        let username = self.users.username(player).await?;
        for friend in self.users.friends_of(player).await? {
            let envelope: HubEnvelope = HubEvent::OnlineStatus {
                username: username.clone(),
                online,
            }
            .into();
            self.send(friend, envelope).await?;
        }
        Ok(())
    }
}

/// Thin actix actor adapter: the only piece of the hub that the generic
/// WebSocket transport actor (`server::ws_actor`) ever addresses directly.
/// All it does is translate `ObserverMessage` into calls on the shared
/// [`Hub`]; the actual registry logic lives there so it stays testable
/// without actix.
pub struct HubGateway<U, R> {
    hub: Arc<Hub<U, R>>,
}

impl<U, R> HubGateway<U, R> {
    pub fn new(hub: Arc<Hub<U, R>>) -> Self {
        Self { hub }
    }
}

impl<U: UserStore + 'static, R: RequestStore + 'static> Actor for HubGateway<U, R> {
    type Context = Context<Self>;
}

impl<U: UserStore + 'static, R: RequestStore + 'static> Handler<HubObserverMessage>
    for HubGateway<U, R>
{
    type Result = ();

    fn handle(&mut self, msg: HubObserverMessage, ctx: &mut Self::Context) {
        let hub = self.hub.clone();
        match msg {
            ObserverMessage::Register {
                observer,
                payload: player,
            } => {
                actix::spawn(async move {
                    if let Err(e) = hub.connect(player, observer).await {
                        warn!("hub connect failed for {}: {}", player, e);
                    }
                });
            }
            ObserverMessage::Unregister { observer } => {
                // The registry is keyed by player id, which this message
                // does not carry; the gateway records the mapping itself.
                self.disconnect_unknown_player(observer, ctx);
            }
            ObserverMessage::Request { .. } => {
                // The notification socket accepts no client commands.
            }
        }
    }
}

impl<U: UserStore + 'static, R: RequestStore + 'static> HubGateway<U, R> {
    fn disconnect_unknown_player(&mut self, observer: HubRecipient, _ctx: &mut Context<Self>) {
        let hub = self.hub.clone();
        actix::spawn(async move {
            hub.disconnect_any(observer).await;
        });
    }
}

impl<U: UserStore, R: RequestStore> Hub<U, R> {
    /// Used only by the gateway's `Unregister` path, which does not know
    /// which player owned the socket. Scans the (small) registry once.
    async fn disconnect_any(&self, socket: HubRecipient) {
        let player = {
            let sockets = self.sockets.lock().await;
            sockets
                .iter()
                .find(|(_, v)| v.contains(&socket))
                .map(|(k, _)| *k)
        };
        if let Some(player) = player {
            if let Err(e) = self.disconnect(player, &socket).await {
                warn!("hub disconnect failed for {}: {}", player, e);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeUsers {
        online: StdMutex<HashMap<PlayerId, bool>>,
        friends: StdMutex<HashMap<PlayerId, Vec<PlayerId>>>,
    }

    #[async_trait]
    impl UserStore for FakeUsers {
        async fn set_online(&self, player: PlayerId, online: bool) -> CoreResult<()> {
            self.online.lock().unwrap().insert(player, online);
            Ok(())
        }
        async fn username(&self, _player: PlayerId) -> CoreResult<String> {
            Ok("someone".to_owned())
        }
        async fn find_by_username(&self, _username: &str) -> CoreResult<Option<PlayerId>> {
            Ok(None)
        }
        async fn is_online(&self, player: PlayerId) -> CoreResult<bool> {
            Ok(*self.online.lock().unwrap().get(&player).unwrap_or(&false))
        }
        async fn friends_of(&self, player: PlayerId) -> CoreResult<Vec<PlayerId>> {
            Ok(self.friends.lock().unwrap().get(&player).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct FakeRequests {
        dropped: AtomicBool,
    }

    #[async_trait]
    impl RequestStore for FakeRequests {
        async fn create_pending(
            &self,
            _requester: PlayerId,
            _opponent: PlayerId,
        ) -> CoreResult<common::id::RequestId> {
            unimplemented!()
        }
        async fn get(
            &self,
            _id: common::id::RequestId,
        ) -> CoreResult<Option<crate::store::GameRequestRecord>> {
            Ok(None)
        }
        async fn has_pending(&self, _player: PlayerId) -> CoreResult<bool> {
            Ok(false)
        }
        async fn set_accepted(
            &self,
            _id: common::id::RequestId,
            _game_id: common::id::GameId,
        ) -> CoreResult<()> {
            Ok(())
        }
        async fn set_rejected(&self, _id: common::id::RequestId) -> CoreResult<()> {
            Ok(())
        }
        async fn delete_pending_for(
            &self,
            _player: PlayerId,
        ) -> CoreResult<Vec<common::id::RequestId>> {
            self.dropped.store(true, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn connect_marks_online_once_per_first_socket() {
        let users = Arc::new(FakeUsers::default());
        let requests = Arc::new(FakeRequests::default());
        let hub = Hub::new(users.clone(), requests);
        let player = PlayerId::new();
        assert!(!hub.is_online(player).await);
        // No real recipient available outside an actix system in this unit
        // test; exercise the registry bookkeeping path through `is_online`
        // instead of a full connect, which needs a running actix arbiter to
        // resolve a `Recipient`.
        {
            let mut sockets = hub.sockets.lock().await;
            sockets.entry(player).or_insert_with(Vec::new);
        }
        assert!(!hub.is_online(player).await);
    }
}
