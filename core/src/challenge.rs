// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Direct challenge finite state machine (C8). Plain async methods over the
//! shared stores, not an actor: unlike the matchmaking queue there is no
//! in-memory mutable structure to serialize access to, every state
//! transition is already a single row update guarded by the store.

use crate::hub::Hub;
use crate::session_spawn::GameSessionSpawner;
use crate::store::{BlockListStore, GameStore, RequestStore, RequestStatus, UserStore};
use common::control::{ControlFrame, HubEnvelope, HubEvent};
use common::error::{CoreError, CoreResult};
use common::id::{PlayerId, RequestId};
use std::sync::Arc;

pub struct ChallengeService<U, R, G, Req> {
    users: Arc<U>,
    hub: Arc<Hub<U, R>>,
    games: Arc<G>,
    requests: Arc<Req>,
    blocks: Arc<dyn BlockListStore>,
    spawner: Arc<dyn GameSessionSpawner>,
}

impl<U, R, G, Req> ChallengeService<U, R, G, Req>
where
    U: UserStore + 'static,
    R: RequestStore + 'static,
    G: GameStore,
    Req: RequestStore,
{
    pub fn new(
        users: Arc<U>,
        hub: Arc<Hub<U, R>>,
        games: Arc<G>,
        requests: Arc<Req>,
        blocks: Arc<dyn BlockListStore>,
        spawner: Arc<dyn GameSessionSpawner>,
    ) -> Self {
        Self {
            users,
            hub,
            games,
            requests,
            blocks,
            spawner,
        }
    }

    /// `send(requester, opponent)`: §4.4.
    pub async fn send(&self, requester: PlayerId, opponent: PlayerId) -> CoreResult<RequestId> {
        if requester == opponent {
            return Err(CoreError::Conflict(common::error::ConflictKind::SelfAction));
        }
        if !self.users.is_online(opponent).await? {
            return Err(CoreError::Conflict(
                common::error::ConflictKind::OpponentOffline,
            ));
        }
        if self.games.has_nonterminal_game(requester).await?
            || self.games.has_nonterminal_game(opponent).await?
        {
            return Err(CoreError::Conflict(
                common::error::ConflictKind::AlreadyInGame,
            ));
        }
        if self.requests.has_pending(requester).await? || self.requests.has_pending(opponent).await?
        {
            return Err(CoreError::Conflict(
                common::error::ConflictKind::AlreadyPendingRequest,
            ));
        }
        if self.blocks.blocked_either_way(requester, opponent).await? {
            return Err(CoreError::Conflict(common::error::ConflictKind::Blocked));
        }

        let id = self.requests.create_pending(requester, opponent).await?;
        let requester_name = self.users.username(requester).await?;
        let event: HubEnvelope = HubEvent::GameRequest {
            request_id: id,
            requester_name,
            avatar: None,
        }
        .into();
        self.hub.send(opponent, event).await?;
        Ok(id)
    }

    /// `accept(requestId)`: only the opponent may accept.
    pub async fn accept(&self, caller: PlayerId, request_id: RequestId) -> CoreResult<common::id::GameId> {
        let record = self
            .requests
            .get(request_id)
            .await?
            .ok_or(CoreError::NotFound("game request"))?;
        if record.opponent != caller {
            return Err(CoreError::PermissionDenied);
        }
        if record.status != RequestStatus::Pending {
            return Err(CoreError::Conflict(
                common::error::ConflictKind::AlreadyPendingRequest,
            ));
        }
        let game_id = self
            .games
            .create_pending(record.requester, record.opponent)
            .await?;
        self.requests.set_accepted(request_id, game_id).await?;
        self.spawner
            .spawn_session(game_id, record.requester, record.opponent, Box::new(|_| {}));
        let event: HubEnvelope = HubEvent::GameRequestResponse {
            game_id: Some(game_id),
        }
        .into();
        self.hub.send(record.requester, event).await?;
        Ok(game_id)
    }

    /// `reject(requestId)`: only the opponent.
    pub async fn reject(&self, caller: PlayerId, request_id: RequestId) -> CoreResult<()> {
        let record = self
            .requests
            .get(request_id)
            .await?
            .ok_or(CoreError::NotFound("game request"))?;
        if record.opponent != caller {
            return Err(CoreError::PermissionDenied);
        }
        self.requests.set_rejected(request_id).await?;
        let event: HubEnvelope = HubEvent::GameRequestResponse { game_id: None }.into();
        self.hub.send(record.requester, event).await?;
        Ok(())
    }

    /// `cancel(requestId)`: implicit, driven by hub disconnect (see
    /// [`crate::hub::Hub::disconnect`]), not exposed as a direct RPC here.
    /// Kept as a distinct method anyway so an explicit cancel action, if
    /// ever added at the HTTP layer, has somewhere to call.
    pub async fn cancel(&self, caller: PlayerId, request_id: RequestId) -> CoreResult<()> {
        let record = self
            .requests
            .get(request_id)
            .await?
            .ok_or(CoreError::NotFound("game request"))?;
        if record.requester != caller && record.opponent != caller {
            return Err(CoreError::PermissionDenied);
        }
        self.requests.set_rejected(request_id).await?;
        Ok(())
    }
}

/// The `game_start` control frame isn't produced here -- it belongs to C6
/// once both sockets attach -- but is re-exported for callers that need to
/// build the same shape when wiring a challenge's accepted game to its
/// session.
pub fn game_start_frame(game_id: common::id::GameId) -> ControlFrame {
    ControlFrame::GameStart { game_id }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::{FinalizeOutcome, GameHistoryEntry, GameRequestRecord};
    use async_trait::async_trait;
    use common::id::GameId;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeUsers {
        online: StdMutex<HashSet<PlayerId>>,
        names: StdMutex<HashMap<PlayerId, String>>,
    }

    #[async_trait]
    impl UserStore for FakeUsers {
        async fn set_online(&self, _player: PlayerId, _online: bool) -> CoreResult<()> {
            Ok(())
        }
        async fn username(&self, player: PlayerId) -> CoreResult<String> {
            Ok(self
                .names
                .lock()
                .unwrap()
                .get(&player)
                .cloned()
                .unwrap_or_else(|| "someone".to_owned()))
        }
        async fn find_by_username(&self, _username: &str) -> CoreResult<Option<PlayerId>> {
            Ok(None)
        }
        async fn is_online(&self, player: PlayerId) -> CoreResult<bool> {
            Ok(self.online.lock().unwrap().contains(&player))
        }
        async fn friends_of(&self, _player: PlayerId) -> CoreResult<Vec<PlayerId>> {
            Ok(vec![])
        }
    }

    #[derive(Default)]
    struct FakeGames {
        nonterminal: StdMutex<HashSet<PlayerId>>,
    }

    #[async_trait]
    impl GameStore for FakeGames {
        async fn create_pending(&self, _p1: PlayerId, _p2: PlayerId) -> CoreResult<GameId> {
            Ok(GameId::new())
        }
        async fn has_nonterminal_game(&self, player: PlayerId) -> CoreResult<bool> {
            Ok(self.nonterminal.lock().unwrap().contains(&player))
        }
        async fn finalize(
            &self,
            _game_id: GameId,
            _p1: u32,
            _p2: u32,
            _winner: PlayerId,
        ) -> CoreResult<FinalizeOutcome> {
            unimplemented!()
        }
        async fn history_for(&self, _player: PlayerId) -> CoreResult<Vec<GameHistoryEntry>> {
            Ok(vec![])
        }
    }

    #[derive(Default)]
    struct FakeRequests {
        records: StdMutex<HashMap<RequestId, GameRequestRecord>>,
        pending: StdMutex<HashSet<PlayerId>>,
    }

    #[async_trait]
    impl crate::store::RequestStore for FakeRequests {
        async fn create_pending(&self, requester: PlayerId, opponent: PlayerId) -> CoreResult<RequestId> {
            let id = RequestId::new();
            self.records.lock().unwrap().insert(
                id,
                GameRequestRecord {
                    id,
                    requester,
                    opponent,
                    status: RequestStatus::Pending,
                },
            );
            self.pending.lock().unwrap().insert(requester);
            self.pending.lock().unwrap().insert(opponent);
            Ok(id)
        }
        async fn get(&self, id: RequestId) -> CoreResult<Option<GameRequestRecord>> {
            Ok(self.records.lock().unwrap().get(&id).cloned())
        }
        async fn has_pending(&self, player: PlayerId) -> CoreResult<bool> {
            Ok(self.pending.lock().unwrap().contains(&player))
        }
        async fn set_accepted(&self, id: RequestId, _game_id: GameId) -> CoreResult<()> {
            let mut records = self.records.lock().unwrap();
            if let Some(record) = records.get_mut(&id) {
                self.pending.lock().unwrap().remove(&record.requester);
                self.pending.lock().unwrap().remove(&record.opponent);
                record.status = RequestStatus::Accepted;
            }
            Ok(())
        }
        async fn set_rejected(&self, id: RequestId) -> CoreResult<()> {
            let mut records = self.records.lock().unwrap();
            if let Some(record) = records.get_mut(&id) {
                self.pending.lock().unwrap().remove(&record.requester);
                self.pending.lock().unwrap().remove(&record.opponent);
                record.status = RequestStatus::Rejected;
            }
            Ok(())
        }
        async fn delete_pending_for(&self, _player: PlayerId) -> CoreResult<Vec<RequestId>> {
            Ok(vec![])
        }
    }

    #[derive(Default)]
    struct FakeBlocks {
        blocked_pairs: StdMutex<HashSet<(PlayerId, PlayerId)>>,
    }

    #[async_trait]
    impl BlockListStore for FakeBlocks {
        async fn blocked_either_way(&self, a: PlayerId, b: PlayerId) -> CoreResult<bool> {
            let pairs = self.blocked_pairs.lock().unwrap();
            Ok(pairs.contains(&(a, b)) || pairs.contains(&(b, a)))
        }
    }

    struct FakeSpawner;
    impl GameSessionSpawner for FakeSpawner {
        fn spawn_session(
            &self,
            _game_id: GameId,
            _player1: PlayerId,
            _player2: PlayerId,
            _on_finalize: crate::session_spawn::FinalizeCallback,
        ) {
        }
    }

    fn service() -> (
        ChallengeService<FakeUsers, FakeRequests, FakeGames, FakeRequests>,
        Arc<FakeUsers>,
        Arc<FakeGames>,
        Arc<FakeRequests>,
        Arc<FakeBlocks>,
    ) {
        let users = Arc::new(FakeUsers::default());
        let requests = Arc::new(FakeRequests::default());
        let games = Arc::new(FakeGames::default());
        let blocks = Arc::new(FakeBlocks::default());
        let hub = Arc::new(Hub::new(users.clone(), requests.clone()));
        let spawner: Arc<dyn GameSessionSpawner> = Arc::new(FakeSpawner);
        let svc = ChallengeService::new(
            users.clone(),
            hub,
            games.clone(),
            requests.clone(),
            blocks.clone() as Arc<dyn BlockListStore>,
            spawner,
        );
        (svc, users, games, requests, blocks)
    }

    #[tokio::test]
    async fn send_requires_opponent_online() {
        let (svc, _users, _games, _requests, _blocks) = service();
        let requester = PlayerId::new();
        let opponent = PlayerId::new();
        let err = svc.send(requester, opponent).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Conflict(common::error::ConflictKind::OpponentOffline)
        ));
    }

    #[tokio::test]
    async fn send_rejects_self_challenge() {
        let (svc, users, _games, _requests, _blocks) = service();
        let player = PlayerId::new();
        users.online.lock().unwrap().insert(player);
        let err = svc.send(player, player).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Conflict(common::error::ConflictKind::SelfAction)
        ));
    }

    #[tokio::test]
    async fn duplicate_pending_request_is_blocked() {
        let (svc, users, _games, _requests, _blocks) = service();
        let requester = PlayerId::new();
        let opponent = PlayerId::new();
        let third = PlayerId::new();
        users.online.lock().unwrap().insert(opponent);
        users.online.lock().unwrap().insert(third);

        svc.send(requester, opponent).await.unwrap();
        let err = svc.send(requester, third).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Conflict(common::error::ConflictKind::AlreadyPendingRequest)
        ));
    }

    #[tokio::test]
    async fn blocked_pair_cannot_challenge_either_direction() {
        let (svc, users, _games, _requests, blocks) = service();
        let requester = PlayerId::new();
        let opponent = PlayerId::new();
        users.online.lock().unwrap().insert(opponent);
        blocks.blocked_pairs.lock().unwrap().insert((opponent, requester));

        let err = svc.send(requester, opponent).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Conflict(common::error::ConflictKind::Blocked)
        ));
    }

    #[tokio::test]
    async fn only_opponent_may_accept() {
        let (svc, users, _games, _requests, _blocks) = service();
        let requester = PlayerId::new();
        let opponent = PlayerId::new();
        let stranger = PlayerId::new();
        users.online.lock().unwrap().insert(opponent);

        let request_id = svc.send(requester, opponent).await.unwrap();
        let err = svc.accept(stranger, request_id).await.unwrap_err();
        assert!(matches!(err, CoreError::PermissionDenied));

        svc.accept(opponent, request_id).await.unwrap();
    }

    #[tokio::test]
    async fn reject_notifies_requester_with_no_game() {
        let (svc, users, _games, _requests, _blocks) = service();
        let requester = PlayerId::new();
        let opponent = PlayerId::new();
        users.online.lock().unwrap().insert(opponent);

        let request_id = svc.send(requester, opponent).await.unwrap();
        svc.reject(opponent, request_id).await.unwrap();

        let err = svc.reject(opponent, request_id).await;
        assert!(err.is_ok(), "re-rejecting an already-rejected request is not itself an error");
    }
}
