// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! FIFO matchmaking queue (C7). An actix actor rather than a bare
//! `Mutex<VecDeque<_>>`: actix guarantees a single actor instance processes
//! one message at a time, which is exactly the serialization the pop-two
//! critical section needs, without a hand-rolled lock around small, frequent
//! mutations.

use crate::hub::{Hub, HubOutbound};
use crate::observer::{ObserverMessage, ObserverUpdate};
use crate::session_spawn::GameSessionSpawner;
use crate::store::{BlockListStore, GameStore, RequestStore, UserStore};
use actix::fut::{self, ActorFutureExt};
use actix::prelude::*;
use common::control::{ControlFrame, MatchmakingCommand};
use common::error::{CoreError, CoreResult};
use common::id::PlayerId;
use log::{info, warn};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

pub type MatchmakingRecipient = Recipient<ObserverUpdate<HubOutbound>>;
pub type MatchmakingObserverMessage = ObserverMessage<MatchmakingCommand, HubOutbound, PlayerId>;

/// Message an actor sends itself (via `ctx.notify`) after any mutation that
/// might have brought the queue to two or more waiting players. Splitting
/// this from `enqueue` keeps the synchronous queue mutation and the async
/// database/session work as two distinct steps that still execute strictly
/// one after another within the same actor, preserving linearizability.
#[derive(actix::Message)]
#[rtype(result = "()")]
struct PairOff;

pub struct Matchmaker<U, R, G> {
    queue: VecDeque<PlayerId>,
    sockets: HashMap<PlayerId, MatchmakingRecipient>,
    games: Arc<G>,
    hub: Arc<Hub<U, R>>,
    blocks: Arc<dyn BlockListStore>,
    spawner: Arc<dyn GameSessionSpawner>,
}

impl<U, R, G> Matchmaker<U, R, G>
where
    U: UserStore + 'static,
    R: RequestStore + 'static,
    G: GameStore + 'static,
{
    pub fn new(
        games: Arc<G>,
        hub: Arc<Hub<U, R>>,
        blocks: Arc<dyn BlockListStore>,
        spawner: Arc<dyn GameSessionSpawner>,
    ) -> Self {
        Self {
            queue: VecDeque::new(),
            sockets: HashMap::new(),
            games,
            hub,
            blocks,
            spawner,
        }
    }

    fn cancel(&mut self, player: PlayerId) {
        self.queue.retain(|p| *p != player);
        self.sockets.remove(&player);
    }

    fn enqueue(&mut self, player: PlayerId) {
        if !self.queue.contains(&player) {
            self.queue.push_back(player);
            info!("enqueued {}, queue length now {}", player, self.queue.len());
        }
    }

    fn reject(&mut self, player: PlayerId, err: CoreError) {
        if let Some(socket) = self.sockets.remove(&player) {
            let _ = socket.do_send(ObserverUpdate::Close);
        }
        warn!("matchmaker rejected {}: {}", player, err);
    }

    fn observer_player(&self, observer: &MatchmakingRecipient) -> Option<PlayerId> {
        self.sockets
            .iter()
            .find(|(_, v)| *v == observer)
            .map(|(k, _)| *k)
    }
}

impl<U, R, G> Actor for Matchmaker<U, R, G>
where
    U: UserStore + 'static,
    R: RequestStore + 'static,
    G: GameStore + 'static,
{
    type Context = Context<Self>;
}

impl<U, R, G> Handler<MatchmakingObserverMessage> for Matchmaker<U, R, G>
where
    U: UserStore + 'static,
    R: RequestStore + 'static,
    G: GameStore + 'static,
{
    type Result = ResponseActFuture<Self, ()>;

    fn handle(
        &mut self,
        msg: MatchmakingObserverMessage,
        _ctx: &mut Self::Context,
    ) -> Self::Result {
        match msg {
            ObserverMessage::Register {
                observer,
                payload: player,
            } => {
                self.sockets.insert(player, observer);
                if self.queue.contains(&player) {
                    self.reject(
                        player,
                        CoreError::Conflict(common::error::ConflictKind::AlreadyQueued),
                    );
                    return Box::pin(fut::ready(()));
                }
                let games = self.games.clone();
                Box::pin(
                    async move { games.has_nonterminal_game(player).await }.into_actor(self).map(
                        move |result, actor, ctx| match result {
                            Ok(true) => actor.reject(
                                player,
                                CoreError::Conflict(common::error::ConflictKind::AlreadyInGame),
                            ),
                            Ok(false) => {
                                actor.enqueue(player);
                                ctx.notify(PairOff);
                            }
                            Err(e) => warn!("matchmaker: query for {} failed: {}", player, e),
                        },
                    ),
                )
            }
            ObserverMessage::Unregister { observer } => {
                if let Some(player) = self.observer_player(&observer) {
                    self.cancel(player);
                }
                Box::pin(fut::ready(()))
            }
            ObserverMessage::Request {
                observer,
                request: MatchmakingCommand::CancelMatchmaking,
            } => {
                if let Some(player) = self.observer_player(&observer) {
                    self.cancel(player);
                    let frame = ControlFrame::Cancelled {
                        message: "Matchmaking cancelled".to_owned(),
                    };
                    if let Ok(value) = serde_json::to_value(frame) {
                        let _ = observer.do_send(ObserverUpdate::Send {
                            message: HubOutbound(value),
                        });
                    }
                }
                Box::pin(fut::ready(()))
            }
        }
    }
}

impl<U, R, G> Handler<PairOff> for Matchmaker<U, R, G>
where
    U: UserStore + 'static,
    R: RequestStore + 'static,
    G: GameStore + 'static,
{
    type Result = ResponseActFuture<Self, ()>;

    fn handle(&mut self, _msg: PairOff, _ctx: &mut Self::Context) -> Self::Result {
        if self.queue.len() < 2 {
            return Box::pin(fut::ready(()));
        }
        // actix serializes message handling per-actor: nothing else touches
        // `self.queue` while this future is pending, so deferring the pop to
        // the `.map()` continuation (after the pair is chosen and the game
        // exists) is still linearizable -- no two `PairOff` handlings can
        // ever observe the same candidate pair as still queued.
        let queue_snapshot: Vec<PlayerId> = self.queue.iter().copied().collect();
        let blocks = self.blocks.clone();
        let games = self.games.clone();
        let hub = self.hub.clone();
        let spawner = self.spawner.clone();

        Box::pin(
            async move {
                let pair = match find_eligible_pair(&queue_snapshot, blocks.as_ref()).await {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!("matchmaker: block lookup failed: {}", e);
                        return None;
                    }
                };
                let (p1, p2) = pair?;
                match games.create_pending(p1, p2).await {
                    Ok(game_id) => {
                        // The matchmaker has no further interest in who wins.
                        spawner.spawn_session(game_id, p1, p2, Box::new(|_winner| {}));
                        let frame = ControlFrame::Matched { game_id };
                        if let Err(e) = hub.send(p1, frame.clone()).await {
                            warn!("failed to notify {} of match: {}", p1, e);
                        }
                        if let Err(e) = hub.send(p2, frame).await {
                            warn!("failed to notify {} of match: {}", p2, e);
                        }
                        Some((p1, p2))
                    }
                    Err(e) => {
                        warn!("failed to pair players: {}", e);
                        None
                    }
                }
            }
            .into_actor(self)
            .map(|paired: Option<(PlayerId, PlayerId)>, actor, _ctx| {
                if let Some((p1, p2)) = paired {
                    actor.queue.retain(|p| *p != p1 && *p != p2);
                }
            }),
        )
    }
}

/// Scans the queue in FIFO order and returns the earliest pair (by queue
/// position, not necessarily the head two) that is not mutually blocked
/// (spec.md §3's `BlockList` applies to matchmaking as well as direct
/// challenges). `None` means every combination currently queued is blocked
/// both ways -- not an error, just nothing to pair yet.
async fn find_eligible_pair(
    queue: &[PlayerId],
    blocks: &dyn BlockListStore,
) -> CoreResult<Option<(PlayerId, PlayerId)>> {
    for i in 0..queue.len() {
        for j in (i + 1)..queue.len() {
            if !blocks.blocked_either_way(queue[i], queue[j]).await? {
                return Ok(Some((queue[i], queue[j])));
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod test {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;

    #[derive(Default)]
    struct FakeBlocks {
        pairs: HashSet<(PlayerId, PlayerId)>,
    }

    impl FakeBlocks {
        fn block(&mut self, a: PlayerId, b: PlayerId) {
            self.pairs.insert((a, b));
        }
    }

    #[async_trait]
    impl BlockListStore for FakeBlocks {
        async fn blocked_either_way(&self, a: PlayerId, b: PlayerId) -> CoreResult<bool> {
            Ok(self.pairs.contains(&(a, b)) || self.pairs.contains(&(b, a)))
        }
    }

    #[tokio::test]
    async fn fifo_pairs_the_head_two_when_nobody_is_blocked() {
        let a = PlayerId::new();
        let b = PlayerId::new();
        let c = PlayerId::new();
        let blocks = FakeBlocks::default();

        let pair = find_eligible_pair(&[a, b, c], &blocks).await.unwrap();
        assert_eq!(pair, Some((a, b)));
    }

    #[tokio::test]
    async fn a_blocked_head_pair_is_skipped_in_favor_of_the_next_eligible_one() {
        let a = PlayerId::new();
        let b = PlayerId::new();
        let c = PlayerId::new();
        let mut blocks = FakeBlocks::default();
        blocks.block(a, b);

        let pair = find_eligible_pair(&[a, b, c], &blocks).await.unwrap();
        assert_eq!(pair, Some((a, c)));
    }

    #[tokio::test]
    async fn no_eligible_pair_when_everyone_blocks_everyone() {
        let a = PlayerId::new();
        let b = PlayerId::new();
        let mut blocks = FakeBlocks::default();
        blocks.block(a, b);

        let pair = find_eligible_pair(&[a, b], &blocks).await.unwrap();
        assert_eq!(pair, None);
    }

    #[tokio::test]
    async fn fewer_than_two_queued_never_pairs() {
        let a = PlayerId::new();
        let blocks = FakeBlocks::default();
        let pair = find_eligible_pair(&[a], &blocks).await.unwrap();
        assert_eq!(pair, None);
    }
}
