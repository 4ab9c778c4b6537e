// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Game session (C6): the concrete actix actor behind `core`'s
//! `GameSessionSpawner` trait boundary. Owns one `GameEngine`, up to two
//! player sockets, and the 60Hz tick loop; everything else in the workspace
//! only ever touches it through `SessionRegistry::spawn_session` and the
//! `on_finalize` callback (see `pong_core::session_spawn`).

use crate::engine::{GameEngine, PaddleDirection};
use crate::ws_actor::{WsFrame, WsFrameKind};
use actix::prelude::*;
use common::control::{ControlFrame, GameOverReason, PlayerInfoData, PlayerSummary};
use common::id::{GameId, PlayerId, PlayerRole};
use common::wire::GameStateFrame;
use pong_core::observer::{ObserverMessage, ObserverUpdate};
use pong_core::session_spawn::{FinalizeCallback, GameSessionSpawner};
use pong_core::store::GameStore;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const TICK_INTERVAL: Duration = Duration::from_millis(1000 / 60);

/// Server -> client frames on the pong socket: JSON control frames *and*
/// the 24 byte binary state frame, both on the same connection (spec.md
/// §6) -- the reason this route needs its own `WsFrame` impl instead of
/// reusing `pong_core::hub::HubOutbound`.
#[derive(Clone, actix::Message)]
#[rtype(result = "()")]
pub enum PongOutbound {
    Control(ControlFrame),
    State(GameStateFrame),
}

impl WsFrame for PongOutbound {
    fn into_ws_frame(self) -> WsFrameKind {
        match self {
            Self::Control(frame) => {
                WsFrameKind::Text(serde_json::to_string(&frame).expect("control frame serializes"))
            }
            Self::State(frame) => WsFrameKind::Binary(frame.encode().to_vec()),
        }
    }
}

/// Client -> server frame on the pong socket: bare `"w"`/`"s"` text only
/// (spec.md §6); anything else is dropped before it reaches this type.
pub enum PongInput {
    Move(PaddleDirection),
}

pub fn decode_pong_input(text: &str) -> Option<PongInput> {
    PaddleDirection::from_text(text).map(PongInput::Move)
}

pub type PongRecipient = Recipient<ObserverUpdate<PongOutbound>>;
pub type PongObserverMessage = ObserverMessage<PongInput, PongOutbound, PlayerId>;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum SessionState {
    AwaitingBoth,
    Running,
    Terminated,
}

struct Slot {
    socket: PongRecipient,
}

/// One instance per active match (§4.2). `player1`/`player2` are fixed at
/// construction (from the persisted `PongGame` row's participants); role
/// assignment on attach is just matching the connecting identity against
/// those two, never a first-come-first-served slot.
pub struct GameSessionActor {
    game_id: GameId,
    player1: PlayerId,
    player2: PlayerId,
    engine: GameEngine,
    sockets: HashMap<PlayerId, Slot>,
    state: SessionState,
    games: Arc<dyn GameStore>,
    on_finalize: Mutex<Option<FinalizeCallback>>,
    started_at: Option<Instant>,
}

impl GameSessionActor {
    fn new(
        game_id: GameId,
        player1: PlayerId,
        player2: PlayerId,
        games: Arc<dyn GameStore>,
        on_finalize: FinalizeCallback,
    ) -> Self {
        Self {
            game_id,
            player1,
            player2,
            engine: GameEngine::canonical(),
            sockets: HashMap::new(),
            state: SessionState::AwaitingBoth,
            games,
            on_finalize: Mutex::new(Some(on_finalize)),
            started_at: None,
        }
    }

    fn role_of(&self, player: PlayerId) -> Option<PlayerRole> {
        if player == self.player1 {
            Some(PlayerRole::Player1)
        } else if player == self.player2 {
            Some(PlayerRole::Player2)
        } else {
            None
        }
    }

    fn other_player(&self, player: PlayerId) -> PlayerId {
        if player == self.player1 {
            self.player2
        } else {
            self.player1
        }
    }

    fn player_of(&self, observer: &PongRecipient) -> Option<PlayerId> {
        self.sockets
            .iter()
            .find(|(_, slot)| &slot.socket == observer)
            .map(|(id, _)| *id)
    }

    fn send_to(&self, player: PlayerId, frame: PongOutbound) {
        if let Some(slot) = self.sockets.get(&player) {
            let _ = slot.socket.do_send(ObserverUpdate::Send {
                message: frame.clone(),
            });
        }
    }

    fn broadcast(&self, frame: PongOutbound) {
        for slot in self.sockets.values() {
            let _ = slot.socket.do_send(ObserverUpdate::Send {
                message: frame.clone(),
            });
        }
    }

    /// Sends a fresh `player_info` to every currently attached socket, each
    /// addressed from its own point of view. Re-sent whenever the set of
    /// attached sockets changes so the first arrival's `opponent` field
    /// fills in once the second attaches, rather than only being computed
    /// once at attach time.
    fn broadcast_player_info(&self) {
        for (&player, slot) in &self.sockets {
            let role = self.role_of(player).expect("socket keyed by known player");
            let opponent_id = self.other_player(player);
            let current_player = PlayerSummary {
                username: player.to_string(),
                avatar: None,
                role: role_tag(role),
            };
            let opponent = self.sockets.get(&opponent_id).map(|_| PlayerSummary {
                username: opponent_id.to_string(),
                avatar: None,
                role: role_tag(role.other()),
            });
            let frame = PongOutbound::Control(ControlFrame::PlayerInfo {
                data: PlayerInfoData {
                    current_player,
                    opponent,
                },
            });
            let _ = slot.socket.do_send(ObserverUpdate::Send { message: frame });
        }
    }

    fn start_running(&mut self, ctx: &mut Context<Self>) {
        self.state = SessionState::Running;
        self.started_at = Some(Instant::now());
        self.engine.start_ball();
        self.broadcast(PongOutbound::Control(ControlFrame::GameStart {
            game_id: self.game_id,
        }));
        ctx.run_interval(TICK_INTERVAL, |act, ctx| act.tick(ctx));
    }

    fn tick(&mut self, ctx: &mut Context<Self>) {
        if self.state != SessionState::Running {
            return;
        }
        let now = self
            .started_at
            .expect("ticking implies started_at is set")
            .elapsed()
            .as_secs_f64();
        let finished = self.engine.update(now);
        self.broadcast(PongOutbound::State(self.engine.snapshot()));
        if finished {
            let winner_role = self
                .engine
                .winner(None)
                .expect("update() returning true implies a winner");
            let winner = if winner_role == PlayerRole::Player1 {
                self.player1
            } else {
                self.player2
            };
            self.finalize(winner, GameOverReason::Natural, ctx);
        }
    }

    /// §4.2: re-reads the row with a lock inside one transaction and is a
    /// no-op past the first call. Cancels the tick task, emits `game_over`
    /// best-effort to both sockets, bumps win/loss counters exactly once,
    /// and invokes the spawner's finalize callback exactly once.
    fn finalize(&mut self, winner: PlayerId, reason: GameOverReason, ctx: &mut Context<Self>) {
        if self.state == SessionState::Terminated {
            return;
        }
        self.state = SessionState::Terminated;

        let (score1, score2) = self.engine.scores();
        self.broadcast(PongOutbound::Control(ControlFrame::GameOver {
            winner: Some(winner),
            reason: Some(reason),
        }));

        let games = self.games.clone();
        let game_id = self.game_id;
        actix::spawn(async move {
            match games.finalize(game_id, score1, score2, winner).await {
                Ok(outcome) if outcome.already_finished => {
                    info!("game {} finalize raced an earlier winner", game_id);
                }
                Ok(_) => info!("game {} finalized, winner {}", game_id, winner),
                Err(e) => warn!("finalize {} failed (session still terminates): {}", game_id, e),
            }
        });

        if let Some(cb) = self.on_finalize.lock().unwrap().take() {
            cb(winner);
        }
        ctx.stop();
    }
}

fn role_tag(role: PlayerRole) -> &'static str {
    match role {
        PlayerRole::Player1 => "player1",
        PlayerRole::Player2 => "player2",
    }
}

impl Actor for GameSessionActor {
    type Context = Context<Self>;
}

impl Handler<PongObserverMessage> for GameSessionActor {
    type Result = ();

    fn handle(&mut self, msg: PongObserverMessage, ctx: &mut Self::Context) {
        match msg {
            ObserverMessage::Register {
                observer,
                payload: player,
            } => {
                if self.role_of(player).is_none() {
                    warn!(
                        "socket for {} attached to game {} it is not part of",
                        player, self.game_id
                    );
                    let _ = observer.do_send(ObserverUpdate::Close);
                    return;
                }
                self.sockets.insert(player, Slot { socket: observer });
                self.broadcast_player_info();
                if self.sockets.len() == 2 && self.state == SessionState::AwaitingBoth {
                    self.start_running(ctx);
                }
            }
            ObserverMessage::Unregister { observer } => {
                if let Some(player) = self.player_of(&observer) {
                    self.sockets.remove(&player);
                    if self.state == SessionState::Running {
                        let winner = self.other_player(player);
                        self.finalize(winner, GameOverReason::Forfeit, ctx);
                    }
                }
            }
            ObserverMessage::Request {
                observer,
                request: PongInput::Move(direction),
            } => {
                if self.state != SessionState::Running {
                    return;
                }
                if let Some(player) = self.player_of(&observer) {
                    if let Some(role) = self.role_of(player) {
                        self.engine.move_paddle(role, direction);
                    }
                }
            }
        }
    }
}

/// Process-wide registry of running sessions, and the concrete
/// `GameSessionSpawner` every orchestrator (matchmaker, challenge FSM,
/// tournament engine) is handed as `Arc<dyn GameSessionSpawner>` (§9:
/// replaces the source's global `games`/`game_loops` dictionaries with an
/// explicit, internally-locked value).
pub struct SessionRegistry {
    sessions: Mutex<HashMap<GameId, Addr<GameSessionActor>>>,
    games: Arc<dyn GameStore>,
}

impl SessionRegistry {
    pub fn new(games: Arc<dyn GameStore>) -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(HashMap::new()),
            games,
        })
    }

    /// Looked up by the `/ws/pong/{game_id}/` route to find the actor a
    /// newly connected socket should register with. Dead (already stopped)
    /// entries are treated as absent so a finished game's id cannot be
    /// attached to stale state.
    pub fn get(&self, game_id: GameId) -> Option<Addr<GameSessionActor>> {
        let sessions = self.sessions.lock().unwrap();
        sessions
            .get(&game_id)
            .filter(|addr| addr.connected())
            .cloned()
    }
}

impl GameSessionSpawner for SessionRegistry {
    fn spawn_session(
        &self,
        game_id: GameId,
        player1: PlayerId,
        player2: PlayerId,
        on_finalize: FinalizeCallback,
    ) {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.get(&game_id).map_or(false, |a| a.connected()) {
            return;
        }
        let actor = GameSessionActor::new(game_id, player1, player2, self.games.clone(), on_finalize);
        sessions.insert(game_id, actor.start());
    }
}
