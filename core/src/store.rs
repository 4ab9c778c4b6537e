// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Explicit store interfaces. The source this system was distilled from
//! resolved its module cycles (hub needing game state, game needing hub
//! fan-out) with late, in-function imports; here every such edge instead
//! goes through one of the traits below, implemented against the relational
//! database in `server::db`. Nothing in this crate imports from `server`.

use async_trait::async_trait;
use common::id::{GameId, PlayerId, RefreshId, RequestId, TournamentId};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Clone, Debug)]
pub struct GameRequestRecord {
    pub id: RequestId,
    pub requester: PlayerId,
    pub opponent: PlayerId,
    pub status: RequestStatus,
}

/// Outcome of a call to [`GameStore::finalize`], so callers can tell whether
/// they raced a prior finalize (and therefore should not re-emit a
/// `game_over` that nobody is waiting for, though emitting it twice to a
/// best-effort socket send is harmless).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FinalizeOutcome {
    pub already_finished: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TournamentSlot {
    Semi1,
    Semi2,
    Final,
}

/// One row of `GET /history/matches/{username}` (SPEC_FULL §HTTP surface),
/// predating game completion as well: an in-progress match has `winner:
/// None`.
#[derive(Clone, Debug)]
pub struct GameHistoryEntry {
    pub game_id: GameId,
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub player1_score: u32,
    pub player2_score: u32,
    pub winner: Option<PlayerId>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Read/write access to player identity fields the core cares about:
/// presence and the friend graph. Profile, avatar, and password fields are
/// out of scope and never touched here.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn set_online(&self, player: PlayerId, online: bool) -> common::error::CoreResult<()>;
    async fn username(&self, player: PlayerId) -> common::error::CoreResult<String>;
    async fn find_by_username(&self, username: &str) -> common::error::CoreResult<Option<PlayerId>>;
    async fn is_online(&self, player: PlayerId) -> common::error::CoreResult<bool>;
    async fn friends_of(&self, player: PlayerId) -> common::error::CoreResult<Vec<PlayerId>>;
}

/// Symmetric: blocking in either direction disqualifies the pair.
#[async_trait]
pub trait BlockListStore: Send + Sync {
    async fn blocked_either_way(
        &self,
        a: PlayerId,
        b: PlayerId,
    ) -> common::error::CoreResult<bool>;
}

#[async_trait]
pub trait GameStore: Send + Sync {
    async fn create_pending(
        &self,
        player1: PlayerId,
        player2: PlayerId,
    ) -> common::error::CoreResult<GameId>;

    async fn has_nonterminal_game(&self, player: PlayerId) -> common::error::CoreResult<bool>;

    /// Row-locked, idempotent. The first call for a given `game_id` sets
    /// `status=FINISHED`, the scores, and the winner, and bumps the winner's
    /// `wins`/loser's `losses` exactly once, all under one transaction.
    /// Every subsequent call is a no-op that reports `already_finished`.
    async fn finalize(
        &self,
        game_id: GameId,
        player1_score: u32,
        player2_score: u32,
        winner: PlayerId,
    ) -> common::error::CoreResult<FinalizeOutcome>;

    /// Every row (finished or not) involving `player`, most recent first.
    async fn history_for(&self, player: PlayerId) -> common::error::CoreResult<Vec<GameHistoryEntry>>;
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn create_pending(
        &self,
        requester: PlayerId,
        opponent: PlayerId,
    ) -> common::error::CoreResult<RequestId>;

    async fn get(
        &self,
        id: RequestId,
    ) -> common::error::CoreResult<Option<GameRequestRecord>>;

    async fn has_pending(&self, player: PlayerId) -> common::error::CoreResult<bool>;

    async fn set_accepted(&self, id: RequestId, game_id: GameId) -> common::error::CoreResult<()>;

    async fn set_rejected(&self, id: RequestId) -> common::error::CoreResult<()>;

    /// Deletes (not merely marks cancelled) every PENDING request owned by
    /// `player` as either side, returning their ids so the caller can notify
    /// counterparts if desired. Called on hub disconnect.
    async fn delete_pending_for(
        &self,
        player: PlayerId,
    ) -> common::error::CoreResult<Vec<RequestId>>;
}

#[async_trait]
pub trait TournamentStore: Send + Sync {
    async fn create_in_progress(
        &self,
        participants: [PlayerId; 4],
    ) -> common::error::CoreResult<TournamentId>;

    async fn attach_game(
        &self,
        tournament: TournamentId,
        game_id: GameId,
        slot: TournamentSlot,
    ) -> common::error::CoreResult<()>;

    async fn set_finished(
        &self,
        tournament: TournamentId,
        winner: PlayerId,
    ) -> common::error::CoreResult<()>;
}

/// Persistent set of refresh token identifiers that have been rotated or
/// explicitly revoked.
#[async_trait]
pub trait RefreshBlacklist: Send + Sync {
    async fn is_blacklisted(&self, jti: RefreshId) -> common::error::CoreResult<bool>;
    async fn blacklist(&self, jti: RefreshId) -> common::error::CoreResult<()>;
}
