// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The boundary between orchestration (matchmaker, challenge FSM, tournament
//! engine) and the actual C6 session actor. A game session is a
//! WebSocket-bound actix actor with a transactional finalize hook, both of
//! which are server-binary concerns (sea-orm, actix-web-actors); this crate
//! only needs to be able to ask for one to exist and to be told, once, who
//! won it. Keeping the boundary a trait avoids core importing anything from
//! the server binary and avoids the server binary's session type leaking
//! into matchmaking/tournament orchestration.

use common::id::{GameId, PlayerId};

/// Invoked exactly once when a spawned session finalizes, naturally or by
/// forfeit. Implementations must not call back into the spawner that
/// created them from within this closure to avoid re-entrant locking.
pub type FinalizeCallback = Box<dyn FnOnce(PlayerId) + Send>;

pub trait GameSessionSpawner: Send + Sync {
    /// Ensures a C6 session exists for `game_id` between `player1` and
    /// `player2`, registering `on_finalize` to be called with the winner's
    /// id when that session terminates. Idempotent: calling it again for a
    /// game that already has a running session is a no-op (the second
    /// player's socket attaches to the existing session instead).
    fn spawn_session(
        &self,
        game_id: GameId,
        player1: PlayerId,
        player2: PlayerId,
        on_finalize: FinalizeCallback,
    );
}
