// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Single-elimination tournament engine (C9): exactly 4 participants, two
//! semifinals, one final. Orchestrates three ordinary C6 sessions through
//! [`GameSessionSpawner`] and wires each one's finalize callback to advance
//! the bracket, rather than owning any game logic itself.

use crate::hub::Hub;
use crate::session_spawn::GameSessionSpawner;
use crate::store::{GameStore, RequestStore, TournamentSlot, TournamentStore, UserStore};
use common::control::{HubEnvelope, HubEvent};
use common::error::CoreResult;
use common::id::{PlayerId, TournamentId};
use log::warn;
use std::sync::{Arc, Mutex};

/// In-memory bracket state for one tournament, guarded by a mutex because
/// two semifinal finalize callbacks can race to be "the second one in".
/// The persistent row (via [`TournamentStore`]) is the source of truth for
/// anything that outlives process restart; this just coordinates the
/// handoff from semis to final within a single process lifetime.
struct Bracket {
    semi1_winner: Option<PlayerId>,
    semi2_winner: Option<PlayerId>,
    final_started: bool,
}

pub struct TournamentEngine<U, R, G, T> {
    hub: Arc<Hub<U, R>>,
    games: Arc<G>,
    tournaments: Arc<T>,
    spawner: Arc<dyn GameSessionSpawner>,
}

impl<U, R, G, T> TournamentEngine<U, R, G, T>
where
    U: UserStore + 'static,
    R: RequestStore + 'static,
    G: GameStore + 'static,
    T: TournamentStore + 'static,
{
    pub fn new(
        hub: Arc<Hub<U, R>>,
        games: Arc<G>,
        tournaments: Arc<T>,
        spawner: Arc<dyn GameSessionSpawner>,
    ) -> Self {
        Self {
            hub,
            games,
            tournaments,
            spawner,
        }
    }

    /// Creates a tournament for exactly 4 participants (§4.5). `creator`
    /// must be one of `participants` (open question, resolved in favor of
    /// implicit participation, see design notes); every non-creator
    /// participant is notified.
    pub async fn create(
        &self,
        creator: PlayerId,
        participants: [PlayerId; 4],
    ) -> CoreResult<TournamentId> {
        let tournament_id = self.tournaments.create_in_progress(participants).await?;

        for participant in participants {
            if participant != creator {
                let event: HubEnvelope = HubEvent::Tournament { tournament_id }.into();
                self.hub.send(participant, event).await?;
            }
        }

        let bracket = Arc::new(Mutex::new(Bracket {
            semi1_winner: None,
            semi2_winner: None,
            final_started: false,
        }));

        self.start_semifinal(
            tournament_id,
            TournamentSlot::Semi1,
            participants[0],
            participants[1],
            bracket.clone(),
            true,
        )
        .await?;
        self.start_semifinal(
            tournament_id,
            TournamentSlot::Semi2,
            participants[2],
            participants[3],
            bracket,
            false,
        )
        .await?;

        Ok(tournament_id)
    }

    async fn start_semifinal(
        &self,
        tournament_id: TournamentId,
        slot: TournamentSlot,
        p1: PlayerId,
        p2: PlayerId,
        bracket: Arc<Mutex<Bracket>>,
        is_semi1: bool,
    ) -> CoreResult<()> {
        let game_id = self.games.create_pending(p1, p2).await?;
        self.tournaments
            .attach_game(tournament_id, game_id, slot)
            .await?;

        let games = self.games.clone();
        let tournaments = self.tournaments.clone();
        let spawner = self.spawner.clone();

        self.spawner.spawn_session(
            game_id,
            p1,
            p2,
            Box::new(move |winner| {
                if let Some((w1, w2)) = record_semifinal_result(&bracket, is_semi1, winner) {
                    actix::spawn(async move {
                        if let Err(e) =
                            start_final(tournament_id, w1, w2, games, tournaments, spawner).await
                        {
                            warn!("failed to start tournament final: {}", e);
                        }
                    });
                }
            }),
        );

        Ok(())
    }
}

/// Records one semifinal's winner and reports the pairing for the final the
/// first (and only the first) time both semifinals have reported. Pulled out
/// of the finalize closure so the race between two concurrent callbacks can
/// be exercised without a running actor system.
fn record_semifinal_result(
    bracket: &Mutex<Bracket>,
    is_semi1: bool,
    winner: PlayerId,
) -> Option<(PlayerId, PlayerId)> {
    let mut guard = bracket.lock().unwrap();
    if is_semi1 {
        guard.semi1_winner = Some(winner);
    } else {
        guard.semi2_winner = Some(winner);
    }
    let ready = guard.semi1_winner.zip(guard.semi2_winner);
    if ready.is_some() && !guard.final_started {
        guard.final_started = true;
        ready
    } else {
        None
    }
}

async fn start_final<G, T>(
    tournament_id: TournamentId,
    w1: PlayerId,
    w2: PlayerId,
    games: Arc<G>,
    tournaments: Arc<T>,
    spawner: Arc<dyn GameSessionSpawner>,
) -> CoreResult<()>
where
    G: GameStore + 'static,
    T: TournamentStore + 'static,
{
    let game_id = games.create_pending(w1, w2).await?;
    tournaments
        .attach_game(tournament_id, game_id, TournamentSlot::Final)
        .await?;

    let tournaments_for_finalize = tournaments.clone();
    spawner.spawn_session(
        game_id,
        w1,
        w2,
        Box::new(move |winner| {
            actix::spawn(async move {
                if let Err(e) = tournaments_for_finalize
                    .set_finished(tournament_id, winner)
                    .await
                {
                    warn!("failed to record tournament winner: {}", e);
                }
            });
        }),
    );

    // Semifinal winners learn the final exists when their socket attaches to
    // it and receives `player_info`/`game_start`; no separate hub push.
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn fresh_bracket() -> Mutex<Bracket> {
        Mutex::new(Bracket {
            semi1_winner: None,
            semi2_winner: None,
            final_started: false,
        })
    }

    #[test]
    fn first_semifinal_does_not_start_the_final() {
        let bracket = fresh_bracket();
        let winner = PlayerId::new();
        assert_eq!(record_semifinal_result(&bracket, true, winner), None);
    }

    #[test]
    fn second_semifinal_starts_the_final_exactly_once() {
        let bracket = fresh_bracket();
        let w1 = PlayerId::new();
        let w2 = PlayerId::new();

        assert_eq!(record_semifinal_result(&bracket, true, w1), None);
        let pairing = record_semifinal_result(&bracket, false, w2);
        assert_eq!(pairing, Some((w1, w2)));
    }

    #[test]
    fn semifinals_reporting_out_of_order_still_pair_once() {
        // Semi2 finishes first; semi1 arrives second and should be the one
        // that triggers the final, since both are now recorded.
        let bracket = fresh_bracket();
        let w1 = PlayerId::new();
        let w2 = PlayerId::new();

        assert_eq!(record_semifinal_result(&bracket, false, w2), None);
        let pairing = record_semifinal_result(&bracket, true, w1);
        assert_eq!(pairing, Some((w1, w2)));
    }

    #[test]
    fn a_concurrent_duplicate_report_never_double_starts_the_final() {
        // Simulates two finalize callbacks racing to be "the second one in"
        // after both winners are already known; only one may see `Some`.
        let bracket = fresh_bracket();
        let w1 = PlayerId::new();
        let w2 = PlayerId::new();
        record_semifinal_result(&bracket, true, w1);
        let first = record_semifinal_result(&bracket, false, w2);
        let second = record_semifinal_result(&bracket, false, w2);
        assert_eq!(first, Some((w1, w2)));
        assert_eq!(second, None);
    }
}
