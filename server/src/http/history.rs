// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! `GET /history/matches/{username}` (SPEC_FULL's HTTP surface section),
//! grounded on `PlayerGamesView` in the original source. A 404 only when
//! `username` itself does not resolve; an empty match list is still `200`.

use super::{authenticate, ok_response, AppState};
use crate::http::error::ApiError;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use common::error::CoreError;
use common::id::GameId;
use serde::Serialize;

#[derive(Serialize)]
struct MatchEntry {
    game_id: GameId,
    player: String,
    opponent: String,
    winner: Option<String>,
    player_score: u32,
    opponent_score: u32,
    date: DateTime<Utc>,
}

#[derive(Serialize)]
struct MatchesBody {
    matches: Vec<MatchEntry>,
}

pub async fn matches(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let (_claims, rotated) = authenticate(&req, &state).await?;
    let username = path.into_inner();
    let subject = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or(CoreError::NotFound("player"))?;

    let mut entries = Vec::new();
    for row in state.games.history_for(subject).await? {
        let (opponent, player_score, opponent_score) = if row.player1 == subject {
            (row.player2, row.player1_score, row.player2_score)
        } else {
            (row.player1, row.player2_score, row.player1_score)
        };
        let opponent_name = state.users.username(opponent).await?;
        let winner_name = match row.winner {
            Some(winner) => Some(state.users.username(winner).await?),
            None => None,
        };
        entries.push(MatchEntry {
            game_id: row.game_id,
            player: username.clone(),
            opponent: opponent_name,
            winner: winner_name,
            player_score,
            opponent_score,
            date: row.created_at,
        });
    }

    Ok(ok_response(&state.tokens, &rotated, MatchesBody { matches: entries }))
}
