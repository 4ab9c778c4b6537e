// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! `POST /create-tournament` (SPEC_FULL's HTTP surface section). The caller
//! is implicitly `participants[0]` -- spec.md §9's open question, resolved in
//! favor of implicit participation (see DESIGN.md).

use super::{authenticate, ok_response, AppState};
use crate::http::error::ApiError;
use actix_web::{web, HttpRequest, HttpResponse};
use common::error::CoreError;
use common::id::TournamentId;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct CreateTournamentRequest {
    player2_username: String,
    player3_username: String,
    player4_username: String,
}

#[derive(Serialize)]
struct TournamentCreatedBody {
    tournament_id: TournamentId,
}

pub async fn create_tournament(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CreateTournamentRequest>,
) -> Result<HttpResponse, ApiError> {
    let (claims, rotated) = authenticate(&req, &state).await?;

    async fn resolve(state: &AppState, username: &str) -> Result<common::id::PlayerId, ApiError> {
        Ok(state
            .users
            .find_by_username(username)
            .await?
            .ok_or(CoreError::NotFound("tournament participant"))?)
    }
    let player2 = resolve(&state, &body.player2_username).await?;
    let player3 = resolve(&state, &body.player3_username).await?;
    let player4 = resolve(&state, &body.player4_username).await?;

    let participants = [claims.sub, player2, player3, player4];
    let mut distinct = participants.to_vec();
    distinct.sort_by_key(|p| p.0);
    distinct.dedup();
    if distinct.len() != participants.len() {
        return Err(CoreError::Validation("tournament participants must be 4 distinct players".to_owned()).into());
    }

    let tournament_id = state.tournament_engine.create(claims.sub, participants).await?;

    Ok(ok_response(&state.tokens, &rotated, TournamentCreatedBody { tournament_id }))
}
