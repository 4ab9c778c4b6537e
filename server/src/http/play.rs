// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! `/play/*` (SPEC_FULL's HTTP surface section): read-only matchmaking
//! eligibility plus thin wrappers over C8's direct-challenge FSM. The queue
//! itself is only ever mutated by the `/ws/matchmaking/` route (spec.md §5),
//! so `request_game` below never touches it.

use super::{authenticate, ok_response, AppState};
use crate::http::error::ApiError;
use actix_web::{web, HttpRequest, HttpResponse};
use common::error::{ConflictKind, CoreError};
use common::id::{GameId, RequestId};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct MatchmakingEligibleBody {
    websocket: &'static str,
}

pub async fn request_game(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let (claims, rotated) = authenticate(&req, &state).await?;
    if state.games.has_nonterminal_game(claims.sub).await? {
        return Err(CoreError::Conflict(ConflictKind::AlreadyInGame).into());
    }
    if state.requests.has_pending(claims.sub).await? {
        return Err(CoreError::Conflict(ConflictKind::AlreadyPendingRequest).into());
    }
    Ok(ok_response(
        &state.tokens,
        &rotated,
        MatchmakingEligibleBody {
            websocket: "/ws/matchmaking/",
        },
    ))
}

#[derive(Deserialize)]
pub struct OpponentRequest {
    opponent_username: String,
}

#[derive(Serialize)]
struct RequestSentBody {
    request_id: RequestId,
}

pub async fn request_game_with_player(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<OpponentRequest>,
) -> Result<HttpResponse, ApiError> {
    let (claims, rotated) = authenticate(&req, &state).await?;
    let opponent = state
        .users
        .find_by_username(&body.opponent_username)
        .await?
        .ok_or(CoreError::NotFound("opponent"))?;
    let request_id = state.challenge.send(claims.sub, opponent).await?;
    Ok(ok_response(&state.tokens, &rotated, RequestSentBody { request_id }))
}

#[derive(Deserialize)]
pub struct RequestIdBody {
    request_id: RequestId,
}

#[derive(Serialize)]
struct AcceptedBody {
    game_id: GameId,
}

pub async fn accept_game_request(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<RequestIdBody>,
) -> Result<HttpResponse, ApiError> {
    let (claims, rotated) = authenticate(&req, &state).await?;
    let game_id = state.challenge.accept(claims.sub, body.request_id).await?;
    Ok(ok_response(&state.tokens, &rotated, AcceptedBody { game_id }))
}

#[derive(Serialize)]
struct StatusBody {
    status: &'static str,
}

pub async fn reject_game_request(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<RequestIdBody>,
) -> Result<HttpResponse, ApiError> {
    let (claims, rotated) = authenticate(&req, &state).await?;
    state.challenge.reject(claims.sub, body.request_id).await?;
    Ok(ok_response(&state.tokens, &rotated, StatusBody { status: "success" }))
}
