// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! `/auth/*` (SPEC_FULL's HTTP surface section). Unlike every other route in
//! this module these four do NOT run through [`super::authenticate`] -- they
//! are how a caller obtains the cookies that gate depends on in the first
//! place. Credential and 2FA verification themselves are delegated to
//! `crate::auth_store`, which is out of the core's scope (spec.md §1).

use super::{clear_auth_cookies, set_auth_cookies, AppState};
use crate::http::error::ApiError;
use actix_web::{web, HttpRequest, HttpResponse};
use common::error::CoreError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct StatusBody {
    status: &'static str,
}

#[derive(Serialize)]
struct RequireTwoFactorBody {
    require_2fa: bool,
    session_id: Uuid,
}

pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> Result<HttpResponse, ApiError> {
    let authenticated = state
        .credentials
        .authenticate(&body.username, &body.password)
        .await?;
    let pair = state.tokens.issue(authenticated.player, &authenticated.username)?;

    if authenticated.two_factor_enabled {
        let session_id = Uuid::new_v4();
        state.pending_2fa.lock().unwrap().insert(session_id, pair);
        return Ok(HttpResponse::Accepted().json(RequireTwoFactorBody {
            require_2fa: true,
            session_id,
        }));
    }

    let mut builder = HttpResponse::Ok();
    set_auth_cookies(&mut builder, &state.tokens, &pair);
    Ok(builder.json(StatusBody { status: "success" }))
}

#[derive(Deserialize)]
pub struct TwoFactorRequest {
    session_id: Uuid,
    code: String,
}

async fn complete_two_factor(
    state: &web::Data<AppState>,
    request: &TwoFactorRequest,
    verified: bool,
) -> Result<HttpResponse, ApiError> {
    if !verified {
        return Err(CoreError::AuthInvalid.into());
    }
    let pair = state
        .pending_2fa
        .lock()
        .unwrap()
        .remove(&request.session_id)
        .ok_or(CoreError::NotFound("pending login"))?;
    let mut builder = HttpResponse::Ok();
    set_auth_cookies(&mut builder, &state.tokens, &pair);
    Ok(builder.json(StatusBody { status: "success" }))
}

pub async fn verify_2fa(
    state: web::Data<AppState>,
    body: web::Json<TwoFactorRequest>,
) -> Result<HttpResponse, ApiError> {
    let subject = {
        let pending = state.pending_2fa.lock().unwrap();
        pending
            .get(&body.session_id)
            .map(|pair| pair.access_claims.sub)
            .ok_or(CoreError::NotFound("pending login"))?
    };
    let verified = state.credentials.verify_second_factor(subject, &body.code).await?;
    complete_two_factor(&state, &body, verified).await
}

pub async fn use_backup_code(
    state: web::Data<AppState>,
    body: web::Json<TwoFactorRequest>,
) -> Result<HttpResponse, ApiError> {
    let subject = {
        let pending = state.pending_2fa.lock().unwrap();
        pending
            .get(&body.session_id)
            .map(|pair| pair.access_claims.sub)
            .ok_or(CoreError::NotFound("pending login"))?
    };
    let consumed = state.credentials.consume_backup_code(subject, &body.code).await?;
    complete_two_factor(&state, &body, consumed).await
}

pub async fn logout(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let config = state.tokens.config();
    if let Some(refresh) = req.cookie(&config.refresh_cookie) {
        if let Ok(claims) = state.tokens.decode_refresh(refresh.value()) {
            state.blacklist.blacklist(claims.jti).await?;
        }
    }
    let mut builder = HttpResponse::Ok();
    clear_auth_cookies(&mut builder, &state.tokens);
    Ok(builder.json(StatusBody { status: "success" }))
}
