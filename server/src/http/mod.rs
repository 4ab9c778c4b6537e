// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The actix-web HTTP surface (C10, spec.md §6/§4.6). Every handler below is
//! a thin wrapper: the actual decisions live in `core`, this module only
//! extracts identity from cookies, calls through, and shapes the JSON
//! response. `AppState` is the one `web::Data<T>` every handler shares.

pub mod auth;
pub mod error;
pub mod history;
pub mod play;
pub mod tournament;

use crate::auth_store::CredentialStore;
use crate::session::SessionRegistry;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use common::error::CoreError;
use common::id::PlayerId;
use pong_core::challenge::ChallengeService;
use pong_core::hub::Hub;
use pong_core::store::{GameStore, RefreshBlacklist, RequestStore, TournamentStore, UserStore};
use pong_core::token::{refresh_gate, AccessClaims, CookieJar, GateOutcome, TokenConfig, TokenPair, TokenService};
use pong_core::tournament::TournamentEngine;
use error::ApiError;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// One process-wide instantiation of every generic core type, fixed to the
/// concrete sea-orm store implementations (§9: the server binary is the only
/// place these generics are ever closed over).
pub type SharedHub = Hub<crate::db::stores::SeaUserStore, crate::db::stores::SeaRequestStore>;
pub type SharedChallenge = ChallengeService<
    crate::db::stores::SeaUserStore,
    crate::db::stores::SeaRequestStore,
    crate::db::stores::SeaGameStore,
    crate::db::stores::SeaRequestStore,
>;
pub type SharedTournamentEngine = TournamentEngine<
    crate::db::stores::SeaUserStore,
    crate::db::stores::SeaRequestStore,
    crate::db::stores::SeaGameStore,
    crate::db::stores::SeaTournamentStore,
>;

pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub blacklist: Arc<dyn RefreshBlacklist>,
    pub users: Arc<dyn UserStore>,
    pub games: Arc<dyn GameStore>,
    pub requests: Arc<dyn RequestStore>,
    pub tournaments: Arc<dyn TournamentStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub challenge: Arc<SharedChallenge>,
    pub tournament_engine: Arc<SharedTournamentEngine>,
    pub sessions: Arc<SessionRegistry>,
    /// `POST /auth/login`'s two-step handoff when 2FA is enabled: the
    /// already-issued (not yet cookie-set) token pair, keyed by a one-time
    /// session id handed to the client (SPEC_FULL's HTTP surface section).
    /// Entries are removed on verification and never expired otherwise --
    /// acceptable because a stale entry is just an unreachable uuid, not a
    /// usable credential.
    pub pending_2fa: Mutex<HashMap<Uuid, TokenPair>>,
}

fn build_cookie(name: &str, value: String, config: &TokenConfig) -> Cookie<'static> {
    let mut cookie = Cookie::new(name.to_owned(), value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(config.cookie_secure);
    cookie.set_same_site(match config.cookie_same_site {
        "Strict" => SameSite::Strict,
        "None" => SameSite::None,
        _ => SameSite::Lax,
    });
    cookie
}

fn set_auth_cookies(builder: &mut actix_web::HttpResponseBuilder, tokens: &TokenService, pair: &TokenPair) {
    let config = tokens.config();
    builder.cookie(build_cookie(&config.access_cookie, pair.access.clone(), config));
    builder.cookie(build_cookie(&config.refresh_cookie, pair.refresh.clone(), config));
}

fn clear_auth_cookies(builder: &mut actix_web::HttpResponseBuilder, tokens: &TokenService) {
    let config = tokens.config();
    for name in [&config.access_cookie, &config.refresh_cookie] {
        let mut cookie = Cookie::new(name.clone(), "");
        cookie.set_path("/");
        cookie.set_max_age(actix_web::cookie::time::Duration::ZERO);
        builder.cookie(cookie);
    }
}

/// Builds a `200 OK` JSON response, attaching fresh cookies if the gate
/// rotated them. Every protected handler's success path goes through this
/// so rotation is never accidentally dropped on the floor.
pub fn ok_response<T: Serialize>(tokens: &TokenService, rotated: &Option<TokenPair>, body: T) -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    if let Some(pair) = rotated {
        set_auth_cookies(&mut builder, tokens, pair);
    }
    builder.json(body)
}

/// The explicit refresh gate (§4.6), invoked by every protected handler
/// before its body runs. Returns the caller's identity plus, if the access
/// cookie needed rotating, the fresh pair the handler must attach to its
/// response via [`ok_response`]. `AUTH_MISSING`/`AUTH_INVALID`/`AUTH_EXPIRED`
/// short-circuit as an [`ApiError`] that already knows to clear cookies.
pub async fn authenticate(
    req: &HttpRequest,
    state: &AppState,
) -> Result<(AccessClaims, Option<TokenPair>), ApiError> {
    let config = state.tokens.config();
    let names = (config.access_cookie.clone(), config.refresh_cookie.clone());
    let access = req.cookie(&config.access_cookie).map(|c| c.value().to_owned());
    let refresh = req.cookie(&config.refresh_cookie).map(|c| c.value().to_owned());
    let jar = CookieJar {
        access: access.as_deref(),
        refresh: refresh.as_deref(),
    };

    let users = state.users.clone();
    let outcome = refresh_gate(
        &state.tokens,
        state.blacklist.as_ref(),
        move |player: PlayerId| {
            let users = users.clone();
            async move { users.username(player).await.ok() }
        },
        jar,
    )
    .await
    .map_err(|e| ApiError(e, Some(names.clone())))?;

    match outcome {
        GateOutcome::PassThrough(claims) => Ok((claims, None)),
        GateOutcome::Rotated { identity, new_tokens } => Ok((identity, Some(new_tokens))),
        GateOutcome::Unauthenticated => Err(ApiError(CoreError::AuthMissing, Some(names))),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::post().to(auth::login))
            .route("/verify-2fa", web::post().to(auth::verify_2fa))
            .route("/use-backup-code", web::post().to(auth::use_backup_code))
            .route("/logout", web::post().to(auth::logout)),
    )
    .service(
        web::scope("/play")
            .route("/request-game", web::post().to(play::request_game))
            .route(
                "/request-game-with-player",
                web::post().to(play::request_game_with_player),
            )
            .route("/accept-game-request", web::post().to(play::accept_game_request))
            .route("/reject-game-request", web::post().to(play::reject_game_request)),
    )
    .service(web::resource("/history/matches/{username}").route(web::get().to(history::matches)))
    .service(web::resource("/create-tournament").route(web::post().to(tournament::create_tournament)));
}
