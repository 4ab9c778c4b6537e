// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Process entry point: parses [`config::Options`], opens the database,
//! wires every store/actor together, and serves the HTTP + WebSocket
//! surface. Grounded on the teacher's `server/src/main.rs` shape (structopt
//! `Options`, `env_logger` init, a single `HttpServer::new` closure) with
//! the game-specific SSL/redirect/static-file machinery dropped since this
//! workspace serves an API, not a client bundle.

mod auth_store;
mod config;
mod db;
mod engine;
mod http;
mod session;
mod totp;
mod ws_actor;

use actix::{Actor, Addr};
use actix_cors::Cors;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use actix_web_actors::ws;
use common::id::GameId;
use pong_core::hub::{Hub, HubGateway};
use pong_core::matchmaker::Matchmaker;
use pong_core::store::{RefreshBlacklist, UserStore};
use pong_core::token::{AccessClaims, TokenService};
use db::migration::Migrator;
use db::stores::{SeaBlockListStore, SeaGameStore, SeaRequestStore, SeaTournamentStore, SeaUserStore};
use http::AppState;
use log::info;
use sea_orm_migration::MigratorTrait;
use session::SessionRegistry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use structopt::StructOpt;

type SharedHubGateway = Addr<HubGateway<SeaUserStore, SeaRequestStore>>;
type SharedMatchmaker = Addr<Matchmaker<SeaUserStore, SeaRequestStore, SeaGameStore>>;

/// Every address the WS routes need beyond what's already in [`AppState`].
/// Kept separate so `AppState` stays about request handling, not transport.
struct WsAddrs {
    hub_gateway: SharedHubGateway,
    matchmaker: SharedMatchmaker,
    sessions: Arc<SessionRegistry>,
}

fn authenticate_ws(req: &HttpRequest, tokens: &TokenService) -> Option<AccessClaims> {
    let config = tokens.config();
    let cookie = req.cookie(&config.access_cookie)?;
    pong_core::token::ws_authenticate(tokens, Some(cookie.value())).ok()
}

async fn ws_notification(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    addrs: web::Data<WsAddrs>,
) -> Result<HttpResponse, actix_web::Error> {
    let claims = match authenticate_ws(&req, &state.tokens) {
        Some(c) => c,
        None => return Ok(HttpResponse::Unauthorized().finish()),
    };
    ws::start(
        ws_actor::WsActor::new(addrs.hub_gateway.clone().recipient(), claims.sub, |_: &str| {
            None::<serde_json::Value>
        }),
        &req,
        stream,
    )
}

async fn ws_tournament(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    addrs: web::Data<WsAddrs>,
) -> Result<HttpResponse, actix_web::Error> {
    // Tournament events ride the same hub fan-out as notifications (§4.8's
    // `/ws/tournament/` attach); see DESIGN.md for why this route has no
    // actor of its own.
    ws_notification(req, stream, state, addrs).await
}

async fn ws_matchmaking(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    addrs: web::Data<WsAddrs>,
) -> Result<HttpResponse, actix_web::Error> {
    let claims = match authenticate_ws(&req, &state.tokens) {
        Some(c) => c,
        None => return Ok(HttpResponse::Unauthorized().finish()),
    };
    ws::start(
        ws_actor::WsActor::new(addrs.matchmaker.clone().recipient(), claims.sub, |text: &str| {
            serde_json::from_str(text).ok()
        }),
        &req,
        stream,
    )
}

async fn ws_pong(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    addrs: web::Data<WsAddrs>,
    path: web::Path<String>,
) -> Result<HttpResponse, actix_web::Error> {
    let claims = match authenticate_ws(&req, &state.tokens) {
        Some(c) => c,
        None => return Ok(HttpResponse::Unauthorized().finish()),
    };
    let game_id: GameId = match path.into_inner().parse() {
        Ok(id) => id,
        Err(_) => return Ok(HttpResponse::NotFound().finish()),
    };
    let addr = match addrs.sessions.get(game_id) {
        Some(addr) => addr,
        None => return Ok(HttpResponse::NotFound().finish()),
    };
    ws::start(
        ws_actor::WsActor::new(addr.recipient(), claims.sub, session::decode_pong_input),
        &req,
        stream,
    )
}

fn main() -> std::io::Result<()> {
    let mut logger = env_logger::builder();
    logger.filter_module(module_path!(), log::LevelFilter::Info);
    logger.filter_module("actix_web", log::LevelFilter::Warn);
    logger.filter_module("actix_server", log::LevelFilter::Warn);
    logger.init();

    let options = config::Options::from_args();

    actix_web::rt::System::new().block_on(async move { run(options).await })
}

async fn run(options: config::Options) -> std::io::Result<()> {
    let db = sea_orm::Database::connect(&options.database_url)
        .await
        .expect("failed to connect to database");
    Migrator::up(&db, None).await.expect("failed to run migrations");

    let tokens = Arc::new(TokenService::new(options.token_config()));

    let users: Arc<SeaUserStore> = Arc::new(SeaUserStore::new(db.clone()));
    let blocks: Arc<dyn pong_core::store::BlockListStore> = Arc::new(SeaBlockListStore::new(db.clone()));
    let games: Arc<SeaGameStore> = Arc::new(SeaGameStore::new(db.clone()));
    let requests: Arc<SeaRequestStore> = Arc::new(SeaRequestStore::new(db.clone()));
    let tournaments_store: Arc<SeaTournamentStore> = Arc::new(SeaTournamentStore::new(db.clone()));
    let blacklist: Arc<dyn RefreshBlacklist> =
        Arc::new(db::stores::SeaRefreshBlacklist::new(db.clone()));
    let credentials: Arc<dyn auth_store::CredentialStore> =
        Arc::new(auth_store::SeaCredentialStore::new(db.clone()));

    let hub = Arc::new(Hub::new(users.clone(), requests.clone()));
    let sessions = SessionRegistry::new(games.clone());
    let spawner: Arc<dyn pong_core::session_spawn::GameSessionSpawner> = sessions.clone();

    let hub_gateway = HubGateway::new(hub.clone()).start();
    let matchmaker =
        Matchmaker::new(games.clone(), hub.clone(), blocks.clone(), spawner.clone()).start();

    let challenge = Arc::new(pong_core::challenge::ChallengeService::new(
        users.clone(),
        hub.clone(),
        games.clone(),
        requests.clone(),
        blocks,
        spawner.clone(),
    ));
    let tournament_engine = Arc::new(pong_core::tournament::TournamentEngine::new(
        hub.clone(),
        games.clone(),
        tournaments_store.clone(),
        spawner,
    ));

    let app_state = web::Data::new(AppState {
        tokens: tokens.clone(),
        blacklist,
        users: users.clone() as Arc<dyn UserStore>,
        games: games.clone() as Arc<dyn pong_core::store::GameStore>,
        requests: requests.clone() as Arc<dyn pong_core::store::RequestStore>,
        tournaments: tournaments_store as Arc<dyn pong_core::store::TournamentStore>,
        credentials,
        challenge,
        tournament_engine,
        sessions: sessions.clone(),
        pending_2fa: Mutex::new(HashMap::new()),
    });
    let ws_addrs = web::Data::new(WsAddrs {
        hub_gateway,
        matchmaker,
        sessions,
    });

    let cors_origins = options.cors_origin.clone();
    let bind_address = options.bind_address.clone();
    info!("listening on {}", bind_address);

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = if cors_origins.is_empty() {
            Cors::default().allow_any_origin()
        } else {
            cors_origins
                .iter()
                .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        }
        .allow_any_header()
        .allow_any_method()
        .supports_credentials();

        App::new()
            .app_data(app_state.clone())
            .app_data(ws_addrs.clone())
            .wrap(cors)
            .configure(http::configure)
            .service(web::resource("/ws/notification/").route(web::get().to(ws_notification)))
            .service(web::resource("/ws/tournament/").route(web::get().to(ws_tournament)))
            .service(web::resource("/ws/matchmaking/").route(web::get().to(ws_matchmaking)))
            .service(web::resource("/ws/pong/{game_id}/").route(web::get().to(ws_pong)))
    })
    .bind(&bind_address)?
    .run()
    .await
}
