// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The one actix actor every live socket in this binary is made of,
//! grounded on the teacher's `server_util::web_socket::WebSocket<I, O, P>`
//! (mk48), widened so a single outbound type can carry either a JSON
//! control frame or the pong route's raw binary state frame -- the teacher
//! instead negotiates one wire format per connection, which this protocol's
//! mixed JSON/binary pong socket (spec.md §6) does not allow. Everything
//! domain-specific (what `I` parses into, what `O` means) lives in the
//! `core` domain actor on the other end of the mailbox; this actor only
//! speaks `ObserverMessage`/`ObserverUpdate`.

use actix::prelude::*;
use actix_web_actors::ws;
use pong_core::hub::HubOutbound;
use pong_core::observer::{ObserverMessage, ObserverUpdate};
use log::{debug, warn};
use std::time::{Duration, Instant};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(20);
const INBOUND_MESSAGE_MAX_BYTES: usize = 8 * 1024;

/// What a domain outbound type turns into on the wire. Implemented once per
/// outbound enum (`pong_core::hub::HubOutbound`, `crate::session::PongOutbound`)
/// rather than baked into this actor, so the pong route can mix frame kinds
/// while every other route stays JSON-only without a second actor type.
pub trait WsFrame {
    fn into_ws_frame(self) -> WsFrameKind;
}

pub enum WsFrameKind {
    Text(String),
    Binary(Vec<u8>),
}

/// The hub, matchmaker, and tournament gateway all speak bare JSON; the
/// pong route is the only one that needs a distinct `WsFrame` impl (see
/// `crate::session::PongOutbound`).
impl WsFrame for HubOutbound {
    fn into_ws_frame(self) -> WsFrameKind {
        WsFrameKind::Text(self.0.to_string())
    }
}

/// Generic transport actor for `/ws/notification/`, `/ws/matchmaking/`,
/// `/ws/pong/{id}/`, and `/ws/tournament/` (spec.md §4.8 -- `/ws/chat/` is
/// the external delivery channel the same table names, out of this
/// workspace's scope per spec.md §1). `I` is the inbound command type, `O`
/// the outbound message type, `P` the register-time payload (almost always
/// a `PlayerId`).
pub struct WsActor<I, O, P = ()>
where
    I: 'static + Send,
    O: 'static + Message<Result = ()> + Send + WsFrame,
    P: 'static + Clone + Send + Unpin,
{
    data: Recipient<ObserverMessage<I, O, P>>,
    payload: P,
    last_activity: Instant,
    /// Parses one inbound text frame into a command, or `None` to ignore it
    /// silently (spec.md §6: unrecognized text is dropped, not an error).
    /// A closure rather than `DeserializeOwned` so the pong route can parse
    /// bare `"w"`/`"s"` instead of JSON while every other route still uses
    /// `serde_json::from_str`.
    decode: Box<dyn Fn(&str) -> Option<I> + Send>,
}

impl<I, O, P> WsActor<I, O, P>
where
    I: 'static + Send,
    O: 'static + Message<Result = ()> + Send + WsFrame,
    P: 'static + Clone + Send + Unpin,
{
    pub fn new(
        data: Recipient<ObserverMessage<I, O, P>>,
        payload: P,
        decode: impl Fn(&str) -> Option<I> + Send + 'static,
    ) -> Self {
        Self {
            data,
            payload,
            last_activity: Instant::now(),
            decode: Box::new(decode),
        }
    }

    fn heartbeat(&self, ctx: &mut <Self as Actor>::Context) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if act.last_activity.elapsed() > CLIENT_TIMEOUT {
                warn!("websocket timed out, dropping");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl<I, O, P> Actor for WsActor<I, O, P>
where
    I: 'static + Send,
    O: 'static + Message<Result = ()> + Send + WsFrame,
    P: 'static + Clone + Send + Unpin,
{
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let _ = self.data.do_send(ObserverMessage::Register {
            observer: ctx.address().recipient(),
            payload: self.payload.clone(),
        });
        self.heartbeat(ctx);
    }

    fn stopped(&mut self, ctx: &mut Self::Context) {
        let _ = self.data.do_send(ObserverMessage::Unregister {
            observer: ctx.address().recipient(),
        });
    }
}

impl<I, O, P> Handler<ObserverUpdate<O>> for WsActor<I, O, P>
where
    I: 'static + Send,
    O: 'static + Message<Result = ()> + Send + WsFrame,
    P: 'static + Clone + Send + Unpin,
{
    type Result = ();

    fn handle(&mut self, update: ObserverUpdate<O>, ctx: &mut Self::Context) {
        match update {
            ObserverUpdate::Send { message } => match message.into_ws_frame() {
                WsFrameKind::Text(text) => ctx.text(text),
                WsFrameKind::Binary(bytes) => ctx.binary(bytes),
            },
            ObserverUpdate::Close => {
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
            }
        }
    }
}

impl<I, O, P> StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsActor<I, O, P>
where
    I: 'static + Send,
    O: 'static + Message<Result = ()> + Send + WsFrame,
    P: 'static + Clone + Send + Unpin,
{
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        self.last_activity = Instant::now();
        match msg {
            Ok(ws::Message::Ping(bytes)) => ctx.pong(&bytes),
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                if text.len() > INBOUND_MESSAGE_MAX_BYTES {
                    warn!("dropping oversized text frame ({} bytes)", text.len());
                    return;
                }
                match (self.decode)(text.trim()) {
                    Some(request) => {
                        let _ = self.data.do_send(ObserverMessage::Request {
                            observer: ctx.address().recipient(),
                            request,
                        });
                    }
                    None => debug!("ignored unrecognized text frame: {:?}", text),
                }
            }
            Ok(ws::Message::Close(_)) => ctx.stop(),
            Ok(ws::Message::Binary(_)) => {
                // No route defines a client -> server binary frame (spec.md
                // §6); ignore rather than error so a stray frame can't kill
                // the connection.
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                warn!("websocket protocol error: {}", e);
                ctx.stop();
            }
        }
    }
}
