// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The generic message pair every live socket actor speaks to whichever
//! domain actor owns it (hub, matchmaker, session, tournament). Decouples
//! the raw WebSocket actor (`server::ws_actor`) from domain logic: the
//! WebSocket actor only ever sees `ObserverMessage`/`ObserverUpdate`, never
//! the domain actor's own message types.

use actix::Recipient;

#[derive(actix::Message)]
#[rtype(result = "()")]
pub enum ObserverMessage<I, O, P = ()>
where
    O: actix::Message + Send,
    P: Clone,
    <O as actix::Message>::Result: Send,
{
    Request {
        observer: Recipient<ObserverUpdate<O>>,
        request: I,
    },
    Register {
        observer: Recipient<ObserverUpdate<O>>,
        payload: P,
    },
    Unregister {
        observer: Recipient<ObserverUpdate<O>>,
    },
}

#[derive(actix::Message, Debug)]
#[rtype(result = "()")]
pub enum ObserverUpdate<O>
where
    O: actix::Message + Send,
    <O as actix::Message>::Result: Send,
{
    Close,
    Send { message: O },
}
