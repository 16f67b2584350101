use actix::prelude::*;
use actix_http::ws::Item;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use bytes::BytesMut;
use serde::Deserialize;
use std::mem;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use super::peer::{Outbound, PeerHandle};
use super::session::{Outcome, Session};
use crate::{AppError, AppState};

/// Largest text message accepted once its fragments are joined together.
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

/// Text queued for this connection by the dispatcher.
pub struct Deliver(Arc<str>);

/// A message arriving as continuation frames.
enum Fragments {
    Idle,
    Text(BytesMut),
    /// Binary or oversized; its remaining frames are dropped up to `Last`.
    Skipping,
}

/// WebSocket actor bridging one socket to its relay [`Session`].
pub struct WsConnection {
    session: Session,
    outbound: Option<Outbound>,
    fragments: Fragments,
    peer_addr: String,
    heartbeat_interval: Duration,
}

impl WsConnection {
    pub fn new(
        session: Session,
        outbound: Outbound,
        peer_addr: String,
        heartbeat_interval: Duration,
    ) -> Self {
        Self {
            session,
            outbound: Some(outbound),
            fragments: Fragments::Idle,
            peer_addr,
            heartbeat_interval,
        }
    }

    fn start_heartbeat(&self, ctx: &mut <Self as Actor>::Context) {
        if self.heartbeat_interval.is_zero() {
            return;
        }
        ctx.run_interval(self.heartbeat_interval, |_act, ctx| {
            ctx.ping(b"");
        });
    }

    fn handle_text(&mut self, text: &str) {
        match self.session.handle_text(text) {
            Outcome::Discarded(reason) => {
                debug!("Discarded message from {}: {:?}", self.peer_addr, reason);
            }
            Outcome::Relayed { kind, delivered } => {
                debug!("Relayed {} from {} to {} peers", kind, self.peer_addr, delivered);
            }
            Outcome::Joined { .. } => {}
        }
    }

    fn handle_continuation(&mut self, item: Item) {
        match item {
            Item::FirstText(data) => {
                self.fragments = Fragments::Text(BytesMut::new());
                self.append_fragment(&data);
            }
            Item::FirstBinary(_) => {
                debug!("Ignoring fragmented binary message from {}", self.peer_addr);
                self.fragments = Fragments::Skipping;
            }
            Item::Continue(data) => self.append_fragment(&data),
            Item::Last(data) => {
                self.append_fragment(&data);
                if let Fragments::Text(buf) = mem::replace(&mut self.fragments, Fragments::Idle) {
                    match std::str::from_utf8(&buf) {
                        Ok(text) => self.handle_text(text),
                        Err(e) => debug!("Dropping non UTF-8 message from {}: {}", self.peer_addr, e),
                    }
                }
            }
        }
    }

    fn append_fragment(&mut self, data: &[u8]) {
        let Fragments::Text(buf) = &mut self.fragments else {
            return;
        };

        if buf.len() + data.len() > MAX_MESSAGE_BYTES {
            debug!(
                "Dropping message from {}: exceeds {} bytes",
                self.peer_addr, MAX_MESSAGE_BYTES
            );
            self.fragments = Fragments::Skipping;
        } else {
            buf.extend_from_slice(data);
        }
    }
}

impl Actor for WsConnection {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(
            "WebSocket connection established with {} (id: {})",
            self.peer_addr,
            self.session.peer().id()
        );

        if let Some(outbound) = self.outbound.take() {
            let stream = futures::stream::unfold(outbound, |mut rx| async move {
                rx.recv().await.map(|text| (Deliver(text), rx))
            });
            ctx.add_stream(stream);
        }

        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        // The departure notice runs detached; teardown does not wait for it.
        drop(self.session.close());
        info!(
            "WebSocket connection closed with {} (id: {})",
            self.peer_addr,
            self.session.peer().id()
        );
    }
}

impl StreamHandler<Deliver> for WsConnection {
    fn handle(&mut self, msg: Deliver, ctx: &mut Self::Context) {
        ctx.text(&*msg.0);
    }

    fn finished(&mut self, _ctx: &mut Self::Context) {
        // The session keeps its own sender alive, so this only happens on
        // shutdown; socket closure is driven by the inbound stream.
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsConnection {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => self.handle_text(&text),
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Binary(bin)) => {
                debug!("Ignoring {} byte binary frame from {}", bin.len(), self.peer_addr);
            }
            Ok(ws::Message::Continuation(item)) => self.handle_continuation(item),
            Ok(ws::Message::Close(reason)) => {
                info!("WebSocket closed from {}: {:?}", self.peer_addr, reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Nop) => {}
            Err(e) => {
                error!("Error handling WebSocket message from {}: {}", self.peer_addr, e);
                ctx.stop();
            }
        }
    }
}

/// `GET /ws`: checks the access token, then upgrades to a relay connection.
pub async fn websocket_route(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<ConnectQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let peer_addr = req
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    state
        .gate
        .authorize(query.token.as_deref(), &peer_addr)
        .map_err(AppError::from)?;

    let (peer, outbound) = PeerHandle::with_capacity(state.config.relay.peer_queue_capacity);
    let session = Session::new(peer, state.dispatcher.clone());
    let heartbeat = Duration::from_secs(state.config.relay.heartbeat_interval_secs);

    ws::start(WsConnection::new(session, outbound, peer_addr, heartbeat), &req, stream)
}
