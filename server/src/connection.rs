use actix::{Actor, ActorContext, AsyncContext, Handler, Message, Running, StreamHandler};
use actix_http::ws::Item;
use actix_web::web::BytesMut;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use actix_web_actors::ws::{CloseCode, CloseReason};

use system::ConnectionId;

use crate::registry::ConnectionTx;
use crate::server::RelayHandle;

/// Largest frame, and largest reassembled fragmented message, a client may send.
pub const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug)]
pub enum ConnectionCommand {
    Connect {
        connection_id: ConnectionId,
        tx: ConnectionTx,
    },
    Disconnect {
        from: ConnectionId,
    },
    Broadcast {
        from: ConnectionId,
        message: String,
    },
}

#[derive(Debug)]
pub enum ConnectionEvent {
    Relay(String),
    /// The relay dropped this connection's outbox.
    Evicted,
}

#[derive(Message)]
#[rtype(result = "()")]
struct ConnectionActorMessage(ConnectionEvent);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

struct ConnectionActor {
    id: ConnectionId,
    state: ConnectionState,
    relay: RelayHandle,
    /// Text received so far of a message split into continuation frames.
    fragments: Option<BytesMut>,
}

impl ConnectionActor {
    /// Leaves the registry. Only the first call after opening reaches the relay.
    fn close(&mut self) {
        if self.state == ConnectionState::Open {
            if let Err(err) = self
                .relay
                .send(ConnectionCommand::Disconnect { from: self.id })
            {
                log::warn!("Connection {} could not unregister: {}", self.id, err);
            }
        }
        self.state = ConnectionState::Closed;
    }

    fn close_with(&mut self, ctx: &mut ws::WebsocketContext<Self>, code: CloseCode) {
        self.close();
        ctx.close(Some(CloseReason {
            code,
            description: None,
        }));
        ctx.stop();
    }

    fn broadcast(&mut self, message: String, ctx: &mut ws::WebsocketContext<Self>) {
        if self.state != ConnectionState::Open {
            return;
        }
        log::debug!("Ingress from {}: {} bytes", self.id, message.len());
        let command = ConnectionCommand::Broadcast {
            from: self.id,
            message,
        };
        if let Err(err) = self.relay.send(command) {
            log::error!("Connection {} lost the relay: {}", self.id, err);
            self.close_with(ctx, CloseCode::Error);
        }
    }

    /// Reassembles a text message sent as continuation frames and relays it whole.
    fn handle_continuation(&mut self, item: Item, ctx: &mut ws::WebsocketContext<Self>) {
        let (chunk, last) = match (item, self.fragments.is_some()) {
            (Item::FirstText(chunk), false) => (chunk, false),
            (Item::Continue(chunk), true) => (chunk, false),
            (Item::Last(chunk), true) => (chunk, true),
            (Item::FirstBinary(_), false) => {
                log::warn!("Connection {} sent a fragmented binary message", self.id);
                return self.close_with(ctx, CloseCode::Unsupported);
            }
            _ => {
                log::warn!("Connection {} sent an out of order fragment", self.id);
                return self.close_with(ctx, CloseCode::Protocol);
            }
        };

        let mut buf = self.fragments.take().unwrap_or_default();
        if buf.len() + chunk.len() > MAX_MESSAGE_BYTES {
            log::warn!("Connection {} sent an oversized message", self.id);
            return self.close_with(ctx, CloseCode::Size);
        }
        buf.extend_from_slice(&chunk);

        if !last {
            self.fragments = Some(buf);
            return;
        }
        match String::from_utf8(buf.to_vec()) {
            Ok(message) => self.broadcast(message, ctx),
            Err(_) => self.close_with(ctx, CloseCode::Invalid),
        }
    }
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, mut rx) =
            tokio::sync::mpsc::channel::<ConnectionEvent>(self.relay.outbox_capacity());

        if let Err(err) = self.relay.send(ConnectionCommand::Connect {
            connection_id: self.id,
            tx,
        }) {
            log::error!("Connection {} rejected: {}", self.id, err);
            self.state = ConnectionState::Closed;
            ctx.close(Some(CloseReason {
                code: CloseCode::Error,
                description: None,
            }));
            ctx.stop();
            return;
        }
        self.state = ConnectionState::Open;

        let addr = ctx.address();
        let connection_id = self.id;

        tokio::spawn(async move {
            log::debug!("connection {} green thread - started", connection_id);
            while let Some(event) = rx.recv().await {
                // Waiting on the mailbox lets a slow socket back up into the outbox.
                if addr.send(ConnectionActorMessage(event)).await.is_err() {
                    break;
                }
            }
            // The relay only lets go of the outbox when it evicts us or after we've left.
            addr.do_send(ConnectionActorMessage(ConnectionEvent::Evicted));
            log::debug!("connection {} green thread - terminated", connection_id);
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.close();
        Running::Stop
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Pong(_)) | Ok(ws::Message::Nop) => (),
            Ok(ws::Message::Text(text)) => self.broadcast(text.to_string(), ctx),
            Ok(ws::Message::Continuation(item)) => self.handle_continuation(item, ctx),
            Ok(ws::Message::Binary(_)) => {
                log::warn!("Connection {} sent a binary frame", self.id);
                self.close_with(ctx, CloseCode::Unsupported);
            }
            Ok(ws::Message::Close(reason)) => {
                self.close();
                ctx.close(reason);
                ctx.stop();
            }
            Err(err) => {
                log::warn!("Connection {} protocol error: {}", self.id, err);
                self.close();
                ctx.stop();
            }
        }
    }
}

/// Egress
impl Handler<ConnectionActorMessage> for ConnectionActor {
    type Result = ();

    fn handle(
        &mut self,
        msg: ConnectionActorMessage,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> Self::Result {
        match msg.0 {
            ConnectionEvent::Relay(message) => ctx.text(message),
            ConnectionEvent::Evicted => {
                if self.state == ConnectionState::Open {
                    // Already gone from the registry; nothing to unregister.
                    self.state = ConnectionState::Closed;
                    ctx.close(Some(CloseReason {
                        code: CloseCode::Again,
                        description: Some("dropped by relay".into()),
                    }));
                    ctx.stop();
                }
            }
        }
    }
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    relay: web::Data<RelayHandle>,
) -> Result<HttpResponse, Error> {
    let relay = relay.get_ref().clone();
    let actor = ConnectionActor {
        id: relay.next_connection_id(),
        state: ConnectionState::Connecting,
        relay,
        fragments: None,
    };
    ws::WsResponseBuilder::new(actor, &req, stream)
        .frame_size(MAX_MESSAGE_BYTES)
        .start()
}
